// Application state module
// Process-wide context injected into every handler

use crate::about::AboutContent;
use crate::store::SharedStore;

use super::types::Config;

/// Application state
///
/// Built once at startup; handlers only read from it.
pub struct AppState {
    pub config: Config,
    pub store: SharedStore,
    pub about: AboutContent,

    // Cached config values for fast access
    pub access_log: bool,
    pub strict_status_codes: bool,
}

impl AppState {
    pub fn new(config: Config, store: SharedStore) -> Self {
        let access_log = config.access_log_enabled();
        let strict_status_codes = config.http.strict_status_codes;
        Self {
            config,
            store,
            about: AboutContent::default(),
            access_log,
            strict_status_codes,
        }
    }
}
