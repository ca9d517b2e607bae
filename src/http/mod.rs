//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the
//! message board routes.

pub mod response;

// Re-export commonly used types
pub use response::{
    apply_cors, build_404_response, build_413_response, build_options_response, json_response,
};
