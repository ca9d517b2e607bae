//! About page client
//!
//! Fetches `/about` once and renders it. The view moves from `Loading` to
//! either `Error` or `Loaded` and stays there; there is no retry or refetch.
//! Dropping an unfinished `load` future cancels the request.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::about::AboutContent;

/// Environment variable naming the server base URL
pub const SERVER_HOSTNAME_VAR: &str = "REACT_APP_SERVER_HOSTNAME";
pub const DEFAULT_SERVER_HOSTNAME: &str = "http://localhost:3000";

const FALLBACK_ERROR: &str = "Failed to load about content";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("{0}")]
    Request(String),

    #[error("Request failed with status code {0}")]
    Status(u16),

    #[error("Invalid response body: {0}")]
    Decode(String),
}

/// Where the about content comes from
#[async_trait]
pub trait AboutSource: Send + Sync {
    async fn fetch(&self) -> Result<AboutContent, ClientError>;
}

/// Fetches about content from the message board server
#[derive(Debug, Clone)]
pub struct HttpAboutSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAboutSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Target `REACT_APP_SERVER_HOSTNAME`, or localhost when unset
    pub fn from_env() -> Self {
        let base_url = std::env::var(SERVER_HOSTNAME_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_HOSTNAME.to_string());
        Self::new(base_url)
    }

    pub fn about_url(&self) -> String {
        format!("{}/about", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl AboutSource for HttpAboutSource {
    async fn fetch(&self) -> Result<AboutContent, ClientError> {
        let response = self
            .client
            .get(self.about_url())
            .send()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }

        response
            .json::<AboutContent>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Display state of the about view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Error(String),
    Loaded(AboutContent),
}

#[derive(Debug)]
pub struct AboutView {
    state: ViewState,
}

impl Default for AboutView {
    fn default() -> Self {
        Self::new()
    }
}

impl AboutView {
    pub const fn new() -> Self {
        Self {
            state: ViewState::Loading,
        }
    }

    pub const fn state(&self) -> &ViewState {
        &self.state
    }

    pub const fn is_settled(&self) -> bool {
        !matches!(self.state, ViewState::Loading)
    }

    /// Issue the one request this view makes; a no-op once settled
    pub async fn load<S: AboutSource + ?Sized>(&mut self, source: &S) {
        if self.is_settled() {
            return;
        }

        self.state = match source.fetch().await {
            Ok(content) => ViewState::Loaded(content),
            Err(e) => {
                let message = e.to_string();
                if message.is_empty() {
                    ViewState::Error(FALLBACK_ERROR.to_string())
                } else {
                    ViewState::Error(message)
                }
            }
        };
    }

    /// Render the current state as text
    pub fn render(&self) -> String {
        match &self.state {
            ViewState::Loading => "Loading...".to_string(),
            ViewState::Error(message) => message.clone(),
            ViewState::Loaded(content) => {
                let mut out = String::from("About Us\n");
                if !content.image_url.is_empty() {
                    out.push_str(&format!("\n[image] {}\n", content.image_url));
                }
                for paragraph in &content.paragraphs {
                    out.push('\n');
                    out.push_str(paragraph);
                    out.push('\n');
                }
                out
            }
        }
    }
}
