use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openalex.org";

/// Connection settings for the OpenAlex API and landing page requests.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAlexConfig {
    pub base_url: String,
    /// Sent as `mailto` to get into the polite pool
    pub email: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub landing_page_timeout: Duration,
    pub user_agent: String,
}

impl Default for OpenAlexConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            email: None,
            api_key: None,
            timeout: Duration::from_secs(30),
            landing_page_timeout: Duration::from_secs(10),
            user_agent: format!("oa-enrich/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl OpenAlexConfig {
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email.filter(|e| !e.trim().is_empty());
        self
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.trim().is_empty());
        self
    }
}
