const DEFAULT_API_URL: &str = "https://api.agentmart.io/api";

/// Connection settings for the API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every endpoint path is joined onto, without a trailing slash.
    pub base_url: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Default config, honoring the `AGENTMART_API_URL` override.
    pub fn from_env() -> Self {
        let url = std::env::var("AGENTMART_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        Self::new(url)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}
