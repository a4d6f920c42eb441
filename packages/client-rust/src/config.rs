//! Client configuration.

use reflexian_core::DEFAULT_BASE_URL;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "REFLEXIAN_API_KEY";
/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "REFLEXIAN_BASE_URL";

/// Connection settings for a `ReflexianClient`.
#[derive(Clone)]
pub struct ClientConfig {
    /// Scheme and host of the service, e.g. `https://api.reflexian.com/`.
    pub base_url: String,
    /// Sent as the `reflexian-api` header on every request.
    pub api_key: String,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            user_agent: concat!("reflexian-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Errors from building a configuration out of the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {name} is not set")]
    Missing { name: &'static str },
    #[error("environment variable {name} is empty")]
    Empty { name: &'static str },
}

impl ClientConfig {
    /// Default configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Read `REFLEXIAN_API_KEY` and, if set, `REFLEXIAN_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the API key variable is unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup(API_KEY_ENV).ok_or(ConfigError::Missing { name: API_KEY_ENV })?;
        if api_key.is_empty() {
            return Err(ConfigError::Empty { name: API_KEY_ENV });
        }

        let mut config = Self::new(api_key);
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|url| !url.is_empty()) {
            config.base_url = base_url;
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Absolute URL for a request path starting with `/`.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}
