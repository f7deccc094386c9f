//! Client configuration

use std::env;

/// Base URLs of the two services
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub auth_url: String,
    pub api_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            auth_url: "http://localhost:3000".to_string(),
            api_url: "http://localhost:3001".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(auth_url: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            auth_url: trim_base(auth_url.into()),
            api_url: trim_base(api_url.into()),
        }
    }

    /// Create a new ClientConfig from environment variables
    ///
    /// # Environment Variables
    /// - `STAYBOOK_AUTH_URL`: Credential service base URL (default: http://localhost:3000)
    /// - `STAYBOOK_API_URL`: Booking API base URL (default: http://localhost:3001)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let read = |name: &str, default: String| {
            env::var(name)
                .ok()
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(default)
        };

        Self::new(
            read("STAYBOOK_AUTH_URL", defaults.auth_url),
            read("STAYBOOK_API_URL", defaults.api_url),
        )
    }
}

fn trim_base(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}
