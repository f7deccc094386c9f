//! HTTP listener configuration shared by the service binaries

use std::env;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Socket address the service listens on
    pub bind_addr: String,
}

impl ServerConfig {
    /// Read the bind address from `var`, falling back to `default`
    ///
    /// Each service names its own variable (`AUTH_BIND_ADDR`,
    /// `API_BIND_ADDR`) so both can run from one environment.
    pub fn from_env(var: &str, default: &str) -> Self {
        let bind_addr = env::var(var)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| default.to_string());

        Self { bind_addr }
    }
}
