use anyhow::{Context, Result};
use docuquery::gemini_service::DEFAULT_API_BASE;
use std::env;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Startup settings. The API key is deliberately absent: it is read from the
/// environment on every request.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub api_base: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match lookup("PORT").filter(|v| !v.is_empty()) {
            Some(value) => value
                .parse()
                .with_context(|| format!("invalid PORT value: {}", value))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            bind_address: lookup("BIND_ADDRESS")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port,
            api_base: lookup("GEMINI_API_BASE")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        })
    }

    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Empty values count as unset.
pub fn read_api_key(var: &str) -> Option<String> {
    env::var(var).ok().filter(|key| !key.is_empty())
}
