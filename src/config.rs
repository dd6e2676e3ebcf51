use std::{env, fmt, net::SocketAddr, time::Duration};

use reqwest::Url;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.adzuna.com/v1/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const MAX_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

pub const APP_ID_VAR: &str = "ADZUNA_APP_ID";
pub const APP_KEY_VAR: &str = "ADZUNA_APP_KEY";

/// Adzuna application credentials, attached to every outbound call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub app_id: String,
    pub app_key: String,
}

impl Credentials {
    /// Query parameter names the credentials travel under.
    pub const FIELD_NAMES: [&'static str; 2] = ["app_id", "app_key"];

    pub fn query_pairs(&self) -> [(&'static str, String); 2] {
        let [id_name, key_name] = Self::FIELD_NAMES;
        [
            (id_name, self.app_id.clone()),
            (key_name, self.app_key.clone()),
        ]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("app_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone)]
pub struct Config {
    pub app_id: Option<String>,
    pub app_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    pub bind_addr: String,
    pub bind_port: u16,
    pub api_token: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("app_id", &self.app_id)
            .field("app_key", &self.app_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("bind_addr", &self.bind_addr)
            .field("bind_port", &self.bind_port)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a valid u16")]
    InvalidPort,
    #[error("ADZUNA_TIMEOUT_SECS must be an integer between 1 and {MAX_TIMEOUT_SECS}")]
    InvalidTimeout,
    #[error("ADZUNA_BASE_URL must be an absolute http(s) URL")]
    InvalidBaseUrl,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let app_id = non_empty(APP_ID_VAR);
        let app_key = non_empty(APP_KEY_VAR);

        let base_url = match non_empty("ADZUNA_BASE_URL") {
            Some(value) => {
                let parsed = Url::parse(&value).map_err(|_| ConfigError::InvalidBaseUrl)?;
                if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
                    return Err(ConfigError::InvalidBaseUrl);
                }
                value.trim_end_matches('/').to_string()
            }
            None => DEFAULT_BASE_URL.to_string(),
        };

        let timeout_secs = non_empty("ADZUNA_TIMEOUT_SECS")
            .map(|value| value.parse::<u64>().map_err(|_| ConfigError::InvalidTimeout))
            .transpose()?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 || timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::InvalidTimeout);
        }

        let bind_addr = non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_port = non_empty("PORT")
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(DEFAULT_PORT);

        let config = Self {
            app_id,
            app_key,
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            bind_addr,
            bind_port,
            api_token: non_empty("MCP_API_TOKEN"),
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }

    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.app_id, &self.app_key) {
            (Some(app_id), Some(app_key)) => Some(Credentials {
                app_id: app_id.clone(),
                app_key: app_key.clone(),
            }),
            _ => None,
        }
    }

    /// Names of the credential variables that are not set.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.app_id.is_none() {
            missing.push(APP_ID_VAR);
        }
        if self.app_key.is_none() {
            missing.push(APP_KEY_VAR);
        }
        missing
    }
}
