use std::net::SocketAddr;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "clinic-analytics";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const ENV_STORE_URL: &str = "CLINIC_STORE_URL";
pub const ENV_STORE_KEY: &str = "CLINIC_STORE_KEY";
pub const ENV_BIND_ADDR: &str = "CLINIC_BIND_ADDR";
pub const ENV_PAGE_SIZE: &str = "CLINIC_STORE_PAGE_SIZE";
pub const ENV_TIMEOUT_SECS: &str = "CLINIC_STORE_TIMEOUT_SECS";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";
const DEFAULT_PAGE_SIZE: usize = 1000;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "clinic_analytics=info,tower_http=warn"
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime configuration of the analytics service.
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// Base URL of the row store; tables live under `/rest/v1/`.
    pub store_url: String,
    pub store_key: String,
    pub bind_addr: SocketAddr,
    /// Rows requested per page from the store.
    pub page_size: usize,
    pub timeout_secs: u64,
}

impl AnalyticsConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`, so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let store_url = required(ENV_STORE_URL)?;
        if !store_url.starts_with("http://") && !store_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                name: ENV_STORE_URL,
                value: store_url,
            });
        }
        let store_key = required(ENV_STORE_KEY)?;

        let bind_raw = lookup(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name: ENV_BIND_ADDR,
            value: bind_raw.clone(),
        })?;

        let page_size = parse_or(&lookup, ENV_PAGE_SIZE, DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(ConfigError::Invalid {
                name: ENV_PAGE_SIZE,
                value: "0".into(),
            });
        }
        let timeout_secs = parse_or(&lookup, ENV_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS)?;

        Ok(Self {
            store_url,
            store_key,
            bind_addr,
            page_size,
            timeout_secs,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}
