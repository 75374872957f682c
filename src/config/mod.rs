//! Configuration module for the portal.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::PortalError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL, without the versioned prefix
    pub api_base_url: String,
    /// Versioned path prefix appended to the base URL
    pub api_prefix: String,
    /// Path to the SQLite file holding persisted client state
    pub store_path: PathBuf,
    /// Address to bind the presentation server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of the human-readable format
    pub log_json: bool,
    /// Timeout applied to every backend request
    pub request_timeout: Duration,
    /// Default page size for dashboard collections and public lists
    pub page_size: usize,
    /// How long a toast stays visible
    pub toast_ttl: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, PortalError> {
        dotenvy::dotenv().ok();

        let api_base_url = env::var("PORTAL_API_BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string());

        let api_prefix = env::var("PORTAL_API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string());

        let store_path = env::var("PORTAL_STORE_PATH")
            .unwrap_or_else(|_| "./data/portal.sqlite".to_string())
            .into();

        let bind_addr = env::var("PORTAL_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|_| PortalError::Config("Invalid PORTAL_BIND_ADDR format".to_string()))?;

        let log_level = env::var("PORTAL_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_json = env::var("PORTAL_LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let request_timeout =
            Duration::from_secs(parse_number("PORTAL_REQUEST_TIMEOUT_SECS", 30)?);

        let page_size = parse_number("PORTAL_PAGE_SIZE", 10)? as usize;
        if page_size == 0 {
            return Err(PortalError::Config(
                "PORTAL_PAGE_SIZE must be greater than zero".to_string(),
            ));
        }

        let toast_ttl = Duration::from_secs(parse_number("PORTAL_TOAST_TTL_SECS", 5)?);

        Ok(Self {
            api_base_url,
            api_prefix,
            store_path,
            bind_addr,
            log_level,
            log_json,
            request_timeout,
            page_size,
            toast_ttl,
        })
    }

    /// Base URL plus versioned prefix, with no trailing slash.
    pub fn api_url(&self) -> String {
        let base = self.api_base_url.trim_end_matches('/');
        let prefix = self.api_prefix.trim_matches('/');
        if prefix.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, prefix)
        }
    }
}

fn parse_number(key: &str, default: u64) -> Result<u64, PortalError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| PortalError::Config(format!("Invalid {} value: {}", key, raw))),
        Err(_) => Ok(default),
    }
}
