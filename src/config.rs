//! Runtime configuration loaded from the environment

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Default bound on each stored blob, matching a browser's 5 MiB local storage
pub const DEFAULT_STORAGE_QUOTA_BYTES: usize = 5 * 1024 * 1024;

pub const DEFAULT_GEOLOCATION_URL: &str = "https://ipapi.co";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Origin prefixed to shortcodes in generated short links
    pub base_url: String,
    /// `None` disables geolocation lookups
    pub geolocation_url: Option<String>,
    pub sweep_interval: Duration,
    /// `None` disables the quota
    pub storage_quota_bytes: Option<usize>,
    pub log_filter: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Environment Variables
    ///
    /// - `PORT` - Server port number (default: 8080)
    /// - `DATABASE_URL` - Path to database file (default: "data.db")
    /// - `BASE_URL` - Short link origin (default: "http://localhost:{PORT}")
    /// - `GEOLOCATION_URL` - ipapi.co-compatible endpoint, or "off"
    /// - `SWEEP_INTERVAL_SECS` - Expiry sweep period (default: 60)
    /// - `STORAGE_QUOTA_BYTES` - Per-blob size bound, 0 for none (default: 5 MiB)
    /// - `RUST_LOG` - Log filter (default: "snaplink=debug,tower_http=debug")
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load environment variables from .env file if it exists
        dotenvy::dotenv().ok();

        let port: u16 = parse_var("PORT", 8080)?;
        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "data.db".to_string());
        let base_url = env::var("BASE_URL").unwrap_or_else(|_| format!("http://localhost:{}", port));

        let geolocation_url = match env::var("GEOLOCATION_URL") {
            Ok(v) if v.is_empty() || v.eq_ignore_ascii_case("off") => None,
            Ok(v) => Some(v),
            Err(_) => Some(DEFAULT_GEOLOCATION_URL.to_string()),
        };

        let sweep_secs: u64 = parse_var("SWEEP_INTERVAL_SECS", 60)?;
        if sweep_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "SWEEP_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        let quota: usize = parse_var("STORAGE_QUOTA_BYTES", DEFAULT_STORAGE_QUOTA_BYTES)?;
        let log_filter =
            env::var("RUST_LOG").unwrap_or_else(|_| "snaplink=debug,tower_http=debug".to_string());

        Ok(Config {
            port,
            database_url,
            base_url,
            geolocation_url,
            sweep_interval: Duration::from_secs(sweep_secs),
            storage_quota_bytes: (quota > 0).then_some(quota),
            log_filter,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => {
            let parsed = value.trim().parse();
            parsed.map_err(|_| ConfigError::Invalid { name, value })
        }
        Err(_) => Ok(default),
    }
}
