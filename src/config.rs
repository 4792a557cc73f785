use std::{env, time::Duration};

use crate::error::SuiteError;

pub const BASE_URL_VAR: &str = "PRODUCTS_API_BASE_URL";
pub const TIMEOUT_VAR: &str = "PRODUCTS_API_TIMEOUT_SECS";
pub const STUB_FALLBACK_VAR: &str = "PRODUCTS_API_STUB_FALLBACK";
pub const STUB_ADDR_VAR: &str = "PRODUCTS_STUB_ADDR";

pub const DEFAULT_BASE_URL: &str = "http://localhost:9735";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_STUB_ADDR: &str = "0.0.0.0:9735";

/// Where the suite sends its requests and how long it waits for each one.
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Start the in-process stub when `base_url` cannot be reached.
    pub stub_fallback: bool,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        SuiteConfig {
            base_url: String::from(DEFAULT_BASE_URL),
            timeout: DEFAULT_TIMEOUT,
            stub_fallback: true,
        }
    }
}

impl SuiteConfig {
    /// Reads the process environment, after loading `.env` if one exists.
    pub fn from_env() -> Result<SuiteConfig, SuiteError> {
        dotenv::dotenv().ok();
        SuiteConfig::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<SuiteConfig, SuiteError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = SuiteConfig::default();

        if let Some(base_url) = lookup(BASE_URL_VAR) {
            let trimmed = base_url.trim().trim_end_matches('/');
            if trimmed.is_empty() {
                return Err(config_error(BASE_URL_VAR, "must not be empty"));
            }
            config.base_url = String::from(trimmed);
        }

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(0) => return Err(config_error(TIMEOUT_VAR, "must be greater than zero")),
                Ok(secs) => config.timeout = Duration::from_secs(secs),
                Err(e) => return Err(config_error(TIMEOUT_VAR, &e.to_string())),
            }
        }

        if let Some(raw) = lookup(STUB_FALLBACK_VAR) {
            config.stub_fallback = parse_flag(&raw)
                .ok_or_else(|| config_error(STUB_FALLBACK_VAR, "expected true or false"))?;
        }

        Ok(config)
    }
}

/// Settings for the standalone `products-stub` binary.
#[derive(Debug, Clone, PartialEq)]
pub struct StubConfig {
    pub bind_addr: String,
}

impl StubConfig {
    pub fn from_env() -> StubConfig {
        dotenv::dotenv().ok();
        StubConfig {
            bind_addr: env::var(STUB_ADDR_VAR).unwrap_or_else(|_| String::from(DEFAULT_STUB_ADDR)),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn config_error(key: &str, message: &str) -> SuiteError {
    SuiteError::Config {
        key: String::from(key),
        message: String::from(message),
    }
}
