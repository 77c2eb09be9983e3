//! Runtime configuration.
//!
//! Every setting comes from an optional `TRAXOVO_*` environment variable and
//! falls back to a default that matches the dashboard's local backend.

use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

use crate::models::cache::DEFAULT_TTL;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_ASSETS_PATH: &str = "/api/assets";
pub const DEFAULT_BILLING_PATH: &str = "/api/billing";

const BASE_URL_VAR: &str = "TRAXOVO_BASE_URL";
const ASSETS_PATH_VAR: &str = "TRAXOVO_ASSETS_PATH";
const BILLING_PATH_VAR: &str = "TRAXOVO_BILLING_PATH";
const CACHE_TTL_VAR: &str = "TRAXOVO_CACHE_TTL_MS";
const REFRESH_VAR: &str = "TRAXOVO_REFRESH_SECS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {reason}")]
    InvalidUrl { var: &'static str, reason: String },

    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub assets_url: Url,
    pub billing_url: Url,
    pub cache_ttl: Duration,
    pub refresh_interval: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = lookup(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut base = Url::parse(&base).map_err(|e| ConfigError::InvalidUrl {
            var: BASE_URL_VAR,
            reason: e.to_string(),
        })?;
        // Endpoint paths are relative to the base, including any prefix it has.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let assets_path =
            lookup(ASSETS_PATH_VAR).unwrap_or_else(|| DEFAULT_ASSETS_PATH.to_string());
        let billing_path =
            lookup(BILLING_PATH_VAR).unwrap_or_else(|| DEFAULT_BILLING_PATH.to_string());

        let cache_ttl = match lookup(CACHE_TTL_VAR) {
            Some(value) => Duration::from_millis(parse_positive(CACHE_TTL_VAR, &value)?),
            None => DEFAULT_TTL,
        };

        let refresh_interval = lookup(REFRESH_VAR)
            .map(|value| parse_positive(REFRESH_VAR, &value).map(Duration::from_secs))
            .transpose()?;

        Ok(Self {
            assets_url: join(&base, ASSETS_PATH_VAR, &assets_path)?,
            billing_url: join(&base, BILLING_PATH_VAR, &billing_path)?,
            cache_ttl,
            refresh_interval,
        })
    }
}

fn join(base: &Url, var: &'static str, path: &str) -> Result<Url, ConfigError> {
    base.join(path.trim_start_matches('/')).map_err(|e| ConfigError::InvalidUrl {
        var,
        reason: e.to_string(),
    })
}

fn parse_positive(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            var,
            value: value.to_string(),
        }),
    }
}
