//! Runtime configuration.
//!
//! Everything is read from environment variables, optionally seeded from a
//! `.env` file in the working directory.

use crate::error::{Result, ViewerError};
use crate::token::REFRESH_PATH;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_AUTH_URL: &str = "http://localhost:8001";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_BASE_PATH: &str = "/data-viewer";
pub const DEFAULT_TOKEN_DB_PATH: &str = ".data_viewer_db";
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_HOME_URL: &str = "https://reduce.isis.cclrc.ac.uk";
pub const DEFAULT_SUPPORT_EMAIL: &str = "fia@stfc.ac.uk";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Backend used for file lookups and text content.
    pub api_url: String,
    /// Backend URL the browser-side viewer talks to.
    pub public_api_url: String,
    /// Token issuer base URL.
    pub auth_url: String,
    pub bind_addr: String,
    /// Prefix under which every route is mounted. Empty or `/x` form.
    pub base_path: String,
    pub token_db_path: PathBuf,
    /// Seed token for a store that has none yet.
    pub initial_token: Option<String>,
    pub refresh_interval: Duration,
    pub refresh_max_lifetime: Duration,
    pub request_timeout: Duration,
    pub viewer_bundle_url: String,
    pub static_dir: PathBuf,
    pub home_url: String,
    pub support_email: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            public_api_url: DEFAULT_API_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            token_db_path: PathBuf::from(DEFAULT_TOKEN_DB_PATH),
            initial_token: None,
            refresh_interval: Duration::from_secs(300),
            refresh_max_lifetime: Duration::from_secs(8 * 3600),
            request_timeout: Duration::from_secs(30),
            viewer_bundle_url: format!("{}/static/viewer.js", DEFAULT_BASE_PATH),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            home_url: DEFAULT_HOME_URL.to_string(),
            support_email: DEFAULT_SUPPORT_EMAIL.to_string(),
        }
    }
}

impl Settings {
    /// Load `.env` if present, then read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source.
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();

        let api_url = validated_url("API_URL", get("API_URL"), &defaults.api_url)?;
        let public_api_url = match get("PUBLIC_API_URL") {
            Some(v) => validated_url("PUBLIC_API_URL", Some(v), &api_url)?,
            None => api_url.clone(),
        };
        let auth_url = validated_url("AUTH_URL", get("AUTH_URL"), &defaults.auth_url)?;

        let base_path = normalize_base_path(&get("BASE_PATH").unwrap_or(defaults.base_path));
        let viewer_bundle_url = get("VIEWER_BUNDLE_URL")
            .unwrap_or_else(|| format!("{}/static/viewer.js", base_path));

        Ok(Self {
            api_url,
            public_api_url,
            auth_url,
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            base_path,
            token_db_path: get("TOKEN_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.token_db_path),
            initial_token: get("DATA_VIEWER_TOKEN").filter(|t| !t.is_empty()),
            refresh_interval: seconds(&get, "TOKEN_REFRESH_INTERVAL_SECS", defaults.refresh_interval)?,
            refresh_max_lifetime: seconds(&get, "TOKEN_MAX_LIFETIME_SECS", defaults.refresh_max_lifetime)?,
            request_timeout: seconds(&get, "REQUEST_TIMEOUT_SECS", defaults.request_timeout)?,
            viewer_bundle_url,
            static_dir: get("STATIC_DIR").map(PathBuf::from).unwrap_or(defaults.static_dir),
            home_url: get("HOME_URL").unwrap_or(defaults.home_url),
            support_email: get("SUPPORT_EMAIL").unwrap_or(defaults.support_email),
        })
    }

    pub fn refresh_url(&self) -> String {
        format!("{}{}", self.auth_url, REFRESH_PATH)
    }
}

fn validated_url(name: &str, value: Option<String>, default: &str) -> Result<String> {
    let raw = value.unwrap_or_else(|| default.to_string());
    Url::parse(&raw).map_err(|e| ViewerError::Config(format!("{}: {}", name, e)))?;
    Ok(raw.trim_end_matches('/').to_string())
}

fn seconds<F>(get: &F, name: &str, default: Duration) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    match get(name) {
        None => Ok(default),
        Some(v) => u64::from_str(v.trim())
            .ok()
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .ok_or_else(|| ViewerError::Config(format!("{} must be a positive integer, got {:?}", name, v))),
    }
}

/// `""`, `"/"` -> `""`; `"data-viewer/"` -> `"/data-viewer"`.
pub fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
