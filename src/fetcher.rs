//! File path lookup and text content retrieval.
//!
//! The backend answers a lookup with the file's path relative to its storage
//! root, usually JSON-quoted and sometimes still percent-encoded. This module
//! turns that body into a canonical path and fetches raw text for the text
//! viewer.

use crate::error::{Result, ViewerError};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, warn};

// ============================================================================
// Path Decoding
// ============================================================================

/// Substitutions applied after quote stripping, in order.
const PATH_DECODE_STEPS: &[(&str, &str)] = &[("%2C", ","), ("%2c", ","), ("%20", " ")];

fn strip_quotes(s: &str) -> String {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        // JSON string bodies may also carry escape sequences.
        return serde_json::from_str::<String>(s).unwrap_or_else(|_| s[1..s.len() - 1].to_string());
    }
    if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
        return s[1..s.len() - 1].to_string();
    }
    s.to_string()
}

/// Normalize a raw lookup response body into a file path.
///
/// 1. drop trailing/leading line terminators
/// 2. strip one pair of wrapping quotes (decoding JSON escapes when present)
/// 3. `%2C` / `%2c` become `,`
/// 4. `%20` becomes a space
///
/// Other whitespace is part of the path; a space produced by step 4 must
/// survive a second pass.
pub fn decode_file_path(raw: &str) -> String {
    let unquoted = strip_quotes(raw.trim_matches(|c: char| c == '\r' || c == '\n'));
    PATH_DECODE_STEPS
        .iter()
        .fold(unquoted, |acc, (from, to)| acc.replace(from, to))
}

// ============================================================================
// Lookup Client
// ============================================================================

/// Backend operations a page view depends on.
#[async_trait]
pub trait FileLookup: Send + Sync {
    /// Resolve `filename` through `lookup_url` into a decoded file path.
    async fn find_file(&self, lookup_url: &str, filename: &str, token: &str) -> Result<String>;

    /// Fetch raw file content for the text viewer.
    async fn fetch_text(&self, text_url: &str, filename: &str, token: &str) -> Result<String>;
}

/// `FileLookup` backed by the real HTTP API.
#[derive(Clone)]
pub struct HttpFileLookup {
    client: reqwest::Client,
}

impl HttpFileLookup {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    fn get(&self, url: &str, filename: &str, token: &str) -> reqwest::RequestBuilder {
        let request = self
            .client
            .get(url)
            .query(&[("filename", filename)])
            .header(CONTENT_TYPE, "application/json");
        if token.is_empty() {
            request
        } else {
            request.bearer_auth(token)
        }
    }
}

#[async_trait]
impl FileLookup for HttpFileLookup {
    async fn find_file(&self, lookup_url: &str, filename: &str, token: &str) -> Result<String> {
        debug!("Looking up {} via {}", filename, lookup_url);
        let response = self.get(lookup_url, filename, token).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Lookup for {} returned {}", filename, status);
            return Err(ViewerError::LookupFailed {
                status: status.to_string(),
            });
        }

        let body = response.text().await?;
        Ok(decode_file_path(&body))
    }

    async fn fetch_text(&self, text_url: &str, filename: &str, token: &str) -> Result<String> {
        let response = self
            .get(text_url, filename, token)
            .send()
            .await
            .map_err(|e| ViewerError::ContentFetchFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Text fetch for {} returned {}", filename, status);
            return Err(ViewerError::ContentFetchFailed(status.to_string()));
        }

        response
            .text()
            .await
            .map_err(|e| ViewerError::ContentFetchFailed(e.to_string()))
    }
}
