//! Error types for the data viewer.
//!
//! Each variant corresponds to one way a page view or the token refresh loop
//! can fail. Resolution failures stop at the presentation controller; refresh
//! failures are only ever logged.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    /// No instrument/experiment/user combination was supplied.
    #[error("no valid identifier combination supplied")]
    MissingIdentifier,

    /// The lookup endpoint answered with a non-success status.
    #[error("file lookup failed: {status}")]
    LookupFailed { status: String },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// Text content for the text viewer could not be retrieved.
    #[error("could not fetch file content: {0}")]
    ContentFetchFailed(String),

    /// Token refresh was rejected or unreachable.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("token storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ViewerError {
    /// Whether this error should be rendered as the full-page fallback.
    pub fn is_fatal_for_view(&self) -> bool {
        matches!(
            self,
            ViewerError::MissingIdentifier
                | ViewerError::LookupFailed { .. }
                | ViewerError::Network(_)
        )
    }
}

impl From<reqwest::Error> for ViewerError {
    fn from(e: reqwest::Error) -> Self {
        ViewerError::Network(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;
