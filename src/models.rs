//! Data models for the data viewer.
//!
//! Identifier tuples extracted from page routes, the viewer mode chosen for a
//! file, the per-view presentation state, and the token refresh wire format.

use serde::{Deserialize, Serialize};

// ============================================================================
// Identifiers
// ============================================================================

/// Instrument/experiment/user fields extracted from a request. Any subset may
/// be present; the resolver decides which combination wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierTuple {
    pub instrument: Option<String>,
    pub experiment_number: Option<String>,
    pub user_number: Option<String>,
}

impl IdentifierTuple {
    pub fn instrument(instrument: &str, experiment_number: &str) -> Self {
        Self {
            instrument: Some(instrument.to_string()),
            experiment_number: Some(experiment_number.to_string()),
            user_number: None,
        }
    }

    pub fn experiment(experiment_number: &str) -> Self {
        Self {
            experiment_number: Some(experiment_number.to_string()),
            ..Default::default()
        }
    }

    pub fn user(user_number: &str) -> Self {
        Self {
            user_number: Some(user_number.to_string()),
            ..Default::default()
        }
    }
}

/// Everything one page view needs to resolve a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRequest {
    #[serde(flatten)]
    pub identifiers: IdentifierTuple,
    pub filename: String,
}

impl ViewRequest {
    pub fn new(identifiers: IdentifierTuple, filename: &str) -> Self {
        Self {
            identifiers,
            filename: filename.to_string(),
        }
    }
}

// ============================================================================
// Viewer Mode
// ============================================================================

/// Extensions rendered as raw text. Everything else goes to the structured viewer.
pub const TEXT_EXTENSIONS: &[&str] = &["txt", "csv", "gss", "xye"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewerMode {
    Structured,
    Text,
}

impl ViewerMode {
    /// Pick the viewer from the substring after the last `.` of `filename`.
    pub fn from_filename(filename: &str) -> Self {
        let extension = match filename.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return ViewerMode::Structured,
        };

        if TEXT_EXTENSIONS.contains(&extension.as_str()) {
            ViewerMode::Text
        } else {
            ViewerMode::Structured
        }
    }
}

// ============================================================================
// Presentation State
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Idle,
    Resolving,
    Ready { file_path: String, mode: ViewerMode },
    Error { reason: String },
}

impl ViewState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ViewState::Ready { .. })
    }
}

// ============================================================================
// Structured Viewer Configuration
// ============================================================================

/// Request options handed to the browser-side structured-data viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestConfig {
    pub params: FileParam,
    pub headers: AuthHeaders,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileParam {
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthHeaders {
    #[serde(rename = "Authorization", skip_serializing_if = "Option::is_none")]
    pub authorization: Option<String>,
}

/// Everything the structured viewer needs to mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerConfig {
    pub api_url: String,
    pub filepath: String,
    pub axios_config: RequestConfig,
}

impl ViewerConfig {
    pub fn new(api_url: &str, filepath: &str, token: &str) -> Self {
        let authorization = if token.is_empty() {
            None
        } else {
            Some(format!("Bearer {}", token))
        };
        Self {
            api_url: api_url.to_string(),
            filepath: filepath.to_string(),
            axios_config: RequestConfig {
                params: FileParam {
                    file: filepath.to_string(),
                },
                headers: AuthHeaders { authorization },
            },
        }
    }
}

/// What a page view ends up showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation {
    Structured(ViewerConfig),
    /// `content` is `Err` with a reason when the text could not be fetched.
    Text {
        file_path: String,
        content: Result<String, String>,
    },
    Fallback { reason: String },
}

// ============================================================================
// Token Refresh Wire Format
// ============================================================================

/// Body of both the refresh request and its response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPayload {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_extensions() {
        assert_eq!(ViewerMode::from_filename("data.txt"), ViewerMode::Text);
        assert_eq!(ViewerMode::from_filename("data.csv"), ViewerMode::Text);
        assert_eq!(ViewerMode::from_filename("run.gss"), ViewerMode::Text);
        assert_eq!(ViewerMode::from_filename("run.xye"), ViewerMode::Text);
        assert_eq!(ViewerMode::from_filename("DATA.TXT"), ViewerMode::Text);
    }

    #[test]
    fn test_structured_default() {
        assert_eq!(ViewerMode::from_filename("data.nxspe"), ViewerMode::Structured);
        assert_eq!(ViewerMode::from_filename("data.nxs"), ViewerMode::Structured);
        assert_eq!(ViewerMode::from_filename("data"), ViewerMode::Structured);
        assert_eq!(ViewerMode::from_filename("archive.txt.nxs"), ViewerMode::Structured);
    }

    #[test]
    fn test_last_dot_wins() {
        assert_eq!(
            ViewerMode::from_filename("MAR29531_10.5meV_sa.nxspe"),
            ViewerMode::Structured
        );
        assert_eq!(ViewerMode::from_filename("summary.nxs.csv"), ViewerMode::Text);
    }

    #[test]
    fn test_viewer_config_json() {
        let config = ViewerConfig::new("http://api", "MARI/a b.nxspe", "tok");
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["apiUrl"], "http://api");
        assert_eq!(json["filepath"], "MARI/a b.nxspe");
        assert_eq!(json["axiosConfig"]["params"]["file"], "MARI/a b.nxspe");
        assert_eq!(json["axiosConfig"]["headers"]["Authorization"], "Bearer tok");

        let anonymous = serde_json::to_value(ViewerConfig::new("http://api", "x", "")).unwrap();
        assert!(anonymous["axiosConfig"]["headers"].get("Authorization").is_none());
    }

    #[test]
    fn test_view_request_flattens_identifiers() {
        let request: ViewRequest = serde_json::from_str(
            r#"{"instrument":"MARI","experiment_number":"20024","filename":"a.nxspe"}"#,
        )
        .unwrap();
        assert_eq!(request.identifiers, IdentifierTuple::instrument("MARI", "20024"));
        assert_eq!(request.filename, "a.nxspe");
    }
}
