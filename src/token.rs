//! Bearer token storage and background refresh.
//!
//! The token lives in sled under a fixed key. `TokenStore` is its only writer:
//! the initial seed at startup and the refresh loop. Everything else reads it
//! through `current()`, and may see the old or the new value around a refresh.

use crate::error::{Result, ViewerError};
use crate::models::TokenPayload;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Storage key for the persisted token.
pub const TOKEN_KEY: &str = "scigateway:token";

/// Path of the refresh endpoint below the auth base URL.
pub const REFRESH_PATH: &str = "/auth/api/jwt/refresh";

// ============================================================================
// Token Store
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStatus {
    Unloaded,
    Loaded,
    Refreshing,
    /// Last refresh failed; the previous token is still in use.
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenSnapshot {
    pub status: TokenStatus,
    pub has_token: bool,
    pub last_refreshed: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[derive(Debug)]
struct RefreshState {
    status: TokenStatus,
    last_refreshed: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

pub struct TokenStore {
    db: sled::Db,
    state: Mutex<RefreshState>,
}

impl TokenStore {
    pub fn new(db: sled::Db) -> Self {
        Self {
            db,
            state: Mutex::new(RefreshState {
                status: TokenStatus::Unloaded,
                last_refreshed: None,
                last_error: None,
            }),
        }
    }

    /// Persist `token` unless one is already stored.
    pub fn seed(&self, token: &str) -> Result<()> {
        if token.is_empty() {
            return Ok(());
        }
        let previous = self
            .db
            .compare_and_swap(TOKEN_KEY, None as Option<&[u8]>, Some(token.as_bytes()))?;
        if previous.is_ok() {
            self.db.flush()?;
            info!("Seeded bearer token from environment");
        }
        Ok(())
    }

    /// Read the persisted token and mark the store as loaded.
    pub fn load(&self) -> Result<String> {
        let token = self.read()?;
        self.set_status(TokenStatus::Loaded, None);
        Ok(token)
    }

    /// The current token, or an empty string if none is stored.
    pub fn current(&self) -> String {
        self.read().unwrap_or_else(|e| {
            warn!("Failed to read token: {}", e);
            String::new()
        })
    }

    pub fn snapshot(&self) -> TokenSnapshot {
        let has_token = !self.current().is_empty();
        let state = self.lock_state();
        TokenSnapshot {
            status: state.status,
            has_token,
            last_refreshed: state.last_refreshed,
            last_error: state.last_error.clone(),
        }
    }

    /// Exchange the current token for a new one at `refresh_url`.
    ///
    /// On failure the stored token is left untouched.
    pub async fn refresh(&self, client: &reqwest::Client, refresh_url: &str) -> Result<()> {
        self.set_status(TokenStatus::Refreshing, None);

        match self.request_new_token(client, refresh_url).await {
            Ok(token) => {
                self.db.insert(TOKEN_KEY, token.as_bytes())?;
                self.db.flush_async().await?;
                let mut state = self.lock_state();
                state.status = TokenStatus::Loaded;
                state.last_refreshed = Some(Utc::now());
                state.last_error = None;
                debug!("Bearer token refreshed");
                Ok(())
            }
            Err(e) => {
                self.set_status(TokenStatus::Failed, Some(e.to_string()));
                Err(e)
            }
        }
    }

    async fn request_new_token(&self, client: &reqwest::Client, refresh_url: &str) -> Result<String> {
        let payload = TokenPayload {
            token: self.current(),
        };
        let response = client
            .post(refresh_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ViewerError::RefreshFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ViewerError::RefreshFailed(status.to_string()));
        }

        let body: TokenPayload = response
            .json()
            .await
            .map_err(|e| ViewerError::RefreshFailed(e.to_string()))?;
        Ok(body.token)
    }

    fn read(&self) -> Result<String> {
        Ok(self
            .db
            .get(TOKEN_KEY)?
            .map(|v| String::from_utf8_lossy(&v).into_owned())
            .unwrap_or_default())
    }

    fn set_status(&self, status: TokenStatus, error: Option<String>) {
        let mut state = self.lock_state();
        state.status = status;
        if error.is_some() {
            state.last_error = error;
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ============================================================================
// Refresh Task
// ============================================================================

#[derive(Debug, Clone)]
pub struct RefreshConfig {
    pub url: String,
    pub interval: Duration,
    pub max_lifetime: Duration,
}

/// Handle to the background refresh loop.
///
/// Refreshes immediately, then every `interval`, and stops after
/// `max_lifetime`, on `cancel()`, or when the handle is dropped.
pub struct RefreshTask {
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl RefreshTask {
    pub fn spawn(store: Arc<TokenStore>, client: reqwest::Client, config: RefreshConfig) -> Self {
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let deadline = tokio::time::sleep(config.max_lifetime);
            tokio::pin!(deadline);

            let mut ticker = tokio::time::interval(config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            'refresh: loop {
                tokio::select! {
                    _ = &mut cancel_rx => {
                        info!("Token refresh cancelled");
                        break 'refresh;
                    }
                    _ = &mut deadline => {
                        info!("Token refresh stopped after {:?}", config.max_lifetime);
                        break 'refresh;
                    }
                    _ = ticker.tick() => {}
                }

                // An in-flight refresh must not hold up cancellation or the lifetime ceiling.
                tokio::select! {
                    result = store.refresh(&client, &config.url) => {
                        if let Err(e) = result {
                            warn!("{}", e);
                        }
                    }
                    _ = &mut cancel_rx => {
                        info!("Token refresh cancelled mid-request");
                        store.set_status(TokenStatus::Failed, Some("refresh interrupted".to_string()));
                        break 'refresh;
                    }
                    _ = &mut deadline => {
                        info!("Token refresh stopped after {:?}", config.max_lifetime);
                        store.set_status(TokenStatus::Failed, Some("refresh interrupted".to_string()));
                        break 'refresh;
                    }
                }
            }
        });

        Self {
            cancel: Some(cancel_tx),
            handle,
        }
    }

    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the loop to exit on its own or after `cancel()`.
    pub async fn join(self) {
        let RefreshTask { cancel, handle } = self;
        let _ = handle.await;
        drop(cancel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn temp_store() -> Arc<TokenStore> {
        let db = sled::Config::new().temporary(true).open().unwrap();
        Arc::new(TokenStore::new(db))
    }

    async fn wait_for<F: Fn() -> bool>(check: F) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !check() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[test]
    fn test_load_empty_store() {
        let store = temp_store();
        assert_eq!(store.snapshot().status, TokenStatus::Unloaded);
        assert_eq!(store.load().unwrap(), "");
        assert_eq!(store.snapshot().status, TokenStatus::Loaded);
        assert!(!store.snapshot().has_token);
    }

    #[test]
    fn test_seed_does_not_overwrite() {
        let store = temp_store();
        store.seed("first").unwrap();
        store.seed("second").unwrap();
        assert_eq!(store.load().unwrap(), "first");
    }

    #[tokio::test]
    async fn test_refresh_replaces_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .and(body_json(serde_json::json!({"token": "old"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "new"})))
            .mount(&server)
            .await;

        let store = temp_store();
        store.seed("old").unwrap();
        store.load().unwrap();

        let url = format!("{}{}", server.uri(), REFRESH_PATH);
        store.refresh(&reqwest::Client::new(), &url).await.unwrap();

        assert_eq!(store.current(), "new");
        let snapshot = store.snapshot();
        assert_eq!(snapshot.status, TokenStatus::Loaded);
        assert!(snapshot.last_refreshed.is_some());
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_stale_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let store = temp_store();
        store.seed("stale").unwrap();

        let url = format!("{}{}", server.uri(), REFRESH_PATH);
        let err = store.refresh(&reqwest::Client::new(), &url).await.unwrap_err();

        assert!(matches!(err, ViewerError::RefreshFailed(_)));
        assert_eq!(store.current(), "stale");
        let snapshot = store.snapshot();
        assert_eq!(snapshot.status, TokenStatus::Failed);
        assert!(snapshot.last_error.is_some());
    }

    #[tokio::test]
    async fn test_task_refreshes_immediately_and_cancels() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "fresh"})))
            .mount(&server)
            .await;

        let store = temp_store();
        store.seed("old").unwrap();

        let mut task = RefreshTask::spawn(
            store.clone(),
            reqwest::Client::new(),
            RefreshConfig {
                url: format!("{}{}", server.uri(), REFRESH_PATH),
                interval: Duration::from_secs(3600),
                max_lifetime: Duration::from_secs(3600),
            },
        );

        wait_for(|| store.current() == "fresh").await;
        assert!(!task.is_finished());

        task.cancel();
        tokio::time::timeout(Duration::from_secs(5), task.join())
            .await
            .expect("task did not stop");
    }

    #[tokio::test]
    async fn test_task_stops_after_max_lifetime() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let store = temp_store();
        store.seed("kept").unwrap();

        let task = RefreshTask::spawn(
            store.clone(),
            reqwest::Client::new(),
            RefreshConfig {
                url: format!("{}{}", server.uri(), REFRESH_PATH),
                interval: Duration::from_millis(20),
                max_lifetime: Duration::from_millis(200),
            },
        );

        tokio::time::timeout(Duration::from_secs(5), task.join())
            .await
            .expect("task outlived its maximum lifetime");

        let attempts = server.received_requests().await.unwrap().len();
        assert!(attempts >= 2, "expected repeated attempts, got {}", attempts);
        assert_eq!(store.current(), "kept");
    }

    #[tokio::test]
    async fn test_cancel_does_not_wait_for_slow_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"token": "late"}))
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(&server)
            .await;

        let store = temp_store();
        store.seed("old").unwrap();

        let mut task = RefreshTask::spawn(
            store.clone(),
            reqwest::Client::new(),
            RefreshConfig {
                url: format!("{}{}", server.uri(), REFRESH_PATH),
                interval: Duration::from_secs(3600),
                max_lifetime: Duration::from_secs(3600),
            },
        );

        wait_for(|| store.snapshot().status == TokenStatus::Refreshing).await;

        task.cancel();
        tokio::time::timeout(Duration::from_secs(2), task.join())
            .await
            .expect("cancel waited for the in-flight refresh");

        assert_eq!(store.current(), "old");
        assert_eq!(store.snapshot().status, TokenStatus::Failed);
    }

    #[tokio::test]
    async fn test_max_lifetime_interrupts_slow_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_secs(30)))
            .mount(&server)
            .await;

        let store = temp_store();
        store.seed("kept").unwrap();

        let task = RefreshTask::spawn(
            store.clone(),
            reqwest::Client::new(),
            RefreshConfig {
                url: format!("{}{}", server.uri(), REFRESH_PATH),
                interval: Duration::from_secs(3600),
                max_lifetime: Duration::from_millis(200),
            },
        );

        tokio::time::timeout(Duration::from_secs(2), task.join())
            .await
            .expect("slow refresh overran the maximum lifetime");
        assert_eq!(store.current(), "kept");
    }
}
