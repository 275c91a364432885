//! Presentation controller.
//!
//! Drives one view through `Idle -> Resolving -> Ready | Error`. Every call to
//! `update` takes a new generation number; a lookup only writes its result if
//! its generation is still the latest when it completes, so a slow, superseded
//! lookup can never overwrite the state of a newer one.

use crate::error::ViewerError;
use crate::fetcher::FileLookup;
use crate::models::{Presentation, ViewRequest, ViewState, ViewerConfig, ViewerMode};
use crate::resolver::{resolve_lookup_url, text_content_url};
use crate::token::TokenStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Backend base URL used for lookups from this server.
    pub api_url: String,
    /// Backend base URL handed to the browser-side viewer.
    pub public_api_url: String,
}

struct Current {
    /// Inputs of the last completed resolution.
    resolved_for: Option<(ViewRequest, String)>,
    state: ViewState,
}

pub struct PresentationController {
    config: ControllerConfig,
    lookup: Arc<dyn FileLookup>,
    tokens: Arc<TokenStore>,
    generation: AtomicU64,
    current: Mutex<Current>,
}

impl PresentationController {
    pub fn new(config: ControllerConfig, lookup: Arc<dyn FileLookup>, tokens: Arc<TokenStore>) -> Self {
        Self {
            config,
            lookup,
            tokens,
            generation: AtomicU64::new(0),
            current: Mutex::new(Current {
                resolved_for: None,
                state: ViewState::Idle,
            }),
        }
    }

    pub fn state(&self) -> ViewState {
        self.lock().state.clone()
    }

    /// Resolve `request` and return the state that is current afterwards.
    ///
    /// A Ready state is reused as long as the request and token are unchanged.
    pub async fn update(&self, request: ViewRequest) -> ViewState {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = self.tokens.current();

        {
            let current = self.lock();
            if current.state.is_ready()
                && current.resolved_for.as_ref() == Some(&(request.clone(), token.clone()))
            {
                return current.state.clone();
            }
        }

        let lookup_url = match resolve_lookup_url(&self.config.api_url, &request.identifiers) {
            Some(url) => url,
            None => {
                info!("No identifier supplied for {}", request.filename);
                return self.apply(generation, request, token, Err(ViewerError::MissingIdentifier));
            }
        };

        self.set_if_current(generation, ViewState::Resolving);

        let result = self
            .lookup
            .find_file(&lookup_url, &request.filename, &token)
            .await;
        self.apply(generation, request, token, result)
    }

    /// Resolve `request` and turn the outcome into something renderable.
    pub async fn present(&self, request: ViewRequest) -> Presentation {
        match self.update(request.clone()).await {
            ViewState::Ready { file_path, mode: ViewerMode::Structured } => {
                let token = self.tokens.current();
                Presentation::Structured(ViewerConfig::new(
                    &self.config.public_api_url,
                    &file_path,
                    &token,
                ))
            }
            ViewState::Ready { file_path, mode: ViewerMode::Text } => {
                match self.load_text(&request).await {
                    Ok(text) => Presentation::Text {
                        file_path,
                        content: Ok(text),
                    },
                    Err(e) if e.is_fatal_for_view() => Presentation::Fallback {
                        reason: e.to_string(),
                    },
                    Err(e) => Presentation::Text {
                        file_path,
                        content: Err(e.to_string()),
                    },
                }
            }
            ViewState::Error { reason } => Presentation::Fallback { reason },
            ViewState::Idle | ViewState::Resolving => Presentation::Fallback {
                reason: "resolution did not complete".to_string(),
            },
        }
    }

    async fn load_text(&self, request: &ViewRequest) -> Result<String, ViewerError> {
        let url = text_content_url(&self.config.api_url, &request.identifiers).ok_or_else(|| {
            ViewerError::ContentFetchFailed(
                "text content is only served for instrument experiments".to_string(),
            )
        })?;
        self.lookup
            .fetch_text(&url, &request.filename, &self.tokens.current())
            .await
    }

    fn apply(
        &self,
        generation: u64,
        request: ViewRequest,
        token: String,
        result: Result<String, ViewerError>,
    ) -> ViewState {
        let mut current = self.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding superseded resolution for {}", request.filename);
            return current.state.clone();
        }

        let next = match result {
            Ok(file_path) => {
                let mode = ViewerMode::from_filename(&request.filename);
                current.resolved_for = Some((request, token));
                ViewState::Ready { file_path, mode }
            }
            Err(e) => {
                current.resolved_for = None;
                ViewState::Error {
                    reason: e.to_string(),
                }
            }
        };
        current.state = next.clone();
        next
    }

    fn set_if_current(&self, generation: u64, state: ViewState) {
        let mut current = self.lock();
        if self.generation.load(Ordering::SeqCst) == generation {
            current.state = state;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Current> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
