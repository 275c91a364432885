//! Data viewer library - re-exports for testing and external use.
//!
//! This module provides public access to all the application's modules
//! and builds the router shared by the binary and the tests.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::services::ServeDir;

pub mod config;
pub mod controller;
pub mod error;
pub mod fetcher;
pub mod handlers;
pub mod models;
pub mod resolver;
pub mod templates;
pub mod token;

use config::Settings;
use controller::{ControllerConfig, PresentationController};
use fetcher::{FileLookup, HttpFileLookup};
use token::TokenStore;

// ============================================================================
// Application State
// ============================================================================

pub struct AppState {
    pub settings: Settings,
    pub tokens: Arc<TokenStore>,
    pub lookup: Arc<dyn FileLookup>,
}

impl AppState {
    /// Open the token database, seed it if configured, and build the HTTP lookup client.
    pub fn new(settings: Settings) -> error::Result<Self> {
        let db = sled::open(&settings.token_db_path)?;
        let lookup = Arc::new(HttpFileLookup::new(settings.request_timeout)?);
        Self::with_parts(settings, db, lookup)
    }

    pub fn with_parts(settings: Settings, db: sled::Db, lookup: Arc<dyn FileLookup>) -> error::Result<Self> {
        let tokens = Arc::new(TokenStore::new(db));
        if let Some(ref token) = settings.initial_token {
            tokens.seed(token)?;
        }
        tokens.load()?;

        Ok(Self {
            settings,
            tokens,
            lookup,
        })
    }

    /// A fresh controller for one page view.
    pub fn controller(&self) -> PresentationController {
        PresentationController::new(
            ControllerConfig {
                api_url: self.settings.api_url.clone(),
                public_api_url: self.settings.public_api_url.clone(),
            },
            self.lookup.clone(),
            self.tokens.clone(),
        )
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: Arc<AppState>) -> Router {
    let routes = Router::new()
        // View routes
        .route(
            "/view/{instrument}/{experiment_number}/{filename}",
            get(handlers::view_instrument),
        )
        .route(
            "/view/generic/experiment_number/{experiment_number}/{filename}",
            get(handlers::view_experiment),
        )
        .route(
            "/view/generic/user_number/{user_number}/{filename}",
            get(handlers::view_user),
        )
        // API routes
        .route("/api/resolve", get(handlers::resolve_api))
        .route("/health", get(handlers::health))
        .nest_service("/static", ServeDir::new(&state.settings.static_dir));

    let app = if state.settings.base_path.is_empty() {
        routes
    } else {
        Router::new().nest(&state.settings.base_path, routes)
    };

    app.fallback(handlers::not_found).with_state(state)
}

// Re-export commonly used types
pub use error::ViewerError;
pub use fetcher::decode_file_path;
pub use models::{IdentifierTuple, Presentation, ViewRequest, ViewState, ViewerConfig, ViewerMode};
pub use resolver::{resolve_lookup_url, text_content_url};
pub use token::{RefreshConfig, RefreshTask, TokenStatus};
