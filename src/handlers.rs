//! HTTP route handlers for the data viewer.
//!
//! Each view route turns its path segments into an identifier tuple and a
//! filename, runs a presentation controller over them, and renders the result.

use crate::models::{IdentifierTuple, Presentation, ViewRequest, ViewState, ViewerMode};
use crate::resolver::resolve_lookup_url;
use crate::templates::{render_fallback, render_not_found, render_structured_viewer, render_text_viewer};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[cfg(test)]
#[path = "handlers_test.rs"]
mod handlers_test;

// ============================================================================
// View Handlers
// ============================================================================

pub async fn view_instrument(
    Path((instrument, experiment_number, filename)): Path<(String, String, String)>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let ids = IdentifierTuple::instrument(&instrument, &experiment_number);
    render_view(&state, ViewRequest::new(ids, &filename)).await
}

pub async fn view_experiment(
    Path((experiment_number, filename)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let ids = IdentifierTuple::experiment(&experiment_number);
    render_view(&state, ViewRequest::new(ids, &filename)).await
}

pub async fn view_user(
    Path((user_number, filename)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let ids = IdentifierTuple::user(&user_number);
    render_view(&state, ViewRequest::new(ids, &filename)).await
}

async fn render_view(state: &AppState, request: ViewRequest) -> Response {
    info!("Viewing {} for {:?}", request.filename, request.identifiers);
    let controller = state.controller();

    match controller.present(request).await {
        Presentation::Structured(config) => {
            Html(render_structured_viewer(&state.settings, &config)).into_response()
        }
        Presentation::Text { file_path, content } => {
            Html(render_text_viewer(&state.settings, &file_path, &content)).into_response()
        }
        Presentation::Fallback { reason } => (
            StatusCode::BAD_GATEWAY,
            Html(render_fallback(&state.settings, &reason)),
        )
            .into_response(),
    }
}

// ============================================================================
// Resolve API
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub instrument: Option<String>,
    pub experiment_number: Option<String>,
    pub user_number: Option<String>,
    pub filename: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub lookup_url: String,
    pub file_path: String,
    pub mode: ViewerMode,
}

/// JSON variant of a page view: where the file lives and how it would render.
pub async fn resolve_api(
    Query(query): Query<ResolveQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let ids = IdentifierTuple {
        instrument: query.instrument,
        experiment_number: query.experiment_number,
        user_number: query.user_number,
    };

    let lookup_url = match resolve_lookup_url(&state.settings.api_url, &ids) {
        Some(url) => url,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "no valid identifier combination supplied"})),
            )
                .into_response()
        }
    };

    let controller = state.controller();
    match controller.update(ViewRequest::new(ids, &query.filename)).await {
        ViewState::Ready { file_path, mode } => Json(ResolveResponse {
            lookup_url,
            file_path,
            mode,
        })
        .into_response(),
        ViewState::Error { reason } => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({"error": reason})),
        )
            .into_response(),
        ViewState::Idle | ViewState::Resolving => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

// ============================================================================
// Health / Not Found
// ============================================================================

pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "token": state.tokens.snapshot(),
    }))
}

pub async fn not_found(State(state): State<Arc<AppState>>) -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, Html(render_not_found(&state.settings)))
}
