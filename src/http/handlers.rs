//! HTTP request handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};

use super::models::{AVAILABLE_MESSAGE, MessageResponse, UNAVAILABLE_MESSAGE};
use crate::status::StatusCache;

/// Shared state for the HTTP server
#[derive(Clone)]
pub struct AppState {
    status_cache: Arc<StatusCache>,
}

impl AppState {
    pub fn new(status_cache: Arc<StatusCache>) -> Self {
        Self { status_cache }
    }
}

/// Root endpoint, gated on the mirrored profile service status
///
/// Only the exact status `up` answers 200; anything else, including values
/// never seen before, answers 503.
pub async fn root(State(state): State<AppState>) -> (StatusCode, Json<MessageResponse>) {
    let status = state.status_cache.status();
    if status.is_up() {
        return (StatusCode::OK, Json(MessageResponse::new(AVAILABLE_MESSAGE)));
    }

    tracing::debug!("Rejecting request, profile service status is {:?}", status.to_string());
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(MessageResponse::new(UNAVAILABLE_MESSAGE)),
    )
}
