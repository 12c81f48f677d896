//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Routes translate validated HTTP input into store calls, publish the
//! resulting domain events, and render returned snapshots. They never touch
//! the coalescer or registry directly — that wiring lives in the event bus
//! subscribers.

pub mod board;
pub mod cards;
pub mod sse;

use std::path::Path;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::services::board::StoreError;
use crate::state::AppState;

pub fn app(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(board::index))
        .route("/board", get(board::board_fragment))
        .route("/columns/{id}", get(board::column_fragment))
        .route("/cards", post(cards::create_card))
        .route("/cards/{id}", patch(cards::update_card).delete(cards::delete_card))
        .route("/cards/{id}/move", post(cards::move_card))
        .route("/cards/{id}/promote", post(cards::promote_card))
        .route("/cards/{id}/demote", post(cards::demote_card))
        .route("/sse", get(sse::handle_sse))
        .route("/healthz", get(healthz))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Map store failures to their external representation. Rejected calls leave
/// the store untouched, so nothing here needs cleanup.
pub(crate) fn store_error_to_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::CardNotFound(_) | StoreError::ColumnNotFound(_) => StatusCode::NOT_FOUND,
        StoreError::InvalidTransition(_) => StatusCode::CONFLICT,
    }
}
