//! Board and column read routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Html;

use crate::render;
use crate::routes::store_error_to_status;
use crate::services::board::ColumnId;
use crate::state::AppState;

/// `GET /` — full board page with the SSE client bootstrap.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render::board_page(&state.store))
}

/// `GET /board` — board fragment only.
pub async fn board_fragment(State(state): State<AppState>) -> Html<String> {
    Html(render::board_fragment(&state.store))
}

/// `GET /columns/{id}` — single column fragment.
pub async fn column_fragment(
    State(state): State<AppState>,
    Path(column_id): Path<ColumnId>,
) -> Result<Html<String>, StatusCode> {
    let snapshot = state
        .store
        .get_column(column_id)
        .map_err(|e| store_error_to_status(&e))?;
    Ok(Html(render::column_fragment(&snapshot)))
}

#[cfg(test)]
#[path = "board_test.rs"]
mod tests;
