//! Card mutation routes.
//!
//! DESIGN
//! ======
//! Each handler validates input, applies exactly one store operation, then
//! publishes the matching domain event on the bus before building its
//! response. Dispatch is synchronous, so the re-render of a mutation is
//! already queued for broadcast by the time the direct response is written.

use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use serde::Deserialize;
use tracing::info;

use crate::render;
use crate::routes::store_error_to_status;
use crate::services::board::{Card, CardId, ColumnId, StoreError};
use crate::services::bus::BoardEvent;
use crate::state::AppState;

const MAX_TITLE_LEN: usize = 100;
const MAX_CONTENT_LEN: usize = 1000;

// =============================================================================
// FORMS
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CardForm {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub column_id: Option<ColumnId>,
}

/// Updates take title and content only. A card's column is changed through
/// the move routes, never through PATCH.
#[derive(Debug, Deserialize)]
pub struct UpdateForm {
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct MoveForm {
    pub column_id: ColumnId,
    pub position: Option<usize>,
}

/// Title required and bounded; content bounded. Mirrors what the form
/// enforces client-side, revalidated here because the form is advisory.
fn validate_card_form(title: &str, content: &str) -> Result<(), (StatusCode, String)> {
    let title = title.trim();
    if title.is_empty() {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "title is required".into()));
    }
    if title.len() > MAX_TITLE_LEN {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, format!("title must be at most {MAX_TITLE_LEN} characters")));
    }
    if content.len() > MAX_CONTENT_LEN {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("content must be at most {MAX_CONTENT_LEN} characters"),
        ));
    }
    Ok(())
}

fn map_store_error(err: &StoreError) -> (StatusCode, String) {
    (store_error_to_status(err), err.to_string())
}

fn render_card(state: &AppState, card: &Card) -> Html<String> {
    let (can_promote, can_demote) = state.store.card_affordances(card.id);
    Html(render::card_fragment(card, can_promote, can_demote))
}

// =============================================================================
// CREATE / UPDATE / DELETE
// =============================================================================

/// `POST /cards` — create a card at the end of a column.
pub async fn create_card(
    State(state): State<AppState>,
    Form(form): Form<CardForm>,
) -> Result<Html<String>, (StatusCode, String)> {
    let Some(column_id) = form.column_id else {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "column_id is required".into()));
    };
    validate_card_form(&form.title, &form.content)?;

    let card = state
        .store
        .add_card(form.title.trim(), &form.content, column_id)
        .map_err(|e| map_store_error(&e))?;
    info!(card_id = card.id, column_id, "card created");

    state.bus.publish(&BoardEvent::CardChanged { card_id: card.id });
    Ok(render_card(&state, &card))
}

/// `PATCH /cards/{id}` — update title/content in place.
pub async fn update_card(
    State(state): State<AppState>,
    Path(card_id): Path<CardId>,
    Form(form): Form<UpdateForm>,
) -> Result<Html<String>, (StatusCode, String)> {
    validate_card_form(&form.title, &form.content)?;

    let card = state
        .store
        .update_card(card_id, form.title.trim(), &form.content)
        .map_err(|e| map_store_error(&e))?;
    info!(card_id, "card updated");

    state.bus.publish(&BoardEvent::CardChanged { card_id });
    Ok(render_card(&state, &card))
}

/// `DELETE /cards/{id}`.
pub async fn delete_card(
    State(state): State<AppState>,
    Path(card_id): Path<CardId>,
) -> Result<StatusCode, (StatusCode, String)> {
    let removed = state.store.delete_card(card_id).map_err(|e| map_store_error(&e))?;
    info!(card_id, column_id = removed.column_id, "card deleted");

    state.bus.publish(&BoardEvent::CardDeleted { column_id: removed.column_id });
    Ok(StatusCode::OK)
}

// =============================================================================
// MOVE / PROMOTE / DEMOTE
// =============================================================================

/// `POST /cards/{id}/move` — place a card at a position in a column. A
/// missing or past-the-end position appends.
pub async fn move_card(
    State(state): State<AppState>,
    Path(card_id): Path<CardId>,
    Form(form): Form<MoveForm>,
) -> Result<Html<String>, (StatusCode, String)> {
    let (old, new) = state
        .store
        .move_card(card_id, form.column_id, form.position)
        .map_err(|e| map_store_error(&e))?;
    info!(card_id, from = old.column.id, to = new.column.id, position = ?form.position, "card moved");

    state.bus.publish(&BoardEvent::CardMoved {
        card_id,
        from_column_id: old.column.id,
        to_column_id: new.column.id,
    });
    Ok(Html(render::column_fragment(&new)))
}

/// `POST /cards/{id}/promote` — move to the next-higher column.
pub async fn promote_card(
    State(state): State<AppState>,
    Path(card_id): Path<CardId>,
) -> Result<Html<String>, (StatusCode, String)> {
    let (old, new) = state.store.promote(card_id).map_err(|e| map_store_error(&e))?;
    info!(card_id, from = old.column.id, to = new.column.id, "card promoted");

    state.bus.publish(&BoardEvent::CardMoved {
        card_id,
        from_column_id: old.column.id,
        to_column_id: new.column.id,
    });
    Ok(Html(render::column_fragment(&new)))
}

/// `POST /cards/{id}/demote` — move to the next-lower column.
pub async fn demote_card(
    State(state): State<AppState>,
    Path(card_id): Path<CardId>,
) -> Result<Html<String>, (StatusCode, String)> {
    let (old, new) = state.store.demote(card_id).map_err(|e| map_store_error(&e))?;
    info!(card_id, from = old.column.id, to = new.column.id, "card demoted");

    state.bus.publish(&BoardEvent::CardMoved {
        card_id,
        from_column_id: old.column.id,
        to_column_id: new.column.id,
    });
    Ok(Html(render::column_fragment(&new)))
}

#[cfg(test)]
#[path = "cards_test.rs"]
mod tests;
