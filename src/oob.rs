//! Out-of-band update pipeline.
//!
//! DESIGN
//! ======
//! Wires the event bus to the coalescer at startup: each handler re-renders
//! the affected column fragment(s) against a fresh store snapshot and submits
//! them for broadcast. Handlers run synchronously on the mutating request's
//! thread, after the store has committed but before the response is written,
//! so the acting client's direct response always lands before its own echo.
//!
//! ERROR HANDLING
//! ==============
//! A lookup that fails here means the entity vanished between commit and
//! re-render (e.g. a delete racing a change). The update for that fragment is
//! skipped with an error log; other fragments are unaffected.

use std::sync::Arc;

use tracing::error;

use crate::render;
use crate::services::board::{BoardStore, ColumnId};
use crate::services::bus::{BoardEvent, EventBus, EventKind};
use crate::services::coalesce::BroadcastCoalescer;

/// Register the re-render subscribers that turn committed mutations into
/// out-of-band column updates.
pub fn subscribe_column_updates(bus: &EventBus, store: Arc<BoardStore>, coalescer: Arc<BroadcastCoalescer>) {
    {
        let store = store.clone();
        let coalescer = coalescer.clone();
        bus.subscribe(EventKind::CardMoved, move |event| {
            let BoardEvent::CardMoved { from_column_id, to_column_id, .. } = event else {
                return;
            };
            submit_column(&store, &coalescer, *to_column_id);
            if from_column_id != to_column_id {
                submit_column(&store, &coalescer, *from_column_id);
            }
        });
    }
    {
        let store = store.clone();
        let coalescer = coalescer.clone();
        bus.subscribe(EventKind::CardChanged, move |event| {
            let BoardEvent::CardChanged { card_id } = event else {
                return;
            };
            match store.get_card(*card_id) {
                Ok(card) => submit_column(&store, &coalescer, card.column_id),
                Err(e) => error!(card_id = *card_id, error = %e, "card lookup failed for changed-card update"),
            }
        });
    }
    bus.subscribe(EventKind::CardDeleted, move |event| {
        let BoardEvent::CardDeleted { column_id } = event else {
            return;
        };
        submit_column(&store, &coalescer, *column_id);
    });
}

fn submit_column(store: &BoardStore, coalescer: &BroadcastCoalescer, column_id: ColumnId) {
    match store.get_column(column_id) {
        Ok(snapshot) => {
            coalescer.submit(render::column_dom_id(column_id), render::column_fragment(&snapshot));
        }
        Err(e) => error!(column_id, error = %e, "column lookup failed for out-of-band update"),
    }
}

#[cfg(test)]
#[path = "oob_test.rs"]
mod tests;
