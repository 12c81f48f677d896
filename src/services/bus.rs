//! Event bus — synchronous in-process publish/subscribe.
//!
//! DESIGN
//! ======
//! A `BoardEvent` sum type with an `EventKind` tag and a dispatch table keyed
//! by tag. Dispatch runs on the publishing caller's thread in registration
//! order, causally between the mutation and the HTTP response that triggered
//! it, so the acting client's own broadcast echo can never race ahead of or
//! behind its direct response.
//!
//! ERROR HANDLING
//! ==============
//! Dispatch is not wrapped in failure isolation. A panicking handler aborts
//! the remaining chain; a failing subscriber is a defect to fix, not a
//! runtime condition to recover from. Handlers must also stay non-blocking:
//! a slow handler stalls the whole publish call and the triggering request.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use crate::services::board::{CardId, ColumnId};

// =============================================================================
// EVENTS
// =============================================================================

/// Immutable record of a completed mutation. Created and published only after
/// the store has committed the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardEvent {
    CardMoved { card_id: CardId, from_column_id: ColumnId, to_column_id: ColumnId },
    CardChanged { card_id: CardId },
    CardDeleted { column_id: ColumnId },
}

/// Variant tag used to key subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CardMoved,
    CardChanged,
    CardDeleted,
}

impl BoardEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::CardMoved { .. } => EventKind::CardMoved,
            Self::CardChanged { .. } => EventKind::CardChanged,
            Self::CardDeleted { .. } => EventKind::CardDeleted,
        }
    }
}

// =============================================================================
// BUS
// =============================================================================

type Handler = Box<dyn Fn(&BoardEvent) + Send + Sync>;

#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<HashMap<EventKind, Vec<Handler>>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event variant. Handlers for a kind fire in
    /// registration order. There is no unsubscribe.
    pub fn subscribe(&self, kind: EventKind, handler: impl Fn(&BoardEvent) + Send + Sync + 'static) {
        let mut subscribers = self.subscribers.write().unwrap_or_else(PoisonError::into_inner);
        subscribers.entry(kind).or_default().push(Box::new(handler));
    }

    /// Dispatch synchronously, on the caller's thread, to every handler
    /// registered for the event's kind.
    pub fn publish(&self, event: &BoardEvent) {
        let subscribers = self.subscribers.read().unwrap_or_else(PoisonError::into_inner);
        let handlers = subscribers.get(&event.kind()).map_or(&[][..], Vec::as_slice);
        debug!(kind = ?event.kind(), handlers = handlers.len(), "dispatching board event");
        for handler in handlers {
            handler(event);
        }
    }
}

#[cfg(test)]
#[path = "bus_test.rs"]
mod tests;
