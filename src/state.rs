//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. The
//! four core components are constructed exactly once at process start and
//! passed by reference everywhere — there is no global mutable registry.
//! Construction also wires the out-of-band re-render subscribers, so a state
//! value is always a complete mutation → broadcast pipeline.

use std::sync::Arc;
use std::time::Duration;

use crate::oob;
use crate::services::board::BoardStore;
use crate::services::bus::EventBus;
use crate::services::coalesce::BroadcastCoalescer;
use crate::services::stream::StreamRegistry;

/// Shared application state. Clone is required by Axum — all fields are
/// Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<BoardStore>,
    pub bus: Arc<EventBus>,
    pub coalescer: Arc<BroadcastCoalescer>,
    pub streams: Arc<StreamRegistry>,
}

impl AppState {
    /// Build a fully wired pipeline. Must run inside a tokio runtime — the
    /// coalescer spawns its task here.
    #[must_use]
    pub fn new(store: BoardStore, coalesce_window: Duration, stream_queue_capacity: usize) -> Self {
        let store = Arc::new(store);
        let bus = Arc::new(EventBus::new());
        let streams = Arc::new(StreamRegistry::new(stream_queue_capacity));
        let coalescer = Arc::new(BroadcastCoalescer::spawn(streams.clone(), coalesce_window));
        oob::subscribe_column_updates(&bus, store.clone(), coalescer.clone());
        Self { store, bus, coalescer, streams }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use crate::services::board::Column;

    /// Fully wired state over the standard three test columns (ids 1..=3,
    /// orders 0..=2), empty of cards.
    #[must_use]
    pub fn test_app_state() -> AppState {
        let store = BoardStore::new([
            Column { id: 1, title: "To Do".into(), order: 0 },
            Column { id: 2, title: "Doing".into(), order: 1 },
            Column { id: 3, title: "Done".into(), order: 2 },
        ]);
        AppState::new(store, Duration::from_millis(50), 8)
    }
}
