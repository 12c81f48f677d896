//! SSE endpoint — long-lived update streams.
//!
//! LIFECYCLE
//! =========
//! 1. Attach a sink to the registry; receive a per-client handle.
//! 2. Forward each broadcast frame as a named `oob-batch` event.
//! 3. The stream ends when the client disconnects (response body dropped) or
//!    the registry detaches the sink after a failed write. Either way the
//!    drop guard detaches — detach is idempotent, so both paths may fire.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tracing::debug;
use uuid::Uuid;

use crate::services::stream::{StreamHandle, StreamRegistry};
use crate::state::AppState;

/// SSE event name carried by every batch frame.
pub const OOB_BATCH_EVENT: &str = "oob-batch";

/// `GET /sse` — attach and stream batches until disconnect.
pub async fn handle_sse(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let handle = state.streams.attach();
    Sse::new(frame_stream(handle, state.streams.clone())).keep_alive(KeepAlive::default())
}

struct DetachOnDrop {
    streams: Arc<StreamRegistry>,
    client_id: Uuid,
}

impl Drop for DetachOnDrop {
    fn drop(&mut self) {
        debug!(client_id = %self.client_id, "sse connection closed");
        self.streams.detach(self.client_id);
    }
}

/// Adapt a registry handle into the SSE event stream. Ends when the sink is
/// detached; detaches on drop.
fn frame_stream(handle: StreamHandle, streams: Arc<StreamRegistry>) -> impl Stream<Item = Result<Event, Infallible>> {
    let guard = DetachOnDrop { streams, client_id: handle.client_id };
    futures::stream::unfold((handle.rx, guard), |(mut rx, guard)| async move {
        let frame = rx.recv().await?;
        Some((Ok(Event::default().event(OOB_BATCH_EVENT).data(frame)), (rx, guard)))
    })
}

#[cfg(test)]
#[path = "sse_test.rs"]
mod tests;
