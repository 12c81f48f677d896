//! Broadcast coalescer — debounced batching of out-of-band fragments.
//!
//! DESIGN
//! ======
//! A single mutation can recompute several fragments (a cross-column move
//! touches both columns), and rapid repeated edits to one fragment would
//! otherwise push stale intermediate states. Submissions are therefore
//! windowed: the debounce delay rearms on every submit, and at expiry the
//! whole pending set flushes as one batch. Dedup is last-write-wins per
//! fragment id; a fragment keeps the position of its first submission.
//!
//! One coalescing task owns the pending list and the delay, consuming
//! submissions from a channel. The timer and the map share an owner, so
//! there is no rearm/fire race on a shared timer handle, and `submit` never
//! blocks the mutating request's thread.

use std::mem;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::services::stream::StreamRegistry;

// =============================================================================
// TYPES
// =============================================================================

/// One rendered fragment keyed by its stable element id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchedUpdate {
    pub id: String,
    pub html: String,
}

/// Wire frame: all fragments coalesced within one debounce window.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBatch {
    pub batch_id: String,
    pub updates: Vec<BatchedUpdate>,
}

pub struct BroadcastCoalescer {
    tx: mpsc::UnboundedSender<BatchedUpdate>,
}

// =============================================================================
// SUBMIT
// =============================================================================

impl BroadcastCoalescer {
    /// Spawn the coalescing task. Flushed batches are handed to
    /// `streams.broadcast`.
    #[must_use]
    pub fn spawn(streams: Arc<StreamRegistry>, window: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(rx, streams, window));
        Self { tx }
    }

    /// Queue a rendered fragment for the next batch, replacing any pending
    /// fragment with the same id. Rearms the debounce window. The id must be
    /// the fragment's stable element id — a submission without one cannot be
    /// applied by any viewer and is dropped loudly rather than silently.
    pub fn submit(&self, id: impl Into<String>, html: impl Into<String>) {
        let id = id.into();
        if id.is_empty() {
            error!("fragment submitted without an identifier; dropping it (viewers will miss this update)");
            return;
        }
        debug!(fragment = %id, "queueing out-of-band update");
        if self.tx.send(BatchedUpdate { id, html: html.into() }).is_err() {
            warn!("coalescer task is gone; dropping fragment");
        }
    }
}

// =============================================================================
// COALESCING TASK
// =============================================================================

async fn run(mut rx: mpsc::UnboundedReceiver<BatchedUpdate>, streams: Arc<StreamRegistry>, window: Duration) {
    let mut pending: Vec<BatchedUpdate> = Vec::new();
    loop {
        if pending.is_empty() {
            // Nothing buffered: no timer runs, just wait for work.
            match rx.recv().await {
                Some(update) => upsert(&mut pending, update),
                None => break,
            }
        } else {
            // The window is measured from the most recent submission.
            match tokio::time::timeout(window, rx.recv()).await {
                Ok(Some(update)) => upsert(&mut pending, update),
                Ok(None) => {
                    flush(&mut pending, &streams);
                    break;
                }
                Err(_elapsed) => flush(&mut pending, &streams),
            }
        }
    }
    debug!("coalescer task exiting");
}

fn upsert(pending: &mut Vec<BatchedUpdate>, update: BatchedUpdate) {
    if let Some(existing) = pending.iter_mut().find(|u| u.id == update.id) {
        *existing = update;
    } else {
        pending.push(update);
    }
}

fn flush(pending: &mut Vec<BatchedUpdate>, streams: &StreamRegistry) {
    if pending.is_empty() {
        return;
    }
    let batch = UpdateBatch { batch_id: Uuid::new_v4().to_string(), updates: mem::take(pending) };
    let frame = match serde_json::to_string(&batch) {
        Ok(frame) => frame,
        Err(e) => {
            error!(error = %e, "failed to serialize update batch");
            return;
        }
    };
    info!(batch_id = %batch.batch_id, updates = batch.updates.len(), "broadcasting update batch");
    streams.broadcast(&frame);
}

#[cfg(test)]
#[path = "coalesce_test.rs"]
mod tests;
