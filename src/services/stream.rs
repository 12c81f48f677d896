//! Stream registry — live SSE connections and frame fan-out.
//!
//! DESIGN
//! ======
//! Sinks are bounded mpsc senders keyed by client id. Broadcast never blocks:
//! a full or closed sink is detached so a broken or slow client cannot stall
//! delivery to the others. Detach is idempotent — the SSE handler detaches on
//! disconnect, and a failed write may already have detached the same client.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Handle returned by [`StreamRegistry::attach`]. Receives one serialized
/// frame per broadcast until the client is detached.
pub struct StreamHandle {
    pub client_id: Uuid,
    pub rx: mpsc::Receiver<String>,
}

pub struct StreamRegistry {
    capacity: usize,
    clients: RwLock<HashMap<Uuid, mpsc::Sender<String>>>,
}

impl StreamRegistry {
    /// `capacity` bounds each client's outgoing queue; a client that falls
    /// that many frames behind is treated as broken and detached.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { capacity, clients: RwLock::new(HashMap::new()) }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, mpsc::Sender<String>>> {
        self.clients.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, mpsc::Sender<String>>> {
        self.clients.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new client sink and return its receiving handle.
    #[must_use]
    pub fn attach(&self) -> StreamHandle {
        let client_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.capacity);
        let clients = {
            let mut clients = self.write();
            clients.insert(client_id, tx);
            clients.len()
        };
        info!(%client_id, clients, "stream client attached");
        StreamHandle { client_id, rx }
    }

    /// Remove a client sink. Safe to call more than once for the same id.
    pub fn detach(&self, client_id: Uuid) {
        let removed = {
            let mut clients = self.write();
            clients.remove(&client_id).map(|_| clients.len())
        };
        if let Some(clients) = removed {
            info!(%client_id, clients, "stream client detached");
        }
    }

    /// Write a frame to every attached sink. A write failure detaches only
    /// the failing sink.
    pub fn broadcast(&self, frame: &str) {
        let failed: Vec<Uuid> = {
            let clients = self.read();
            clients
                .iter()
                .filter_map(|(client_id, tx)| match tx.try_send(frame.to_owned()) {
                    Ok(()) => None,
                    Err(e) => {
                        warn!(%client_id, error = %e, "stream write failed; detaching client");
                        Some(*client_id)
                    }
                })
                .collect()
        };
        for client_id in failed {
            self.detach(client_id);
        }
    }

    #[must_use]
    pub fn client_count(&self) -> usize {
        self.read().len()
    }
}

#[cfg(test)]
#[path = "stream_test.rs"]
mod tests;
