//! Core services behind the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! `board` owns state and ordering, `bus` links mutations to their
//! re-renders, `coalesce` windows re-renders into batches, and `stream` fans
//! batches out to attached clients. Calls flow strictly in that direction —
//! nothing here calls back into the store.

pub mod board;
pub mod bus;
pub mod coalesce;
pub mod stream;
