//! Environment configuration.
//!
//! Tunables are read once at startup; every knob has a default that favors
//! local development.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_COALESCE_WINDOW_MS: u64 = 50;
const DEFAULT_STREAM_QUEUE_CAPACITY: usize = 64;
const DEFAULT_STATIC_DIR: &str = "static";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Debounce delay after the most recent fragment submission before a
    /// batch is flushed.
    pub coalesce_window: Duration,
    /// Bound on each SSE client's outgoing frame queue.
    pub stream_queue_capacity: usize,
    pub static_dir: PathBuf,
}

impl ServerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            port: env_parse("PORT", DEFAULT_PORT),
            coalesce_window: Duration::from_millis(env_parse("COALESCE_WINDOW_MS", DEFAULT_COALESCE_WINDOW_MS)),
            stream_queue_capacity: env_parse("STREAM_QUEUE_CAPACITY", DEFAULT_STREAM_QUEUE_CAPACITY),
            static_dir: std::env::var("STATIC_DIR").map_or_else(|_| PathBuf::from(DEFAULT_STATIC_DIR), PathBuf::from),
        }
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_falls_back_on_missing_key() {
        assert_eq!(env_parse("MESHBOARD_TEST_UNSET_KEY", 42_u64), 42);
    }

    #[test]
    fn defaults_are_sane() {
        let cfg = ServerConfig::from_env();
        assert!(cfg.coalesce_window >= Duration::from_millis(1));
        assert!(cfg.stream_queue_capacity > 0);
    }
}
