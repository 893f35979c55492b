//! Process-wide node state, shared explicitly via `Arc` rather than as a
//! hidden global.
//!
//! Fields updated together (the origin URL and the TLS rotation token) live
//! behind a single [`ArcSwap`] so readers never observe a torn update; fields
//! updated independently and very frequently (`last_request_at`) use a plain
//! atomic.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

/// The part of node state that is replaced wholesale on every heartbeat.
#[derive(Debug, Clone)]
pub struct OriginSnapshot {
    pub origin_url: String,
    pub tls_created_at: Option<String>,
}

/// Explicitly-constructed, explicitly-shared node state.
///
/// One instance is built at startup and handed by `Arc` to every component
/// that needs it: the dispatcher reads `origin` and stamps `last_request_at`;
/// the control-plane client writes `origin`; the lifecycle supervisor reads
/// and clears `running`.
pub struct NodeState {
    origin: ArcSwap<OriginSnapshot>,
    last_request_at_unix_ms: AtomicI64,
    running: AtomicBool,
}

impl NodeState {
    pub fn new(initial_origin_url: String, now_unix_ms: i64) -> Arc<Self> {
        Arc::new(Self {
            origin: ArcSwap::from_pointee(OriginSnapshot {
                origin_url: initial_origin_url,
                tls_created_at: None,
            }),
            last_request_at_unix_ms: AtomicI64::new(now_unix_ms),
            running: AtomicBool::new(true),
        })
    }

    pub fn origin(&self) -> Arc<OriginSnapshot> {
        self.origin.load_full()
    }

    pub fn set_origin(&self, snapshot: OriginSnapshot) {
        self.origin.store(Arc::new(snapshot));
    }

    pub fn touch_last_request(&self, now_unix_ms: i64) {
        self.last_request_at_unix_ms
            .store(now_unix_ms, Ordering::Relaxed);
    }

    pub fn last_request_at_unix_ms(&self) -> i64 {
        self.last_request_at_unix_ms.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Monotonic within a process lifetime: once cleared, never set again.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_is_monotonic() {
        let state = NodeState::new("https://s2.mangadex.org".to_string(), 0);
        assert!(state.is_running());
        state.stop();
        assert!(!state.is_running());
        state.stop();
        assert!(!state.is_running());
    }

    #[test]
    fn origin_swap_is_atomic_snapshot() {
        let state = NodeState::new("https://s2.mangadex.org".to_string(), 0);
        state.set_origin(OriginSnapshot {
            origin_url: "https://s3.mangadex.org".to_string(),
            tls_created_at: Some("abc".to_string()),
        });
        let snap = state.origin();
        assert_eq!(snap.origin_url, "https://s3.mangadex.org");
        assert_eq!(snap.tls_created_at.as_deref(), Some("abc"));
    }
}
