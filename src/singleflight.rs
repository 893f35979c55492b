//! Coalesces concurrent upstream fetches for the same fingerprint.
//!
//! One caller becomes the *owner* and drives the fetch; the rest become
//! *followers* and wait for the owner to finish, then re-check the cache
//! and fall through to their own fetch if the owner's attempt failed. This
//! only deduplicates cache population, never response delivery — each
//! connection's body is written by exactly one task.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Notify;

pub struct SingleFlight {
    inflight: DashMap<String, Arc<Notify>>,
}

/// Held by the owner for the duration of its fetch. Dropping it (on any
/// path, including panics unwound through it) releases the slot and wakes
/// any followers.
pub struct OwnerGuard<'a> {
    registry: &'a SingleFlight,
    fingerprint: String,
    notify: Arc<Notify>,
}

impl Drop for OwnerGuard<'_> {
    fn drop(&mut self) {
        self.registry.inflight.remove(&self.fingerprint);
        self.notify.notify_waiters();
    }
}

impl SingleFlight {
    pub fn new() -> Self {
        Self {
            inflight: DashMap::new(),
        }
    }

    /// Attempts to become the fetch owner for `fingerprint`. Returns `None`
    /// if another caller already owns it.
    pub fn try_acquire(&self, fingerprint: &str) -> Option<OwnerGuard<'_>> {
        match self.inflight.entry(fingerprint.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => None,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let notify = Arc::new(Notify::new());
                slot.insert(notify.clone());
                Some(OwnerGuard {
                    registry: self,
                    fingerprint: fingerprint.to_string(),
                    notify,
                })
            }
        }
    }

    /// Waits for the current owner of `fingerprint` (if any) to finish.
    /// Returns immediately if nobody currently owns it.
    pub async fn wait(&self, fingerprint: &str) {
        let notify = match self.inflight.get(fingerprint) {
            Some(entry) => entry.value().clone(),
            None => return,
        };

        let notified = notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if !self.inflight.contains_key(fingerprint) {
            return;
        }

        notified.await;
    }
}

impl Default for SingleFlight {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn second_acquire_fails_while_owner_holds_slot() {
        let sf = SingleFlight::new();
        let guard = sf.try_acquire("fp").unwrap();
        assert!(sf.try_acquire("fp").is_none());
        drop(guard);
        assert!(sf.try_acquire("fp").is_some());
    }

    #[tokio::test]
    async fn followers_wake_when_owner_drops() {
        let sf = Arc::new(SingleFlight::new());
        let guard = sf.try_acquire("fp").unwrap();
        let woken = Arc::new(AtomicUsize::new(0));

        let mut followers = Vec::new();
        for _ in 0..4 {
            let sf = sf.clone();
            let woken = woken.clone();
            followers.push(tokio::spawn(async move {
                sf.wait("fp").await;
                woken.fetch_add(1, Ordering::SeqCst);
            }));
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(woken.load(Ordering::SeqCst), 0);

        drop(guard);

        for f in followers {
            f.await.unwrap();
        }
        assert_eq!(woken.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn wait_on_idle_key_returns_immediately() {
        let sf = SingleFlight::new();
        sf.wait("nobody-owns-this").await;
    }
}
