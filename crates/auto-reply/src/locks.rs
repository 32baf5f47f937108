use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use {
    dashmap::DashMap,
    tokio::sync::{Mutex, OwnedMutexGuard},
};

const CLEANUP_EVERY_ACQUISITIONS: u64 = 256;

/// Serializes message handling per sender.
///
/// Two texts from the same number must not both read the page cursor before
/// either writes it back. Different senders never contend.
#[derive(Clone, Default)]
pub struct SenderLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    acquisitions: Arc<AtomicU64>,
}

/// Held for one message, until its activity write is stored.
pub struct SenderGuard {
    _guard: OwnedMutexGuard<()>,
}

impl SenderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `sender`.
    pub async fn lock(&self, sender: &str) -> SenderGuard {
        let seen = self.acquisitions.fetch_add(1, Ordering::Relaxed) + 1;
        if seen.is_multiple_of(CLEANUP_EVERY_ACQUISITIONS) {
            self.prune();
        }

        let mutex = self.locks.entry(sender.to_string()).or_default().clone();
        SenderGuard {
            _guard: mutex.lock_owned().await,
        }
    }

    /// Drop entries nobody holds or waits on.
    pub fn prune(&self) {
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
