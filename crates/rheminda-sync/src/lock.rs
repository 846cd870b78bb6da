use std::sync::Arc;

use dashmap::DashMap;
use rheminda_core::ReminderId;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockTable = DashMap<ReminderId, Arc<Mutex<()>>>;

/// One async mutex per reminder id, created on demand.
///
/// Handling for a single id is sequential; different ids never wait on each
/// other. An id's entry is forgotten as soon as nobody holds or waits on it,
/// including when the holding future is dropped mid-call.
#[derive(Default)]
pub struct KeyedLocks {
    locks: Arc<LockTable>,
}

/// Exclusive hold on one reminder id. Released on drop.
pub struct KeyGuard {
    // `None` only until the mutex is acquired.
    inner: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockTable>,
    id: ReminderId,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, id: &ReminderId) -> KeyGuard {
        // Clone the Arc out so the shard lock is not held across the await.
        let mutex = self
            .locks
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        // Built before the await so a cancelled wait still prunes the entry.
        let mut guard = KeyGuard {
            inner: None,
            locks: self.locks.clone(),
            id: id.clone(),
        };
        guard.inner = Some(mutex.lock_owned().await);
        guard
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl KeyGuard {
    pub fn id(&self) -> &ReminderId {
        &self.id
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.inner.take());
        self.locks.remove_if(&self.id, |_, m| Arc::strong_count(m) == 1);
    }
}
