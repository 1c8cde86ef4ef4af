//! Per-session turn serialization.
//!
//! Only one turn runs per session at a time; a second message for the same
//! session waits until the first turn has committed.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Each session key maps to a `Semaphore(1)`. Holding the permit gives
/// exclusive access to that session's conversation.
#[derive(Default)]
pub struct SessionLockMap {
    locks: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl SessionLockMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the run lock of `session_key`. The permit releases on drop.
    pub async fn acquire(&self, session_key: &str) -> Result<OwnedSemaphorePermit, SessionBusy> {
        let sem = {
            let mut locks = self.locks.lock();
            locks
                .entry(session_key.to_owned())
                .or_insert_with(|| Arc::new(Semaphore::new(1)))
                .clone()
        };

        sem.acquire_owned().await.map_err(|_| SessionBusy)
    }

    /// Number of tracked sessions.
    pub fn session_count(&self) -> usize {
        self.locks.lock().len()
    }

    /// Forget sessions nobody holds or waits on.
    ///
    /// Holders and waiters keep a clone of the semaphore, so an entry whose
    /// only reference is the map itself is idle.
    pub fn prune_idle(&self) -> usize {
        let mut locks = self.locks.lock();
        let before = locks.len();
        locks.retain(|_, sem| Arc::strong_count(sem) > 1);
        before - locks.len()
    }
}

/// The session's lock was shut down while waiting for it.
#[derive(Debug)]
pub struct SessionBusy;

impl std::fmt::Display for SessionBusy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session is busy, could not acquire its turn lock")
    }
}

impl std::error::Error for SessionBusy {}
