use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-listing async locks.
///
/// Feed replacement and block rewrites for one listing take its lock so that
/// concurrent edits and refreshes cannot interleave their writes.
#[derive(Clone, Default)]
pub struct ListingLocks {
    locks: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl ListingLocks {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for and takes the lock of `listing_id`; released when the guard drops
    pub async fn lock(&self, listing_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Entries only referenced by the map are idle
            locks.retain(|id, lock| *id == listing_id || Arc::strong_count(lock) > 1);
            locks.entry(listing_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}
