//! Single-flight guard so only one sync runs per account at a time.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, RwLock, Semaphore};

type AccountKey = (String, String);

/// One-permit semaphore per `(account_id, host)`.
#[derive(Debug, Default)]
pub struct AccountLocks {
    semaphores: RwLock<HashMap<AccountKey, Arc<Semaphore>>>,
}

impl AccountLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the account without waiting.
    ///
    /// Returns `None` if another sync for the same account holds it.
    pub async fn try_acquire(&self, account_id: &str, host: &str) -> Option<AccountPermit> {
        let key = (account_id.to_string(), host.to_string());
        let semaphore = self.get_or_create_semaphore(key).await;
        semaphore
            .try_acquire_owned()
            .ok()
            .map(|permit| AccountPermit { _permit: permit })
    }

    async fn get_or_create_semaphore(&self, key: AccountKey) -> Arc<Semaphore> {
        {
            let read_guard = self.semaphores.read().await;
            if let Some(sem) = read_guard.get(&key) {
                return Arc::clone(sem);
            }
        }

        let mut write_guard = self.semaphores.write().await;
        // Another task may have inserted it between the two locks
        if let Some(sem) = write_guard.get(&key) {
            return Arc::clone(sem);
        }

        let semaphore = Arc::new(Semaphore::new(1));
        write_guard.insert(key, Arc::clone(&semaphore));
        semaphore
    }

    /// Number of accounts that have been synced at least once.
    pub async fn account_count(&self) -> usize {
        self.semaphores.read().await.len()
    }
}

/// Held for the duration of one sync; released on drop.
#[derive(Debug)]
pub struct AccountPermit {
    _permit: OwnedSemaphorePermit,
}
