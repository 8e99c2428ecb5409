//! Download exclusion according to the configured [`LockScope`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::types::LockScope;

/// Hands out the guard held for the whole body of one download.
#[derive(Debug)]
pub(crate) struct DownloadLocks {
    scope: LockScope,
    global: Arc<AsyncMutex<()>>,
    // Entries are never removed; the table grows with distinct keys seen.
    per_key: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl DownloadLocks {
    pub(crate) fn new(scope: LockScope) -> Self {
        Self {
            scope,
            global: Arc::new(AsyncMutex::new(())),
            per_key: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn scope(&self) -> LockScope {
        self.scope
    }

    /// Wait for exclusive access for `relative_path`.
    pub(crate) async fn acquire(&self, relative_path: &str) -> OwnedMutexGuard<()> {
        let mutex = match self.scope {
            LockScope::Global => Arc::clone(&self.global),
            LockScope::PerKey => {
                let mut table = self
                    .per_key
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                Arc::clone(
                    table
                        .entry(relative_path.to_string())
                        .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
                )
            }
        };
        mutex.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn test_global_scope_serializes_distinct_keys() {
        let locks = DownloadLocks::new(LockScope::Global);
        let _held = locks.acquire("a.pdb/A1/a.pdb").await;

        let other = tokio::time::timeout(WAIT, locks.acquire("b.pdb/B1/b.pdb"));
        assert!(other.await.is_err(), "distinct key must wait under global scope");
    }

    #[tokio::test]
    async fn test_per_key_scope_allows_distinct_keys() {
        let locks = DownloadLocks::new(LockScope::PerKey);
        let _held = locks.acquire("a.pdb/A1/a.pdb").await;

        let other = tokio::time::timeout(WAIT, locks.acquire("b.pdb/B1/b.pdb"));
        assert!(other.await.is_ok());

        let same = tokio::time::timeout(WAIT, locks.acquire("a.pdb/A1/a.pdb"));
        assert!(same.await.is_err(), "same key must still wait");
    }
}
