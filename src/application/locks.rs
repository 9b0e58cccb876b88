use crate::domain::account::AccountId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Registry = Arc<Mutex<HashMap<AccountId, Arc<AsyncMutex<()>>>>>;

/// Per-account locks shared by everything that mutates balances.
///
/// Locks are always taken in ascending id order so two operations touching the
/// same pair of accounts cannot deadlock. The registry only holds accounts
/// with an operation in flight or waiting: an entry is removed when its last
/// guard is dropped.
#[derive(Clone, Default)]
pub struct AccountLocks {
    locks: Registry,
}

/// Holds the locks of a set of accounts until dropped.
pub struct AccountGuard {
    guards: Vec<OwnedMutexGuard<()>>,
    ids: Vec<AccountId>,
    locks: Registry,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, ids: &[AccountId]) -> AccountGuard {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mutexes: Vec<Arc<AsyncMutex<()>>> = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            ids.iter()
                .map(|id| locks.entry(*id).or_default().clone())
                .collect()
        };

        let mut guards = Vec::with_capacity(mutexes.len());
        for mutex in mutexes {
            guards.push(mutex.lock_owned().await);
        }
        AccountGuard {
            guards,
            ids,
            locks: self.locks.clone(),
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl Drop for AccountGuard {
    fn drop(&mut self) {
        // Unlock first: an idle mutex is then referenced by the registry only.
        self.guards.clear();

        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for id in &self.ids {
            if locks
                .get(id)
                .is_some_and(|mutex| Arc::strong_count(mutex) == 1)
            {
                locks.remove(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_account_is_serialized() {
        let locks = AccountLocks::new();
        let guard = locks.acquire(&[2, 1]).await;

        let other = locks.clone();
        let waiter = tokio::spawn(async move {
            let _guard = other.acquire(&[1]).await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_disjoint_accounts_do_not_block() {
        let locks = AccountLocks::new();
        let _first = locks.acquire(&[1, 2]).await;
        let _second = locks.acquire(&[3, 4]).await;
        assert_eq!(locks.tracked(), 4);
    }

    #[tokio::test]
    async fn test_duplicate_ids_lock_once() {
        let locks = AccountLocks::new();
        let _guard = locks.acquire(&[5, 5]).await;
        assert_eq!(locks.tracked(), 1);
    }

    #[tokio::test]
    async fn test_idle_accounts_are_released() {
        let locks = AccountLocks::new();
        for id in 0..100 {
            let _guard = locks.acquire(&[id, id + 1]).await;
        }
        assert_eq!(locks.tracked(), 0);

        let guard = locks.acquire(&[1, 2]).await;
        let other = locks.clone();
        let waiter = tokio::spawn(async move {
            let _guard = other.acquire(&[2]).await;
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        drop(guard);
        waiter.await.unwrap();
        assert_eq!(locks.tracked(), 0);
    }
}
