//! Per-key async mutual exclusion.
//!
//! One `tokio::sync::Mutex` per key, created on demand and dropped from the
//! registry once the last holder or waiter goes away. Different keys never
//! contend with each other.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::OwnedMutexGuard;

type LockMap<K> = HashMap<K, Arc<tokio::sync::Mutex<()>>>;
type Registry<K> = Arc<Mutex<LockMap<K>>>;

fn registry<K>(registry: &Mutex<LockMap<K>>) -> MutexGuard<'_, LockMap<K>> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug)]
pub struct KeyedLock<K> {
    locks: Registry<K>,
}

impl<K> Default for KeyedLock<K> {
    fn default() -> Self {
        Self {
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K> Clone for KeyedLock<K> {
    fn clone(&self) -> Self {
        Self {
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<K> KeyedLock<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`.
    ///
    /// Waiters on the same key are served in FIFO order (tokio's mutex is
    /// fair), which is what keeps appends ordered by arrival.
    pub async fn lock(&self, key: &K) -> KeyedGuard<K> {
        let mutex = {
            let mut locks = registry(&self.locks);
            Arc::clone(locks.entry(key.clone()).or_default())
        };

        let guard = mutex.clone().lock_owned().await;
        KeyedGuard {
            key: key.clone(),
            mutex,
            registry: Arc::clone(&self.locks),
            _guard: Some(guard),
        }
    }

    /// Number of keys with a live holder or waiter.
    pub fn active_keys(&self) -> usize {
        registry(&self.locks).len()
    }
}

/// Exclusive access to one key; released on drop.
pub struct KeyedGuard<K: Eq + Hash> {
    key: K,
    mutex: Arc<tokio::sync::Mutex<()>>,
    registry: Registry<K>,
    _guard: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash> Drop for KeyedGuard<K> {
    fn drop(&mut self) {
        self._guard.take();
        let mut locks = registry(&self.registry);
        // Two references left: the registry's and ours. Nobody else waits.
        if Arc::strong_count(&self.mutex) == 2 {
            locks.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let lock = KeyedLock::<String>::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let lock = lock.clone();
                let inside = inside.clone();
                let max_inside = max_inside.clone();
                tokio::spawn(async move {
                    let _guard = lock.lock(&"conv".to_string()).await;
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        futures::future::join_all(tasks).await;

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let lock = KeyedLock::<u32>::new();
        let _a = lock.lock(&1).await;
        let b = tokio::time::timeout(Duration::from_millis(100), lock.lock(&2)).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn idle_entries_are_dropped() {
        let lock = KeyedLock::<u32>::new();
        {
            let _guard = lock.lock(&7).await;
            assert_eq!(lock.active_keys(), 1);
        }
        assert_eq!(lock.active_keys(), 0);
    }

    #[tokio::test]
    async fn entry_survives_while_someone_waits() {
        let lock = KeyedLock::<u32>::new();
        let first = lock.lock(&1).await;

        let waiter = {
            let lock = lock.clone();
            tokio::spawn(async move {
                let _guard = lock.lock(&1).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(first);
        assert!(lock.active_keys() <= 1);
        waiter.await.unwrap();
        assert_eq!(lock.active_keys(), 0);
    }
}
