use crate::{HueError, Result};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

type Entry = Arc<dyn Any + Send + Sync>;

/// Memoizes values by resource name for the lifetime of the cache.
///
/// There is no eviction and no invalidation: once a key holds a value, the factory for that
/// key is never invoked again. Each key is guarded by its own [`OnceCell`], so concurrent
/// callers racing on an empty key share a single factory invocation. A factory that fails
/// leaves the key empty.
#[derive(Default)]
pub struct Cache {
    entries: Mutex<HashMap<String, Arc<OnceCell<Entry>>>>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`, creating it with `factory` on a miss.
    ///
    /// Asking for a key with a different type than the one it was created with is an
    /// [`HueError::InvalidOperation`].
    pub async fn get_or_create<T, F, Fut>(&self, key: &str, factory: F) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        // the map lock is never held across an await
        let cell = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.to_string())
            .or_default()
            .clone();
        let entry = cell
            .get_or_try_init(|| async move {
                log::debug!("cache miss for {key}");
                factory().await.map(|value| Arc::new(value) as Entry)
            })
            .await?;
        entry.clone().downcast::<T>().map_err(|_| {
            HueError::invalid_operation(format!("cache entry {key} holds another type"))
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .is_some_and(|cell| cell.initialized())
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Cache")
            .field("keys", &entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn factory_runs_once() {
        let cache = Cache::new();
        let calls = &AtomicUsize::new(0);
        let factory = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![1, 2, 3])
        };
        let first = cache.get_or_create("lights", factory).await.unwrap();
        let second = cache
            .get_or_create("lights", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![4])
            })
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*second, vec![1, 2, 3]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.contains("lights"));
        assert!(!cache.contains("scenes"));
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let cache = Cache::new();
        let lights = cache.get_or_create("lights", || async { Ok(1u32) }).await.unwrap();
        let groups = cache.get_or_create("groups", || async { Ok(2u32) }).await.unwrap();
        assert_eq!((*lights, *groups), (1, 2));
    }

    #[tokio::test]
    async fn failed_factory_leaves_key_empty() {
        let cache = Cache::new();
        let err = cache
            .get_or_create::<u32, _, _>("scenes", || async {
                Err(HueError::protocol_err("boom"))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, HueError::ProtocolError { .. }));
        assert!(!cache.contains("scenes"));
        let value = cache.get_or_create("scenes", || async { Ok(7u32) }).await.unwrap();
        assert_eq!(*value, 7);
    }

    #[tokio::test]
    async fn type_mismatch_is_invalid_operation() {
        let cache = Cache::new();
        cache.get_or_create("hue", || async { Ok(1u32) }).await.unwrap();
        let err = cache
            .get_or_create("hue", || async { Ok(String::new()) })
            .await
            .unwrap_err();
        assert!(matches!(err, HueError::InvalidOperation { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_factory_call() {
        let cache = Arc::new(Cache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let calls = calls.clone();
                tokio::spawn(async move {
                    cache
                        .get_or_create("groups", || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::task::yield_now().await;
                            Ok(42u64)
                        })
                        .await
                        .map(|v| *v)
                })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
