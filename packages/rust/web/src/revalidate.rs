//! Time-based regeneration of generated views (stale-while-revalidate).
//!
//! A value younger than the interval is served as is. An older value is still
//! served, while one background task per key regenerates it. A failed
//! regeneration keeps the stale value, except `NotFound`, which evicts it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use spacetraveling_shared::Result;

struct Entry<T> {
    value: T,
    generated_at: Instant,
    refreshing: bool,
}

enum Lookup<T> {
    Fresh(T),
    Stale { value: T, refresh: bool },
    Missing,
}

/// Keyed cache of generated values with a fixed revalidation interval.
pub struct Revalidating<T> {
    interval: Duration,
    entries: Mutex<HashMap<String, Entry<T>>>,
}

impl<T> Revalidating<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Return the value for `key`, generating or regenerating it as needed.
    ///
    /// Only a missing value makes the caller wait for `generate`.
    pub async fn get_or_generate<F, Fut>(self: &Arc<Self>, key: &str, generate: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        match self.lookup(key) {
            Lookup::Fresh(value) => Ok(value),
            Lookup::Stale { value, refresh } => {
                if refresh {
                    debug!(key, "serving stale value, regenerating in background");
                    let cache = Arc::clone(self);
                    let key = key.to_string();
                    let pending = generate();
                    tokio::spawn(async move {
                        let result = pending.await;
                        cache.finish_refresh(&key, result);
                    });
                }
                Ok(value)
            }
            Lookup::Missing => {
                debug!(key, "generating value");
                let value = generate().await?;
                self.store(key, value.clone());
                Ok(value)
            }
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lookup(&self, key: &str) -> Lookup<T> {
        let mut entries = self.lock();
        match entries.get_mut(key) {
            Some(entry) if entry.generated_at.elapsed() < self.interval => {
                Lookup::Fresh(entry.value.clone())
            }
            Some(entry) => {
                let refresh = !entry.refreshing;
                entry.refreshing = true;
                Lookup::Stale {
                    value: entry.value.clone(),
                    refresh,
                }
            }
            None => Lookup::Missing,
        }
    }

    fn store(&self, key: &str, value: T) {
        self.lock().insert(
            key.to_string(),
            Entry {
                value,
                generated_at: Instant::now(),
                refreshing: false,
            },
        );
    }

    fn finish_refresh(&self, key: &str, result: Result<T>) {
        match result {
            Ok(value) => {
                debug!(key, "regenerated");
                self.store(key, value);
            }
            Err(e) if e.is_not_found() => {
                debug!(key, "source gone, evicting");
                self.lock().remove(key);
            }
            Err(e) => {
                warn!(key, error = %e, "regeneration failed, keeping stale value");
                if let Some(entry) = self.lock().get_mut(key) {
                    entry.refreshing = false;
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use spacetraveling_shared::SpacetravelingError;

    const HOUR: Duration = Duration::from_secs(3600);

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    /// Generator yielding the call number.
    fn numbered(calls: &Arc<AtomicUsize>) -> impl FnOnce() -> std::future::Ready<Result<usize>> {
        let calls = Arc::clone(calls);
        move || std::future::ready(Ok(calls.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_value_served_without_regenerating() {
        let cache = Arc::new(Revalidating::new(HOUR));
        let calls = counter();

        assert_eq!(cache.get_or_generate("listing", numbered(&calls)).await.unwrap(), 1);
        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(cache.get_or_generate("listing", numbered(&calls)).await.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_value_served_while_regenerating() {
        let cache = Arc::new(Revalidating::new(HOUR));
        let calls = counter();

        cache.get_or_generate("listing", numbered(&calls)).await.unwrap();
        tokio::time::advance(HOUR + Duration::from_secs(1)).await;

        // Stale value comes back immediately; a second stale hit starts nothing new.
        assert_eq!(cache.get_or_generate("listing", numbered(&calls)).await.unwrap(), 1);
        assert_eq!(cache.get_or_generate("listing", numbered(&calls)).await.unwrap(), 1);
        settle().await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.get_or_generate("listing", numbered(&calls)).await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_regeneration_keeps_stale_value() {
        let cache = Arc::new(Revalidating::new(HOUR));
        cache
            .get_or_generate("listing", || async { Ok(7usize) })
            .await
            .unwrap();
        tokio::time::advance(HOUR).await;

        let value = cache
            .get_or_generate("listing", || async {
                Err(SpacetravelingError::Repository("store down".into()))
            })
            .await
            .unwrap();
        assert_eq!(value, 7);
        settle().await;

        // Still stale and eligible for another attempt.
        let calls = counter();
        assert_eq!(cache.get_or_generate("listing", numbered(&calls)).await.unwrap(), 7);
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_on_regeneration_evicts() {
        let cache = Arc::new(Revalidating::new(HOUR));
        cache
            .get_or_generate("post:gone", || async { Ok(1usize) })
            .await
            .unwrap();
        tokio::time::advance(HOUR).await;

        cache
            .get_or_generate("post:gone", || async {
                Err(SpacetravelingError::not_found("posts", "gone"))
            })
            .await
            .unwrap();
        settle().await;

        let err = cache
            .get_or_generate("post:gone", || async {
                Err(SpacetravelingError::not_found("posts", "gone"))
            })
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn missing_value_errors_are_not_cached() {
        let cache: Arc<Revalidating<usize>> = Arc::new(Revalidating::new(HOUR));
        let err = cache
            .get_or_generate("listing", || async {
                Err(SpacetravelingError::Repository("store down".into()))
            })
            .await
            .unwrap_err();
        assert!(err.is_repository_error());

        let calls = counter();
        assert_eq!(cache.get_or_generate("listing", numbered(&calls)).await.unwrap(), 1);
    }
}
