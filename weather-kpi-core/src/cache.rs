//! Read-time TTL cache for normalized provider results.

use std::{collections::HashMap, fmt::Debug, hash::Hash, time::Duration};

use tokio::{sync::Mutex, time::Instant};

use crate::model::{Coordinate, ResourceKind};

/// Default time-to-live for cached provider results.
pub const DEFAULT_TTL: Duration = Duration::from_secs(1800);

/// Cache key: current and forecast lines for a coordinate expire independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub coordinate: Coordinate,
    pub kind: ResourceKind,
}

impl CacheKey {
    pub fn new(coordinate: Coordinate, kind: ResourceKind) -> Self {
        Self { coordinate, kind }
    }
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    computed_at: Instant,
}

/// Memoizes successful computations per key for a fixed window.
///
/// Failures are never stored, and a failed recompute leaves the previous
/// entry in place. Entries are only checked for expiry when read.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached value for `key` if it is younger than the TTL,
    /// otherwise run `compute` and cache its result on success.
    pub async fn get_or_compute<F, Fut, E>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        {
            let entries = self.entries.lock().await;
            if let Some(entry) = entries.get(&key) {
                if entry.computed_at.elapsed() < self.ttl {
                    tracing::debug!(?key, "cache hit");
                    return Ok(entry.value.clone());
                }
                tracing::debug!(?key, "cache entry expired");
            } else {
                tracing::debug!(?key, "cache miss");
            }
        }

        // Computed outside the lock; concurrent misses on one key may both
        // compute, and the last successful writer wins.
        let value = compute().await?;

        let mut entries = self.entries.lock().await;
        entries.insert(
            key,
            CacheEntry {
                value: value.clone(),
                computed_at: Instant::now(),
            },
        );

        Ok(value)
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    fn key(lat: f64) -> CacheKey {
        CacheKey::new(Coordinate::new(lat, 10.0).unwrap(), ResourceKind::Current)
    }

    async fn counted(calls: &AtomicUsize, value: u32) -> Result<u32, String> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }

    async fn failing(calls: &AtomicUsize) -> Result<u32, String> {
        calls.fetch_add(1, Ordering::SeqCst);
        Err("upstream down".to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn second_call_within_ttl_is_served_from_cache() {
        let cache: TtlCache<CacheKey, u32> = TtlCache::default();
        let calls = AtomicUsize::new(0);
        assert_eq!(cache.ttl(), Duration::from_secs(1800));

        let first = cache.get_or_compute(key(1.0), || counted(&calls, 7)).await;
        tokio::time::advance(Duration::from_secs(1799)).await;
        let second = cache.get_or_compute(key(1.0), || counted(&calls, 8)).await;

        assert_eq!(first, Ok(7));
        assert_eq!(second, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_recomputed() {
        let cache: TtlCache<CacheKey, u32> = TtlCache::new(Duration::from_secs(1800));
        let calls = AtomicUsize::new(0);

        cache.get_or_compute(key(1.0), || counted(&calls, 7)).await.unwrap();
        tokio::time::advance(Duration::from_secs(1800)).await;
        let again = cache.get_or_compute(key(1.0), || counted(&calls, 8)).await;

        assert_eq!(again, Ok(8));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn kinds_and_coordinates_are_separate_lines() {
        let cache: TtlCache<CacheKey, u32> = TtlCache::default();
        let calls = AtomicUsize::new(0);
        let coord = Coordinate::new(1.0, 10.0).unwrap();

        let current = CacheKey::new(coord, ResourceKind::Current);
        let forecast = CacheKey::new(coord, ResourceKind::Forecast);

        assert_eq!(cache.get_or_compute(current, || counted(&calls, 1)).await, Ok(1));
        assert_eq!(cache.get_or_compute(forecast, || counted(&calls, 2)).await, Ok(2));
        assert_eq!(cache.get_or_compute(key(2.0), || counted(&calls, 3)).await, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(cache.len().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_not_cached() {
        let cache: TtlCache<CacheKey, u32> = TtlCache::default();
        let calls = AtomicUsize::new(0);

        let err = cache.get_or_compute(key(1.0), || failing(&calls)).await;
        assert_eq!(err, Err("upstream down".to_string()));
        assert!(cache.is_empty().await);

        let ok = cache.get_or_compute(key(1.0), || counted(&calls, 5)).await;
        assert_eq!(ok, Ok(5));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_does_not_disturb_prior_success() {
        let cache: TtlCache<CacheKey, u32> = TtlCache::default();
        let calls = AtomicUsize::new(0);

        cache.get_or_compute(key(1.0), || counted(&calls, 42)).await.unwrap();

        // A failing compute for another key leaves this line alone.
        let err = cache.get_or_compute(key(2.0), || failing(&calls)).await;
        assert!(err.is_err());

        tokio::time::advance(Duration::from_secs(900)).await;
        let still = cache.get_or_compute(key(1.0), || failing(&calls)).await;
        assert_eq!(still, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_after_expiry_keeps_old_entry() {
        let cache: TtlCache<CacheKey, u32> = TtlCache::default();
        let calls = AtomicUsize::new(0);

        cache.get_or_compute(key(1.0), || counted(&calls, 42)).await.unwrap();
        tokio::time::advance(DEFAULT_TTL).await;

        let err = cache.get_or_compute(key(1.0), || failing(&calls)).await;
        assert!(err.is_err());
        assert_eq!(cache.len().await, 1);

        let fresh = cache.get_or_compute(key(1.0), || counted(&calls, 43)).await;
        assert_eq!(fresh, Ok(43));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_see_a_consistent_value() {
        let cache: Arc<TtlCache<CacheKey, u32>> = Arc::new(TtlCache::default());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute(key(3.0), || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok::<_, String>(99)
                    })
                    .await
            }));
        }

        for h in handles {
            assert_eq!(h.await.unwrap(), Ok(99));
        }
        // Misses race outside the lock, so each task computes at most once.
        let computed = calls.load(Ordering::SeqCst);
        assert!((1..=8).contains(&computed), "computed {computed} times");
        assert_eq!(cache.len().await, 1);

        let before = calls.load(Ordering::SeqCst);
        let cached = cache.get_or_compute(key(3.0), || async { Ok::<_, String>(0) }).await;
        assert_eq!(cached, Ok(99));
        assert_eq!(calls.load(Ordering::SeqCst), before);
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let cache: TtlCache<CacheKey, u32> = TtlCache::default();
        let calls = AtomicUsize::new(0);

        cache.get_or_compute(key(1.0), || counted(&calls, 1)).await.unwrap();
        cache.clear().await;
        assert!(cache.is_empty().await);

        cache.get_or_compute(key(1.0), || counted(&calls, 1)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
