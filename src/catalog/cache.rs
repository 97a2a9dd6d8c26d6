use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::catalog::{CatalogError, CatalogSource};
use crate::propagator::Propagator;

pub type Catalog = Arc<Vec<Arc<dyn Propagator>>>;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(6 * 3600);

struct CacheEntry {
    objects: Catalog,
    fetched_at: Instant,
}

type Slot = Arc<Mutex<Option<CacheEntry>>>;

/// Time-bounded cache of catalog batches keyed by source key.
///
/// Each key has its own async lock, so at most one refresh per key is in
/// flight and concurrent callers wait for it instead of fetching again.
/// Entries are replaced whole: a reader gets a complete batch or nothing.
pub struct CatalogCache {
    ttl: Duration,
    slots: StdMutex<HashMap<String, Slot>>,
}

impl CatalogCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: StdMutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn slot(&self, key: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(key.to_string()).or_default().clone()
    }

    pub async fn get_or_refresh(
        &self,
        key: &str,
        source: Arc<dyn CatalogSource>,
    ) -> Result<Catalog, CatalogError> {
        let slot = self.slot(key);
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                log::debug!("Catalog cache hit for {}", key);
                return Ok(cached.objects.clone());
            }
        }

        log::info!("Refreshing catalog {}", key);
        let fetch_key = key.to_string();
        // a failed fetch leaves the previous entry in place
        let objects = tokio::task::spawn_blocking(move || source.fetch(&fetch_key)).await??;
        let objects: Catalog = Arc::new(objects);
        *entry = Some(CacheEntry {
            objects: objects.clone(),
            fetched_at: Instant::now(),
        });
        Ok(objects)
    }

    pub async fn invalidate(&self, key: &str) {
        let slot = self.slot(key);
        *slot.lock().await = None;
        drop(slot);
        self.prune();
    }

    /// Drop every entry. A refresh in flight finishes first, then its
    /// entry is dropped too.
    pub async fn clear(&self) {
        let slots: Vec<Slot> = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for slot in &slots {
            *slot.lock().await = None;
        }
        drop(slots);
        self.prune();
    }

    /// Forget slots that are empty and that no caller holds
    fn prune(&self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.retain(|_, slot| {
            Arc::strong_count(slot) > 1
                || slot.try_lock().map_or(true, |entry| entry.is_some())
        });
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use crate::propagator::testing::CircularOrbit;

    #[derive(Default)]
    struct CountingSource {
        fetches: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        failing: AtomicBool,
        delay: Option<std::time::Duration>,
    }

    impl CatalogSource for CountingSource {
        fn fetch(&self, key: &str) -> Result<Vec<Arc<dyn Propagator>>, CatalogError> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst) as u32;
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(running, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing.load(Ordering::SeqCst) {
                return Err(CatalogError::SourceNotFound(key.to_string()));
            }
            Ok(vec![
                CircularOrbit::new(n * 10 + 1, 500.0, 97.0).shared(),
                CircularOrbit::new(n * 10 + 2, 500.0, 97.0).shared(),
            ])
        }
    }

    fn slow_source(millis: u64) -> Arc<CountingSource> {
        Arc::new(CountingSource {
            delay: Some(std::time::Duration::from_millis(millis)),
            ..Default::default()
        })
    }

    fn slot_count(cache: &CatalogCache) -> usize {
        cache.slots.lock().unwrap().len()
    }

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let cache = CatalogCache::default();
        let source = Arc::new(CountingSource::default());

        let first = cache.get_or_refresh("starlink", source.clone()).await.unwrap();
        let second = cache.get_or_refresh("starlink", source.clone()).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

        cache.get_or_refresh("oneweb", source.clone()).await.unwrap();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_after_ttl() {
        let cache = CatalogCache::new(Duration::from_secs(60));
        let source = Arc::new(CountingSource::default());

        let first = cache.get_or_refresh("iridium", source.clone()).await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        let second = cache.get_or_refresh("iridium", source.clone()).await.unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_keeps_previous_entry() {
        let cache = CatalogCache::new(Duration::from_secs(60));
        let source = Arc::new(CountingSource::default());

        let first = cache.get_or_refresh("spire", source.clone()).await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;

        source.failing.store(true, Ordering::SeqCst);
        assert!(cache.get_or_refresh("spire", source.clone()).await.is_err());

        // the stale entry is still there and still complete
        let slot = cache.slot("spire");
        let entry = slot.lock().await;
        let cached = entry.as_ref().unwrap();
        assert!(Arc::ptr_eq(&cached.objects, &first));
        assert_eq!(cached.objects.len(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_and_clear_force_refresh() {
        let cache = CatalogCache::default();
        let source = Arc::new(CountingSource::default());

        cache.get_or_refresh("planet", source.clone()).await.unwrap();
        cache.get_or_refresh("swarm", source.clone()).await.unwrap();
        assert_eq!(slot_count(&cache), 2);

        cache.invalidate("planet").await;
        assert_eq!(slot_count(&cache), 1);
        cache.get_or_refresh("planet", source.clone()).await.unwrap();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 3);

        cache.clear().await;
        assert_eq!(slot_count(&cache), 0);
        cache.get_or_refresh("planet", source.clone()).await.unwrap();
        cache.get_or_refresh("swarm", source.clone()).await.unwrap();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_flight_refresh() {
        let cache = Arc::new(CatalogCache::default());
        let source = slow_source(100);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let source = source.clone();
                tokio::spawn(async move {
                    cache
                        .get_or_refresh("navstar", source)
                        .await
                        .map(|objects| objects.len())
                })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), 2);
        }
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_clear_during_refresh_keeps_single_flight() {
        let cache = Arc::new(CatalogCache::default());
        let source = slow_source(300);

        let first = {
            let (cache, source) = (cache.clone(), source.clone());
            tokio::spawn(async move { cache.get_or_refresh("k", source).await.map(|o| o.len()) })
        };
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let clearing = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.clear().await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let second = {
            let (cache, source) = (cache.clone(), source.clone());
            tokio::spawn(async move { cache.get_or_refresh("k", source).await.map(|o| o.len()) })
        };

        assert_eq!(first.await.unwrap().unwrap(), 2);
        clearing.await.unwrap();
        assert_eq!(second.await.unwrap().unwrap(), 2);
        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
    }
}
