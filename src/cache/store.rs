//! Tag-invalidated get-or-compute cache.
//!
//! One store instance serves the whole process. Entries are keyed by
//! operation + canonical parameters, carry a TTL and a set of invalidation
//! tags, and are immutable once published. Concurrent callers of the same
//! cold key share a single computation; callers of different keys never
//! wait on each other. Failed computations are never cached: the error
//! fans out to every waiter of that flight and the next call retries.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use lru::LruCache;
use metrics::counter;
use thiserror::Error;
use tracing::debug;

use crate::application::repos::RepoError;

use super::config::CacheConfig;
use super::key::{CacheKey, CacheTag};
use super::lock::{mutex_lock, rw_read, rw_write};

const SOURCE: &str = "cache::store";

const METRIC_HIT: &str = "playdex_cache_hit_total";
const METRIC_MISS: &str = "playdex_cache_miss_total";
const METRIC_EVICT: &str = "playdex_cache_evict_total";
const METRIC_BUST: &str = "playdex_cache_bust_total";

type StoredValue = Arc<dyn Any + Send + Sync>;
type FlightFuture = Shared<BoxFuture<'static, Result<StoredValue, CacheError>>>;

/// Error surfaced by [`CacheStore::get_or_compute`].
///
/// Cloneable so a single failed flight can fan the same error out to every
/// waiter.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache computation timed out after {0:?}")]
    Timeout(Duration),
    #[error("cache computation failed: {0}")]
    Compute(#[from] Arc<RepoError>),
    #[error("cache entry for `{0}` holds an unexpected type")]
    TypeMismatch(String),
}

impl CacheError {
    pub fn compute(err: RepoError) -> Self {
        Self::Compute(Arc::new(err))
    }

    /// The underlying repository error, when this failure wraps one.
    pub fn as_repo_error(&self) -> Option<&RepoError> {
        match self {
            CacheError::Compute(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

struct CacheEntry {
    value: StoredValue,
    created_at: Instant,
    ttl: Duration,
    tags: Vec<CacheTag>,
}

impl CacheEntry {
    fn is_fresh(&self) -> bool {
        self.created_at.elapsed() < self.ttl
    }
}

struct StoreInner {
    config: CacheConfig,
    entries: RwLock<LruCache<CacheKey, CacheEntry>>,
    inflight: Mutex<HashMap<CacheKey, FlightFuture>>,
    tag_index: RwLock<HashMap<CacheTag, HashSet<CacheKey>>>,
}

/// Process-wide cache. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CacheStore {
    inner: Arc<StoreInner>,
}

impl CacheStore {
    pub fn new(config: CacheConfig) -> Self {
        let capacity = config.capacity_non_zero();
        Self {
            inner: Arc::new(StoreInner {
                config,
                entries: RwLock::new(LruCache::new(capacity)),
                inflight: Mutex::new(HashMap::new()),
                tag_index: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Return the cached value for `key`, computing it when absent or
    /// expired.
    ///
    /// Concurrent callers for the same cold key share one execution of
    /// `compute`; its result (or error) reaches all of them. The
    /// computation is bounded by the configured compute timeout. With
    /// caching disabled, `compute` runs directly.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        key: CacheKey,
        tags: &[CacheTag],
        ttl: Duration,
        compute: F,
    ) -> Result<Arc<T>, CacheError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RepoError>> + Send + 'static,
    {
        if !self.inner.config.enabled {
            let value = compute().await.map_err(CacheError::compute)?;
            return Ok(Arc::new(value));
        }

        if let Some(value) = self.inner.lookup(&key) {
            counter!(METRIC_HIT).increment(1);
            return downcast::<T>(&key, value);
        }

        let flight = self.join_or_start(key.clone(), tags, ttl, compute);
        let value = flight.await?;
        downcast::<T>(&key, value)
    }

    /// Discard every entry registered under `tag`. Entries under other tags
    /// are untouched; busting an unused tag is a no-op.
    pub fn bust(&self, tag: CacheTag) -> usize {
        let keys = rw_write(&self.inner.tag_index, SOURCE, "bust")
            .remove(&tag)
            .unwrap_or_default();
        if keys.is_empty() {
            return 0;
        }

        let mut removed = Vec::new();
        {
            let mut entries = rw_write(&self.inner.entries, SOURCE, "bust.entries");
            for key in &keys {
                if let Some(entry) = entries.pop(key) {
                    removed.push((key.clone(), entry));
                }
            }
        }

        // Entries can be registered under several tags; drop their other
        // registrations so the index never points at missing entries.
        let mut index = rw_write(&self.inner.tag_index, SOURCE, "bust.index");
        for (key, entry) in &removed {
            for other in &entry.tags {
                if *other == tag {
                    continue;
                }
                let mut now_empty = false;
                if let Some(set) = index.get_mut(other) {
                    set.remove(key);
                    now_empty = set.is_empty();
                }
                if now_empty {
                    index.remove(other);
                }
            }
        }
        drop(index);

        counter!(METRIC_BUST).increment(1);
        debug!(tag = %tag, entries = removed.len(), "cache tag busted");
        removed.len()
    }

    /// Drop every entry and tag registration. Used at shutdown and by the
    /// admin reset path.
    pub fn clear(&self) {
        rw_write(&self.inner.entries, SOURCE, "clear.entries").clear();
        rw_write(&self.inner.tag_index, SOURCE, "clear.tags").clear();
    }

    /// Number of live entries (expired entries still count until touched).
    pub fn len(&self) -> usize {
        rw_read(&self.inner.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn join_or_start<T, F, Fut>(
        &self,
        key: CacheKey,
        tags: &[CacheTag],
        ttl: Duration,
        compute: F,
    ) -> FlightFuture
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RepoError>> + Send + 'static,
    {
        let mut inflight = mutex_lock(&self.inner.inflight, SOURCE, "join_or_start");

        if let Some(existing) = inflight.get(&key) {
            return existing.clone();
        }

        // A racing flight may have completed between the miss and taking
        // the in-flight lock.
        if let Some(value) = self.inner.lookup(&key) {
            counter!(METRIC_HIT).increment(1);
            return futures::future::ready(Ok(value)).boxed().shared();
        }

        counter!(METRIC_MISS).increment(1);
        debug!(key = %key, "cache miss, computing");

        let inner = Arc::clone(&self.inner);
        let tags = tags.to_vec();
        let flight_key = key.clone();
        let timeout = self.inner.config.compute_timeout;
        let fut = compute();
        let flight: FlightFuture = async move {
            let result = match tokio::time::timeout(timeout, fut).await {
                Err(_) => Err(CacheError::Timeout(timeout)),
                Ok(Err(err)) => Err(CacheError::compute(err)),
                Ok(Ok(value)) => {
                    let stored: StoredValue = Arc::new(value);
                    inner.insert(flight_key.clone(), Arc::clone(&stored), &tags, ttl);
                    Ok(stored)
                }
            };
            inner.remove_flight(&flight_key);
            result
        }
        .boxed()
        .shared();

        inflight.insert(key, flight.clone());
        flight
    }
}

impl StoreInner {
    fn lookup(&self, key: &CacheKey) -> Option<StoredValue> {
        let mut entries = rw_write(&self.entries, SOURCE, "lookup");
        let fresh = entries.get(key).map(CacheEntry::is_fresh)?;
        if fresh {
            return entries.get(key).map(|entry| Arc::clone(&entry.value));
        }
        let expired = entries.pop(key);
        drop(entries);
        if let Some(entry) = expired {
            self.unregister(key, &entry.tags);
        }
        None
    }

    fn insert(&self, key: CacheKey, value: StoredValue, tags: &[CacheTag], ttl: Duration) {
        let entry = CacheEntry {
            value,
            created_at: Instant::now(),
            ttl,
            tags: tags.to_vec(),
        };
        let evicted = rw_write(&self.entries, SOURCE, "insert").push(key.clone(), entry);
        if let Some((evicted_key, evicted_entry)) = evicted {
            // `push` also reports a replaced value under the same key, which
            // needs no index cleanup.
            if evicted_key != key {
                counter!(METRIC_EVICT).increment(1);
                self.unregister(&evicted_key, &evicted_entry.tags);
            }
        }

        let mut index = rw_write(&self.tag_index, SOURCE, "insert.tags");
        for tag in tags {
            index.entry(*tag).or_default().insert(key.clone());
        }
    }

    fn unregister(&self, key: &CacheKey, tags: &[CacheTag]) {
        let mut index = rw_write(&self.tag_index, SOURCE, "unregister");
        for tag in tags {
            let mut now_empty = false;
            if let Some(set) = index.get_mut(tag) {
                set.remove(key);
                now_empty = set.is_empty();
            }
            if now_empty {
                index.remove(tag);
            }
        }
    }

    fn remove_flight(&self, key: &CacheKey) {
        mutex_lock(&self.inflight, SOURCE, "remove_flight").remove(key);
    }
}

fn downcast<T: Send + Sync + 'static>(
    key: &CacheKey,
    value: StoredValue,
) -> Result<Arc<T>, CacheError> {
    value
        .downcast::<T>()
        .map_err(|_| CacheError::TypeMismatch(key.to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::cache::key::KeyBuilder;

    use super::*;

    fn store() -> CacheStore {
        CacheStore::new(CacheConfig::default())
    }

    fn key(op: &'static str) -> CacheKey {
        CacheKey::bare(op)
    }

    async fn compute_number(
        store: &CacheStore,
        cache_key: CacheKey,
        tag: CacheTag,
        ttl: Duration,
        calls: &Arc<AtomicUsize>,
        value: u64,
    ) -> Result<Arc<u64>, CacheError> {
        let calls = Arc::clone(calls);
        store
            .get_or_compute(cache_key, &[tag], ttl, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(value)
            })
            .await
    }

    #[tokio::test]
    async fn entry_within_ttl_computes_once() {
        let store = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let ttl = Duration::from_secs(60);

        let first = compute_number(&store, key("n"), CacheTag::Games, ttl, &calls, 7)
            .await
            .unwrap();
        let second = compute_number(&store, key("n"), CacheTag::Games, ttl, &calls, 7)
            .await
            .unwrap();

        assert_eq!(*first, 7);
        // Hits return the same published value.
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_entry_is_recomputed() {
        let store = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let ttl = Duration::from_millis(10);

        compute_number(&store, key("n"), CacheTag::Games, ttl, &calls, 1)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        compute_number(&store, key("n"), CacheTag::Games, ttl, &calls, 1)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn bust_forces_recompute_before_ttl() {
        let store = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let ttl = Duration::from_secs(3_600);

        compute_number(&store, key("n"), CacheTag::Categories, ttl, &calls, 1)
            .await
            .unwrap();
        assert_eq!(store.bust(CacheTag::Categories), 1);
        compute_number(&store, key("n"), CacheTag::Categories, ttl, &calls, 1)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        // Idempotent: nothing left under the tag.
        assert_eq!(store.bust(CacheTag::Categories), 1);
        assert_eq!(store.bust(CacheTag::Categories), 0);
    }

    #[tokio::test]
    async fn bust_leaves_other_tags_untouched() {
        let store = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let ttl = Duration::from_secs(60);

        compute_number(&store, key("cats"), CacheTag::Categories, ttl, &calls, 1)
            .await
            .unwrap();
        compute_number(&store, key("tags"), CacheTag::Tags, ttl, &calls, 2)
            .await
            .unwrap();

        store.bust(CacheTag::Categories);

        compute_number(&store, key("tags"), CacheTag::Tags, ttl, &calls, 2)
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn multi_tag_entry_is_removed_by_either_tag() {
        let store = store();
        let ttl = Duration::from_secs(60);
        let calls = Arc::new(AtomicUsize::new(0));

        {
            let calls = Arc::clone(&calls);
            store
                .get_or_compute(
                    key("listing"),
                    &[CacheTag::Games, CacheTag::Categories],
                    ttl,
                    move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(1u64)
                    },
                )
                .await
                .unwrap();
        }

        // Busting the decoration tag must also drop the listing entry.
        assert_eq!(store.bust(CacheTag::Categories), 1);
        assert!(store.is_empty());
        // The games tag no longer references the removed entry.
        assert_eq!(store.bust(CacheTag::Games), 0);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_computation() {
        let store = store();
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                store
                    .get_or_compute(
                        key("answer"),
                        &[CacheTag::Games],
                        Duration::from_secs(60),
                        move || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(25)).await;
                            Ok(42u64)
                        },
                    )
                    .await
            }));
        }

        for handle in handles {
            let value = handle.await.expect("task").expect("value");
            assert_eq!(*value, 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_reaches_every_waiter_and_is_not_cached() {
        let store = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let ttl = Duration::from_secs(60);

        let mut handles = Vec::new();
        for _ in 0..4 {
            let store = store.clone();
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                store
                    .get_or_compute::<u64, _, _>(
                        key("broken"),
                        &[CacheTag::Games],
                        ttl,
                        move || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(10)).await;
                            Err(RepoError::Persistence("connection reset".into()))
                        },
                    )
                    .await
            }));
        }
        for handle in handles {
            let result = handle.await.expect("task");
            assert!(matches!(result, Err(CacheError::Compute(_))));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(store.is_empty());

        // The next call retries from scratch and can succeed.
        let value = compute_number(&store, key("broken"), CacheTag::Games, ttl, &calls, 9)
            .await
            .unwrap();
        assert_eq!(*value, 9);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn slow_computation_times_out_uniformly() {
        let config = CacheConfig {
            compute_timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let store = CacheStore::new(config);

        let result = store
            .get_or_compute::<u64, _, _>(
                key("slow"),
                &[CacheTag::Games],
                Duration::from_secs(60),
                || async {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Ok(1)
                },
            )
            .await;
        assert!(matches!(result, Err(CacheError::Timeout(_))));
        assert!(store.is_empty());

        // A fast retry succeeds.
        let value = store
            .get_or_compute(
                key("slow"),
                &[CacheTag::Games],
                Duration::from_secs(60),
                || async { Ok(5u64) },
            )
            .await
            .unwrap();
        assert_eq!(*value, 5);
    }

    #[tokio::test]
    async fn capacity_eviction_unregisters_tags() {
        let config = CacheConfig {
            capacity: 1,
            ..Default::default()
        };
        let store = CacheStore::new(config);
        let calls = Arc::new(AtomicUsize::new(0));
        let ttl = Duration::from_secs(60);

        compute_number(&store, key("first"), CacheTag::Games, ttl, &calls, 1)
            .await
            .unwrap();
        compute_number(&store, key("second"), CacheTag::Games, ttl, &calls, 2)
            .await
            .unwrap();

        // Only the surviving entry is still registered under the tag.
        assert_eq!(store.len(), 1);
        assert_eq!(store.bust(CacheTag::Games), 1);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_share_entries() {
        let store = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let ttl = Duration::from_secs(60);

        let page1 = KeyBuilder::new().push("page", 1).build("games");
        let page2 = KeyBuilder::new().push("page", 2).build("games");
        compute_number(&store, page1, CacheTag::Games, ttl, &calls, 1)
            .await
            .unwrap();
        compute_number(&store, page2, CacheTag::Games, ttl, &calls, 2)
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn mismatched_value_type_is_reported() {
        let store = store();
        let ttl = Duration::from_secs(60);

        store
            .get_or_compute(key("shape"), &[CacheTag::Games], ttl, || async {
                Ok(1u64)
            })
            .await
            .unwrap();
        let result = store
            .get_or_compute::<String, _, _>(key("shape"), &[CacheTag::Games], ttl, || async {
                Ok("other".to_string())
            })
            .await;
        assert!(matches!(result, Err(CacheError::TypeMismatch(_))));
    }

    #[tokio::test]
    async fn disabled_cache_computes_every_time() {
        let config = CacheConfig {
            enabled: false,
            ..Default::default()
        };
        let store = CacheStore::new(config);
        let calls = Arc::new(AtomicUsize::new(0));
        let ttl = Duration::from_secs(60);

        compute_number(&store, key("n"), CacheTag::Games, ttl, &calls, 1)
            .await
            .unwrap();
        compute_number(&store, key("n"), CacheTag::Games, ttl, &calls, 1)
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let store = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let ttl = Duration::from_secs(60);

        compute_number(&store, key("a"), CacheTag::Games, ttl, &calls, 1)
            .await
            .unwrap();
        compute_number(&store, key("b"), CacheTag::Categories, ttl, &calls, 2)
            .await
            .unwrap();
        assert_eq!(store.len(), 2);

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.bust(CacheTag::Games), 0);
    }
}
