//! Query cache for paginated list fetches
//!
//! Entries are keyed by resource plus canonical filters. A fresh entry is
//! served without touching the network, concurrent fetches for the same key
//! share one request, and invalidation marks entries stale so the next fetch
//! goes back to the backend. Entries nobody has asked for within the
//! garbage-collection window are dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::time::Instant;

use crate::{
    config::{CacheConfig, DEFAULT_GC_TIME_SECS},
    error::ApiResult,
    models::{CacheKey, ListQuery, Page, ResourceKind},
    resources::{
        AuthorsApi, BooksApi, BorrowedBooksApi, MembersApi, Mutation, PagedResource, Resources,
    },
};

/// Result of a list fetch as handed out by the cache
pub type PageResult<T> = ApiResult<Arc<Page<T>>>;

type SharedFetch<T> = Shared<BoxFuture<'static, PageResult<T>>>;

struct Settled<T> {
    result: PageResult<T>,
    at: Instant,
}

struct CacheEntry<F, T> {
    filters: F,
    settled: Option<Settled<T>>,
    stale: bool,
    in_flight: Option<(u64, SharedFetch<T>)>,
    last_used: Instant,
}

impl<F, T> CacheEntry<F, T> {
    fn new(filters: F) -> Self {
        Self {
            filters,
            settled: None,
            stale: false,
            in_flight: None,
            last_used: Instant::now(),
        }
    }

    /// Unused for `gc_after` and no request in flight
    fn expired(&self, gc_after: Duration) -> bool {
        self.in_flight.is_none() && self.last_used.elapsed() >= gc_after
    }

    fn fresh(&self, stale_after: Duration) -> Option<PageResult<T>> {
        if self.stale {
            return None;
        }
        self.settled
            .as_ref()
            .filter(|settled| settled.at.elapsed() < stale_after)
            .map(|settled| settled.result.clone())
    }
}

enum Lookup<T> {
    Hit(PageResult<T>),
    Wait(u64, SharedFetch<T>),
}

/// Cache of list results for one resource
pub struct QueryCache<R: PagedResource> {
    api: R,
    stale_after: Duration,
    gc_after: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry<R::Filters, R::Entity>>>,
    next_request: AtomicU64,
}

impl<R: PagedResource> QueryCache<R> {
    pub fn new(api: R, stale_after: Duration) -> Self {
        Self {
            api,
            stale_after,
            gc_after: Duration::from_secs(DEFAULT_GC_TIME_SECS),
            entries: Mutex::new(HashMap::new()),
            next_request: AtomicU64::new(1),
        }
    }

    pub fn with_gc_time(mut self, gc_after: Duration) -> Self {
        self.gc_after = gc_after;
        self
    }

    pub fn resource(&self) -> ResourceKind {
        <R::Filters as ListQuery>::RESOURCE
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    /// Page for `filters`, served from cache while fresh
    pub async fn fetch(&self, filters: &R::Filters) -> PageResult<R::Entity> {
        self.load(filters, false).await
    }

    /// Page for `filters`, ignoring freshness. Joins a fetch already in flight.
    pub async fn refetch(&self, filters: &R::Filters) -> PageResult<R::Entity> {
        self.load(filters, true).await
    }

    async fn load(&self, filters: &R::Filters, force: bool) -> PageResult<R::Entity> {
        let filters = filters.canonical();
        // Invalid filters never reach the backend and are not cached
        filters.validate()?;
        let key = filters.cache_key();

        let (request_id, fetch) = match self.lookup(&key, filters, force) {
            Lookup::Hit(result) => return result,
            Lookup::Wait(request_id, fetch) => (request_id, fetch),
        };

        let result = fetch.await;
        self.settle(&key, request_id, &result);
        result
    }

    fn lookup(&self, key: &CacheKey, filters: R::Filters, force: bool) -> Lookup<R::Entity> {
        let mut entries = self.lock();
        self.sweep(&mut entries);
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(filters.clone()));
        entry.last_used = Instant::now();

        if !force {
            if let Some(result) = entry.fresh(self.stale_after) {
                tracing::trace!(resource = %self.resource(), "Cache hit");
                return Lookup::Hit(result);
            }
        }

        if let Some((request_id, fetch)) = &entry.in_flight {
            tracing::trace!(resource = %self.resource(), request_id, "Joining in-flight fetch");
            return Lookup::Wait(*request_id, fetch.clone());
        }

        let request_id = self.next_request.fetch_add(1, Ordering::Relaxed);
        let api = self.api.clone();
        let fetch = async move { api.list(&filters).await.map(Arc::new) }
            .boxed()
            .shared();
        entry.in_flight = Some((request_id, fetch.clone()));
        tracing::debug!(resource = %self.resource(), request_id, force, "Cache miss, fetching");
        Lookup::Wait(request_id, fetch)
    }

    /// Store a completed fetch, unless the entry has since moved on to a newer request
    fn settle(&self, key: &CacheKey, request_id: u64, result: &PageResult<R::Entity>) {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        match &entry.in_flight {
            Some((owner, _)) if *owner == request_id => {
                let now = Instant::now();
                entry.in_flight = None;
                entry.stale = false;
                entry.last_used = now;
                entry.settled = Some(Settled {
                    result: result.clone(),
                    at: now,
                });
                if let Err(e) = result {
                    tracing::debug!(resource = %self.resource(), request_id, error = %e, "Cached failed fetch");
                }
            }
            _ => {
                tracing::trace!(resource = %self.resource(), request_id, "Discarding detached fetch result");
            }
        }
    }

    /// Mark every entry of this resource stale
    pub fn invalidate(&self) {
        self.invalidate_where(|_| true);
    }

    /// Mark entries whose filters match `predicate` stale and detach their
    /// in-flight fetches
    pub fn invalidate_where(&self, predicate: impl Fn(&R::Filters) -> bool) {
        let mut entries = self.lock();
        let mut matched = 0usize;
        entries.retain(|_, entry| {
            if !predicate(&entry.filters) {
                return true;
            }
            matched += 1;
            entry.stale = true;
            entry.in_flight = None;
            entry.settled.is_some()
        });
        tracing::debug!(resource = %self.resource(), entries = matched, "Invalidated cache entries");
    }

    /// Last settled result for `filters`, fresh or not
    pub fn peek(&self, filters: &R::Filters) -> Option<PageResult<R::Entity>> {
        let key = filters.cache_key();
        self.lock()
            .get(&key)
            .and_then(|entry| entry.settled.as_ref())
            .map(|settled| settled.result.clone())
    }

    pub fn is_fresh(&self, filters: &R::Filters) -> bool {
        let key = filters.cache_key();
        self.lock()
            .get(&key)
            .is_some_and(|entry| entry.fresh(self.stale_after).is_some())
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Evict expired entries now; returns how many were dropped
    pub fn collect_garbage(&self) -> usize {
        let mut entries = self.lock();
        self.sweep(&mut entries)
    }

    fn sweep(&self, entries: &mut HashMap<CacheKey, CacheEntry<R::Filters, R::Entity>>) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| !entry.expired(self.gc_after));
        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::debug!(resource = %self.resource(), evicted, "Evicted unused cache entries");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry<R::Filters, R::Entity>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Query caches for all four resources
#[derive(Clone)]
pub struct QueryClient {
    pub authors: Arc<QueryCache<AuthorsApi>>,
    pub books: Arc<QueryCache<BooksApi>>,
    pub members: Arc<QueryCache<MembersApi>>,
    pub borrowed_books: Arc<QueryCache<BorrowedBooksApi>>,
}

impl QueryClient {
    pub fn new(resources: &Resources, config: &CacheConfig) -> Self {
        let (stale_after, gc_after) = (config.stale_time(), config.gc_time());
        Self {
            authors: Arc::new(
                QueryCache::new(resources.authors.clone(), stale_after).with_gc_time(gc_after),
            ),
            books: Arc::new(
                QueryCache::new(resources.books.clone(), stale_after).with_gc_time(gc_after),
            ),
            members: Arc::new(
                QueryCache::new(resources.members.clone(), stale_after).with_gc_time(gc_after),
            ),
            borrowed_books: Arc::new(
                QueryCache::new(resources.borrowed_books.clone(), stale_after)
                    .with_gc_time(gc_after),
            ),
        }
    }

    pub fn invalidate(&self, kinds: &[ResourceKind]) {
        for kind in kinds {
            match kind {
                ResourceKind::Authors => self.authors.invalidate(),
                ResourceKind::Books => self.books.invalidate(),
                ResourceKind::Members => self.members.invalidate(),
                ResourceKind::BorrowedBooks => self.borrowed_books.invalidate(),
            }
        }
    }

    /// Apply a mutation's invalidations and hand back its data
    pub fn apply<T>(&self, mutation: Mutation<T>) -> T {
        self.invalidate(&mutation.invalidates);
        mutation.into_data()
    }

    pub fn clear(&self) {
        self.authors.clear();
        self.books.clear();
        self.members.clear();
        self.borrowed_books.clear();
    }

    pub fn collect_garbage(&self) -> usize {
        self.authors.collect_garbage()
            + self.books.collect_garbage()
            + self.members.collect_garbage()
            + self.borrowed_books.collect_garbage()
    }

    pub fn len(&self) -> usize {
        self.authors.len() + self.books.len() + self.members.len() + self.borrowed_books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
