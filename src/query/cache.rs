use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use tokio::sync::watch;

use super::handle::QueryHandle;
use super::state::QueryState;
use crate::api::ApiError;
use crate::models::PageParams;

pub type FetchFuture<T> = BoxFuture<'static, Result<T, ApiError>>;

/// Performs the request for one set of params.
pub type Fetcher<P, T> = Arc<dyn Fn(P) -> FetchFuture<T> + Send + Sync>;

/// Serialized form of query params. Equal keys share one cache entry.
pub trait CacheKey {
    fn cache_key(&self) -> String;
}

impl CacheKey for PageParams {
    fn cache_key(&self) -> String {
        let (page, page_size) = self.resolved();
        format!("page={}&page_size={}", page, page_size)
    }
}

impl CacheKey for () {
    fn cache_key(&self) -> String {
        String::new()
    }
}

struct CacheEntry<P, T> {
    params: P,
    tx: watch::Sender<QueryState<T>>,
    meta: Mutex<EntryMeta>,
}

#[derive(Default)]
struct EntryMeta {
    fetched_at: Option<Instant>,
    in_flight: bool,
    /// Bumped whenever the cached value stops reflecting the server.
    generation: u64,
}

enum Completion {
    Published,
    Discarded,
    Refetch,
}

impl<P, T> CacheEntry<P, T> {
    fn new(params: P) -> Self {
        let (tx, _) = watch::channel(QueryState::Idle);
        Self {
            params,
            tx,
            meta: Mutex::new(EntryMeta::default()),
        }
    }

    fn meta(&self) -> MutexGuard<'_, EntryMeta> {
        self.meta.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_observed(&self) -> bool {
        self.tx.receiver_count() > 0
    }

    /// Claim the right to fetch. False when a fetch is already running or
    /// the cached success is still fresh.
    fn try_begin_fetch(&self, stale_time: Duration) -> bool {
        let mut meta = self.meta();
        if meta.in_flight {
            return false;
        }
        let has_data = matches!(*self.tx.borrow(), QueryState::Success(_));
        let fresh = meta
            .fetched_at
            .is_some_and(|at| at.elapsed() < stale_time);
        if has_data && fresh {
            return false;
        }
        meta.in_flight = true;
        true
    }

    fn generation(&self) -> u64 {
        self.meta().generation
    }

    fn mark_stale(&self) {
        let mut meta = self.meta();
        meta.generation += 1;
        meta.fetched_at = None;
    }

    fn complete(&self, started_at: u64, result: Result<T, ApiError>) -> Completion {
        let mut meta = self.meta();

        if meta.generation != started_at {
            // Invalidated while the request was out; the result may predate a mutation.
            if self.is_observed() {
                return Completion::Refetch;
            }
            meta.in_flight = false;
            let loading = self.tx.borrow().is_loading();
            if loading {
                self.tx.send_replace(QueryState::Idle);
            }
            return Completion::Discarded;
        }

        meta.in_flight = false;
        meta.fetched_at = result.is_ok().then(Instant::now);
        self.tx.send_replace(result.into());
        Completion::Published
    }
}

/// Cached query results for one resource, keyed by serialized params.
///
/// Concurrent queries with the same key share one in-flight request. Must be
/// used from within a tokio runtime: fetches run on spawned tasks.
///
/// A refetch publishes `Loading` over any previous result, so the cache holds
/// no data until it settles. A [`QueryHandle`] keeps its last seen state until
/// the caller awaits the next change.
pub struct QueryCache<P, T> {
    resource: &'static str,
    stale_time: Duration,
    fetcher: Fetcher<P, T>,
    entries: Mutex<HashMap<String, Arc<CacheEntry<P, T>>>>,
}

impl<P, T> QueryCache<P, T>
where
    P: CacheKey + Clone + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    pub fn new(resource: &'static str, stale_time: Duration, fetcher: Fetcher<P, T>) -> Self {
        Self {
            resource,
            stale_time,
            fetcher,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Arc<CacheEntry<P, T>>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn entry(&self, params: &P) -> Arc<CacheEntry<P, T>> {
        let key = params.cache_key();
        let mut entries = self.entries();
        Arc::clone(
            entries
                .entry(key)
                .or_insert_with(|| Arc::new(CacheEntry::new(params.clone()))),
        )
    }

    /// Observe the result for `params`, fetching unless a fresh result or
    /// an in-flight request already exists.
    pub fn query(&self, params: P) -> QueryHandle<T> {
        let entry = self.entry(&params);

        if entry.try_begin_fetch(self.stale_time) {
            self.spawn_fetch(Arc::clone(&entry));
        } else {
            tracing::debug!(resource = self.resource, key = %params.cache_key(), "query served from cache");
        }

        QueryHandle::new(entry.tx.subscribe())
    }

    /// Current state for `params` without subscribing or fetching.
    pub fn peek(&self, params: &P) -> Option<QueryState<T>> {
        let entries = self.entries();
        entries
            .get(&params.cache_key())
            .map(|entry| entry.tx.borrow().clone())
    }

    /// Overwrite the cached value for `params` with a known server result.
    pub fn set_data(&self, params: P, data: T) {
        let entry = self.entry(&params);
        let mut meta = entry.meta();
        meta.generation += 1;
        meta.fetched_at = Some(Instant::now());
        entry.tx.send_replace(QueryState::Success(Arc::new(data)));
    }

    /// Mark every entry stale. Observed entries refetch now; unobserved ones
    /// are dropped and fetched again on next use.
    pub fn invalidate(&self) {
        let observed: Vec<_> = {
            let mut entries = self.entries();
            entries.retain(|_, entry| entry.is_observed() || entry.meta().in_flight);
            entries.values().cloned().collect()
        };

        tracing::debug!(resource = self.resource, entries = observed.len(), "invalidating queries");

        for entry in observed {
            entry.mark_stale();
            if entry.is_observed() && entry.try_begin_fetch(self.stale_time) {
                self.spawn_fetch(entry);
            }
        }
    }

    fn spawn_fetch(&self, entry: Arc<CacheEntry<P, T>>) {
        let fetcher = Arc::clone(&self.fetcher);
        let resource = self.resource;

        entry.tx.send_replace(QueryState::Loading);

        tokio::spawn(async move {
            loop {
                let started_at = entry.generation();
                let result = fetcher(entry.params.clone()).await;
                if let Err(e) = &result {
                    tracing::warn!("{} query failed: {}", resource, e);
                }

                match entry.complete(started_at, result) {
                    Completion::Refetch => {
                        tracing::debug!(resource, "result invalidated in flight, refetching");
                    }
                    Completion::Published | Completion::Discarded => break,
                }
            }
        });
    }
}
