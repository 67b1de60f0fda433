//! Generic resource clients.
//!
//! Collections are paginated and support create/delete. Singletons are
//! read whole and replaced whole.

use futures::FutureExt;
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{ApiClient, ApiError};
use crate::models::{DeleteResponse, Page, PageParams};
use crate::query::{Fetcher, QueryCache, QueryHandle, QueryState};

const NO_QUERY: &[(&str, &str)] = &[];

/// A paginated collection: `GET path?page&page_size`, `POST path`,
/// `DELETE path/{id}`.
pub struct CollectionClient<E, C> {
    api: ApiClient,
    path: &'static str,
    cache: QueryCache<PageParams, Page<E>>,
    _payload: PhantomData<fn(&C)>,
}

impl<E, C> CollectionClient<E, C>
where
    E: DeserializeOwned + Send + Sync + 'static,
    C: Serialize,
{
    pub fn new(api: ApiClient, path: &'static str, stale_time: Duration) -> Self {
        let fetch_api = api.clone();
        let fetcher: Fetcher<PageParams, Page<E>> = Arc::new(move |params: PageParams| {
            let api = fetch_api.clone();
            async move { api.get::<Page<E>, _>(path, &params.query_pairs()).await }.boxed()
        });

        Self {
            api,
            path,
            cache: QueryCache::new(path, stale_time, fetcher),
            _payload: PhantomData,
        }
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    /// Observe one page. Defaults to page 1 of 12.
    pub fn list(&self, params: PageParams) -> QueryHandle<Page<E>> {
        self.cache.query(params)
    }

    /// Cached page, if any, without fetching.
    pub fn cached(&self, params: &PageParams) -> Option<QueryState<Page<E>>> {
        self.cache.peek(params)
    }

    pub async fn create(&self, payload: &C) -> Result<E, ApiError> {
        let created = self.api.post(self.path, payload).await?;
        tracing::info!("Created item in {}", self.path);
        self.cache.invalidate();
        Ok(created)
    }

    pub async fn delete(&self, id: &str) -> Result<DeleteResponse, ApiError> {
        let response: DeleteResponse = self.api.delete(self.path, id).await?;
        tracing::info!("Deleted {} from {} (success: {})", response.id, self.path, response.success);
        self.cache.invalidate();
        Ok(response)
    }

    /// Force observed pages to refetch.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }
}

/// A single document: `GET path`, `PUT path`.
pub struct SingletonClient<S> {
    api: ApiClient,
    path: &'static str,
    cache: QueryCache<(), S>,
}

impl<S> SingletonClient<S>
where
    S: DeserializeOwned + Serialize + Clone + Send + Sync + 'static,
{
    pub fn new(api: ApiClient, path: &'static str, stale_time: Duration) -> Self {
        let fetch_api = api.clone();
        let fetcher: Fetcher<(), S> = Arc::new(move |_: ()| {
            let api = fetch_api.clone();
            async move { api.get::<S, _>(path, NO_QUERY).await }.boxed()
        });

        Self {
            api,
            path,
            cache: QueryCache::new(path, stale_time, fetcher),
        }
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    pub fn get(&self) -> QueryHandle<S> {
        self.cache.query(())
    }

    pub fn cached(&self) -> Option<QueryState<S>> {
        self.cache.peek(&())
    }

    /// Replace the document. The cache takes whatever the server returns,
    /// not the payload that was sent.
    pub async fn update(&self, document: &S) -> Result<S, ApiError> {
        let updated: S = self.api.put(self.path, document).await?;
        tracing::info!("Replaced {}", self.path);
        self.cache.set_data((), updated.clone());
        Ok(updated)
    }

    pub fn invalidate(&self) {
        self.cache.invalidate();
    }
}
