//! Poll-driven handle for one cached read operation.

use futures::future::BoxFuture;

use super::cache::{QueryCache, QuerySnapshot, Tag};
use super::key::CacheKey;
use crate::api::error::ApiError;

/// Factory producing the fetch future; called once per network request.
type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T, ApiError>> + Send + Sync>;

/// A read operation bound to one cache key.
///
/// The handle owns no data; results live in the shared `QueryCache` so
/// every handle with the same key observes the same entry. Views call
/// `fetch()` once after construction and `poll()` on every tick:
///
/// ```ignore
/// let mut query = Query::new(cache, key, vec![Tag("donors")], move || {
///   let api = api.clone();
///   let params = params.clone();
///   async move { api.list::<Donor>("donors", &params).await }
/// });
/// query.fetch();
///
/// // in the tick handler
/// if query.poll() {
///   // snapshot changed, next draw will reflect it
/// }
/// ```
///
/// Parameter changes are expressed by constructing a new `Query` for the
/// new key and dropping the old one; dropping releases the entry reference
/// and cancels interest in any in-flight response.
pub struct Query<T> {
  cache: QueryCache,
  key: CacheKey,
  fetcher: FetcherFn<T>,
  last_seen_revision: u64,
}

impl<T: Send + Sync + 'static> Query<T> {
  pub fn new<F, Fut>(cache: QueryCache, key: CacheKey, tags: Vec<Tag>, fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    cache.retain(&key, &tags);
    Self {
      cache,
      key,
      fetcher: Box::new(move || Box::pin(fetcher())),
      last_seen_revision: 0,
    }
  }

  pub fn key(&self) -> &CacheKey {
    &self.key
  }

  /// Fetch if the cached result is missing, stale or expired. A no-op when
  /// the entry is fresh or a request is already in flight (concurrent
  /// callers share that request).
  pub fn fetch(&self) {
    if let Some(generation) = self.cache.begin_fetch(&self.key) {
      self.spawn(generation);
    }
  }

  /// Force a new request, superseding any in-flight one. The older
  /// response is discarded when it arrives.
  pub fn refetch(&self) {
    if let Some(generation) = self.cache.force_fetch(&self.key) {
      self.spawn(generation);
    }
  }

  /// Poll for changes; call from the tick handler.
  ///
  /// Returns `true` when the entry changed since the last poll. Also picks
  /// up invalidations: a stale entry is refetched here, which is how a
  /// successful mutation elsewhere reaches this view without a manual
  /// reload.
  pub fn poll(&mut self) -> bool {
    self.fetch();
    let revision = self.cache.revision(&self.key);
    let changed = revision != self.last_seen_revision;
    self.last_seen_revision = revision;
    changed
  }

  /// Current state of the bound cache entry.
  pub fn snapshot(&self) -> QuerySnapshot<T> {
    self.cache.snapshot(&self.key)
  }

  /// Last-known data, retained through reloads and errors.
  pub fn data(&self) -> Option<std::sync::Arc<T>> {
    self.snapshot().data
  }

  fn spawn(&self, generation: u64) {
    let future = (self.fetcher)();
    let cache = self.cache.clone();
    let key = self.key.clone();
    tokio::spawn(async move {
      let result = future.await;
      cache.commit(&key, generation, result);
    });
  }
}

impl<T> Drop for Query<T> {
  fn drop(&mut self) {
    self.cache.release(&self.key);
  }
}

impl<T> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("key", &self.key)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::query::QueryStatus;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;
  use std::time::Duration;

  fn counting_query(
    cache: &QueryCache,
    op: &'static str,
    calls: Arc<AtomicU32>,
  ) -> Query<u32> {
    let key = CacheKey::new(op, &0u32);
    Query::new(cache.clone(), key, vec![Tag("donors")], move || {
      let calls = calls.clone();
      async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(calls.fetch_add(1, Ordering::SeqCst) + 1)
      }
    })
  }

  async fn settle<T: Send + Sync + 'static>(query: &mut Query<T>) {
    for _ in 0..50 {
      tokio::time::sleep(Duration::from_millis(5)).await;
      query.poll();
      if !query.snapshot().is_loading() {
        return;
      }
    }
  }

  #[tokio::test]
  async fn test_query_success() {
    let cache = QueryCache::new();
    let mut query = counting_query(&cache, "donors.list", Arc::new(AtomicU32::new(0)));

    assert_eq!(query.snapshot().status, QueryStatus::Idle);
    query.fetch();
    assert_eq!(query.snapshot().status, QueryStatus::Loading);

    settle(&mut query).await;
    let snap = query.snapshot();
    assert_eq!(snap.status, QueryStatus::Ready);
    assert_eq!(snap.data.as_deref(), Some(&1));
  }

  #[tokio::test]
  async fn test_rapid_identical_reads_share_one_call() {
    let cache = QueryCache::new();
    let calls = Arc::new(AtomicU32::new(0));
    let mut a = counting_query(&cache, "donors.list", calls.clone());
    let b = counting_query(&cache, "donors.list", calls.clone());

    // Two handles, same key, fetched back to back
    a.fetch();
    b.fetch();

    settle(&mut a).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(b.snapshot().data.as_deref(), Some(&1));
  }

  #[tokio::test]
  async fn test_invalidation_refetches_on_poll() {
    let cache = QueryCache::new();
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(&cache, "donors.list", calls.clone());

    query.fetch();
    settle(&mut query).await;
    assert_eq!(query.snapshot().data.as_deref(), Some(&1));

    // A write elsewhere invalidates the tag; the next poll refetches
    cache.invalidate(&[Tag("donors")]);
    assert!(query.poll());
    settle(&mut query).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(query.snapshot().data.as_deref(), Some(&2));
  }

  #[tokio::test]
  async fn test_fresh_cache_serves_new_handle_without_call() {
    let cache = QueryCache::new();
    let calls = Arc::new(AtomicU32::new(0));
    let mut a = counting_query(&cache, "donors.list", calls.clone());
    a.fetch();
    settle(&mut a).await;

    let b = counting_query(&cache, "donors.list", calls.clone());
    b.fetch();
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(b.snapshot().data.as_deref(), Some(&1));
  }

  #[tokio::test]
  async fn test_drop_evicts_and_ignores_late_response() {
    let cache = QueryCache::new();
    let calls = Arc::new(AtomicU32::new(0));
    let query = counting_query(&cache, "donors.list", calls.clone());
    let key = query.key().clone();

    query.fetch();
    drop(query);

    // The in-flight response lands after the view went away
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert!(!cache.contains(&key));
  }

  #[tokio::test]
  async fn test_refetch_supersedes_in_flight() {
    let cache = QueryCache::new();
    let calls = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(&cache, "donors.list", calls.clone());

    query.fetch();
    query.refetch();
    settle(&mut query).await;

    // Both requests ran, but only the newer one was allowed to commit
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let snap = query.snapshot();
    assert_eq!(snap.status, QueryStatus::Ready);
    assert!(snap.data.is_some());
  }
}
