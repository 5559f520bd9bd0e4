//! Shared store of cached query results.
//!
//! The cache is an explicitly owned service created once at startup and
//! handed to every view; there is no ambient global. Entries are
//! reference-counted by the `Query` handles observing them and evicted
//! when the last handle drops, which also discards any response still in
//! flight for that entry.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::key::CacheKey;
use crate::api::error::ApiError;

/// Label linking cached reads to the writes that must invalidate them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag(pub &'static str);

/// Lifecycle status of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
  /// Entry exists but nothing has been fetched yet
  Idle,
  /// A request is in flight
  Loading,
  /// Last request succeeded
  Ready,
  /// Last request failed; `data` may still hold an earlier result
  Error,
}

/// Point-in-time view of one entry, as observed by a `Query<T>` handle.
#[derive(Debug, Clone)]
pub struct QuerySnapshot<T> {
  pub status: QueryStatus,
  /// Last-known result. Retained through reloads and errors so views can
  /// keep rendering stale rows while fresh data is on the way.
  pub data: Option<Arc<T>>,
  pub error: Option<ApiError>,
  pub stale: bool,
}

impl<T> QuerySnapshot<T> {
  fn empty() -> Self {
    Self {
      status: QueryStatus::Idle,
      data: None,
      error: None,
      stale: false,
    }
  }

  pub fn is_loading(&self) -> bool {
    self.status == QueryStatus::Loading
  }
}

struct CacheEntry {
  status: QueryStatus,
  value: Option<Arc<dyn Any + Send + Sync>>,
  error: Option<ApiError>,
  tags: Vec<Tag>,
  stale: bool,
  fetched_at: Option<Instant>,
  /// Generation of the request allowed to commit. A newer fetch bumps this
  /// so responses from superseded requests are discarded on arrival.
  generation: u64,
  /// Bumped on every observable change; handles compare it to detect updates.
  revision: u64,
  /// Number of live `Query` handles bound to this entry.
  refs: usize,
}

impl CacheEntry {
  fn new(tags: Vec<Tag>) -> Self {
    Self {
      status: QueryStatus::Idle,
      value: None,
      error: None,
      tags,
      stale: false,
      fetched_at: None,
      generation: 0,
      revision: 0,
      refs: 0,
    }
  }
}

struct CacheInner {
  entries: HashMap<CacheKey, CacheEntry>,
  next_generation: u64,
}

/// Cache of remote read results, keyed by (operation, serialized params).
///
/// Cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct QueryCache {
  inner: Arc<Mutex<CacheInner>>,
  /// How long a successful result stays fresh before a poll refetches it
  stale_time: Duration,
}

impl QueryCache {
  pub fn new() -> Self {
    Self {
      inner: Arc::new(Mutex::new(CacheInner {
        entries: HashMap::new(),
        next_generation: 1,
      })),
      stale_time: Duration::from_secs(60),
    }
  }

  #[allow(dead_code)]
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  fn lock(&self) -> MutexGuard<'_, CacheInner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Register a handle for `key`, creating the entry on first use.
  pub(crate) fn retain(&self, key: &CacheKey, tags: &[Tag]) {
    let mut inner = self.lock();
    let entry = inner
      .entries
      .entry(key.clone())
      .or_insert_with(|| CacheEntry::new(tags.to_vec()));
    entry.refs += 1;
  }

  /// Drop a handle's reference. The entry is evicted when nothing observes
  /// it anymore; an in-flight response for an evicted entry is ignored.
  pub(crate) fn release(&self, key: &CacheKey) {
    let mut inner = self.lock();
    let evict = match inner.entries.get_mut(key) {
      Some(entry) => {
        entry.refs = entry.refs.saturating_sub(1);
        entry.refs == 0
      }
      None => false,
    };
    if evict {
      inner.entries.remove(key);
      tracing::debug!(key = %key, "evicted");
    }
  }

  /// Start a fetch unless the entry is already fresh or already loading.
  ///
  /// Returns the request generation to commit under, or `None` when no
  /// network call is needed: a fresh result is served from cache, and a
  /// concurrent caller joins the in-flight request instead of duplicating
  /// it. Failed entries are not retried here; only invalidation or an
  /// explicit refetch restarts them.
  pub(crate) fn begin_fetch(&self, key: &CacheKey) -> Option<u64> {
    let mut inner = self.lock();
    let fresh_for = self.stale_time;
    let generation = inner.next_generation;
    let entry = inner.entries.get_mut(key)?;

    match entry.status {
      QueryStatus::Loading => return None,
      QueryStatus::Ready | QueryStatus::Error if !entry.stale => {
        let expired = entry
          .fetched_at
          .map(|t| t.elapsed() > fresh_for)
          .unwrap_or(true);
        if entry.status == QueryStatus::Error || !expired {
          return None;
        }
      }
      _ => {}
    }

    entry.status = QueryStatus::Loading;
    entry.generation = generation;
    entry.revision += 1;
    inner.next_generation += 1;
    Some(generation)
  }

  /// Start a fetch unconditionally, superseding any in-flight request for
  /// this key. The superseded response will fail its generation check and
  /// be discarded (last request wins).
  pub(crate) fn force_fetch(&self, key: &CacheKey) -> Option<u64> {
    let mut inner = self.lock();
    let generation = inner.next_generation;
    let entry = inner.entries.get_mut(key)?;

    entry.status = QueryStatus::Loading;
    entry.generation = generation;
    entry.revision += 1;
    inner.next_generation += 1;
    Some(generation)
  }

  /// Commit a completed request. Discarded when the entry was evicted or a
  /// newer request has superseded this one.
  pub(crate) fn commit<T: Send + Sync + 'static>(
    &self,
    key: &CacheKey,
    generation: u64,
    result: Result<T, ApiError>,
  ) {
    let mut inner = self.lock();
    let Some(entry) = inner.entries.get_mut(key) else {
      tracing::debug!(key = %key, "response for evicted entry dropped");
      return;
    };
    if entry.generation != generation {
      tracing::debug!(key = %key, generation, "superseded response dropped");
      return;
    }

    match result {
      Ok(data) => {
        entry.status = QueryStatus::Ready;
        entry.value = Some(Arc::new(data));
        entry.error = None;
        entry.stale = false;
        entry.fetched_at = Some(Instant::now());
      }
      Err(error) => {
        // Stale-while-error: keep the previous value, record the failure
        tracing::debug!(key = %key, error = %error, "fetch failed");
        entry.status = QueryStatus::Error;
        entry.error = Some(error);
      }
    }
    entry.revision += 1;
  }

  /// Mark every entry providing one of `tags` stale. Observing handles
  /// refetch on their next poll.
  pub fn invalidate(&self, tags: &[Tag]) {
    let mut inner = self.lock();
    for (key, entry) in inner.entries.iter_mut() {
      if entry.tags.iter().any(|t| tags.contains(t)) && !entry.stale {
        entry.stale = true;
        entry.revision += 1;
        tracing::debug!(key = %key, "invalidated");
      }
    }
  }

  /// Current view of an entry for a typed handle.
  pub(crate) fn snapshot<T: Send + Sync + 'static>(&self, key: &CacheKey) -> QuerySnapshot<T> {
    let inner = self.lock();
    match inner.entries.get(key) {
      None => QuerySnapshot::empty(),
      Some(entry) => QuerySnapshot {
        status: entry.status,
        data: entry
          .value
          .clone()
          .and_then(|value| value.downcast::<T>().ok()),
        error: entry.error.clone(),
        stale: entry.stale,
      },
    }
  }

  pub(crate) fn revision(&self, key: &CacheKey) -> u64 {
    let inner = self.lock();
    inner.entries.get(key).map(|e| e.revision).unwrap_or(0)
  }

  #[cfg(test)]
  pub(crate) fn contains(&self, key: &CacheKey) -> bool {
    self.lock().entries.contains_key(key)
  }
}

impl Default for QueryCache {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(op: &'static str) -> CacheKey {
    CacheKey::new(op, &0u32)
  }

  #[test]
  fn test_fresh_entry_skips_fetch() {
    let cache = QueryCache::new();
    let k = key("donors.list");
    cache.retain(&k, &[Tag("donors")]);

    let generation = cache.begin_fetch(&k).expect("first fetch should start");
    cache.commit(&k, generation, Ok::<_, ApiError>(vec![1, 2, 3]));

    // Fresh result: no second network call
    assert_eq!(cache.begin_fetch(&k), None);
    let snap = cache.snapshot::<Vec<i32>>(&k);
    assert_eq!(snap.status, QueryStatus::Ready);
    assert_eq!(snap.data.as_deref(), Some(&vec![1, 2, 3]));
  }

  #[test]
  fn test_loading_entry_joins_in_flight() {
    let cache = QueryCache::new();
    let k = key("donors.list");
    cache.retain(&k, &[]);

    assert!(cache.begin_fetch(&k).is_some());
    // Second caller for the same key does not start another request
    assert_eq!(cache.begin_fetch(&k), None);
  }

  #[test]
  fn test_superseded_response_is_discarded() {
    let cache = QueryCache::new();
    let k = key("donors.list");
    cache.retain(&k, &[]);

    let old = cache.begin_fetch(&k).expect("start");
    let new = cache.force_fetch(&k).expect("supersede");
    assert_ne!(old, new);

    // Old response arrives after the refetch started: dropped
    cache.commit(&k, old, Ok::<_, ApiError>("old".to_string()));
    let snap = cache.snapshot::<String>(&k);
    assert_eq!(snap.status, QueryStatus::Loading);
    assert!(snap.data.is_none());

    cache.commit(&k, new, Ok::<_, ApiError>("new".to_string()));
    let snap = cache.snapshot::<String>(&k);
    assert_eq!(snap.data.as_deref().map(String::as_str), Some("new"));
  }

  #[test]
  fn test_invalidate_marks_matching_tags_stale() {
    let cache = QueryCache::new();
    let donors = key("donors.list");
    let events = key("events.list");
    cache.retain(&donors, &[Tag("donors")]);
    cache.retain(&events, &[Tag("events")]);

    for k in [&donors, &events] {
      let generation = cache.begin_fetch(k).expect("start");
      cache.commit(k, generation, Ok::<_, ApiError>(1u32));
    }

    cache.invalidate(&[Tag("donors")]);
    assert!(cache.snapshot::<u32>(&donors).stale);
    assert!(!cache.snapshot::<u32>(&events).stale);

    // Stale entry refetches even though it is within the freshness window
    assert!(cache.begin_fetch(&donors).is_some());
    assert_eq!(cache.begin_fetch(&events), None);
  }

  #[test]
  fn test_error_keeps_previous_data() {
    let cache = QueryCache::new();
    let k = key("donors.list");
    cache.retain(&k, &[Tag("donors")]);

    let generation = cache.begin_fetch(&k).expect("start");
    cache.commit(&k, generation, Ok::<_, ApiError>(vec![1]));

    cache.invalidate(&[Tag("donors")]);
    let generation = cache.begin_fetch(&k).expect("stale refetch");
    cache.commit(
      &k,
      generation,
      Err::<Vec<i32>, _>(ApiError::Transport("down".to_string())),
    );

    let snap = cache.snapshot::<Vec<i32>>(&k);
    assert_eq!(snap.status, QueryStatus::Error);
    assert_eq!(snap.data.as_deref(), Some(&vec![1]));
    assert!(snap.error.is_some());
  }

  #[test]
  fn test_failed_entry_not_retried_without_refetch() {
    let cache = QueryCache::new();
    let k = key("donors.list");
    cache.retain(&k, &[]);

    let generation = cache.begin_fetch(&k).expect("start");
    cache.commit(
      &k,
      generation,
      Err::<u32, _>(ApiError::Transport("down".to_string())),
    );

    // No automatic retry on poll
    assert_eq!(cache.begin_fetch(&k), None);
    // Explicit refetch still works
    assert!(cache.force_fetch(&k).is_some());
  }

  #[test]
  fn test_refcounted_eviction() {
    let cache = QueryCache::new();
    let k = key("donors.list");
    cache.retain(&k, &[]);
    cache.retain(&k, &[]);

    let generation = cache.begin_fetch(&k).expect("start");

    cache.release(&k);
    assert!(cache.contains(&k));
    cache.release(&k);
    assert!(!cache.contains(&k));

    // Late response for the evicted entry is ignored, not resurrected
    cache.commit(&k, generation, Ok::<_, ApiError>(7u32));
    assert!(!cache.contains(&k));
  }
}
