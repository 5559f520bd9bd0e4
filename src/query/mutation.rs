//! One-shot write operations with tag invalidation.

use tokio::sync::mpsc;

use super::cache::{QueryCache, Tag};
use crate::api::error::ApiError;

/// State of a mutation, polled by the owning panel or view.
#[derive(Debug, Clone)]
pub enum MutationState<T> {
  Idle,
  Running,
  Success(T),
  Error(ApiError),
}

impl<T> MutationState<T> {
  pub fn is_running(&self) -> bool {
    matches!(self, MutationState::Running)
  }
}

/// A write operation (create, update or delete) against the backend.
///
/// Unlike reads, mutations are never cached. On success the tags declared
/// at construction are invalidated, which marks every read providing them
/// stale; bound tables pick that up on their next poll and refetch the
/// authoritative server state. Local rows are never patched optimistically.
pub struct Mutation<T> {
  cache: QueryCache,
  invalidates: Vec<Tag>,
  state: MutationState<T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, ApiError>>>,
}

impl<T: Send + 'static> Mutation<T> {
  pub fn new(cache: QueryCache, invalidates: Vec<Tag>) -> Self {
    Self {
      cache,
      invalidates,
      state: MutationState::Idle,
      receiver: None,
    }
  }

  pub fn state(&self) -> &MutationState<T> {
    &self.state
  }

  pub fn is_running(&self) -> bool {
    self.state.is_running()
  }

  /// Start the write. Ignored while a previous run is still in flight.
  pub fn run<Fut>(&mut self, future: Fut)
  where
    Fut: std::future::Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    if self.is_running() {
      return;
    }

    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.state = MutationState::Running;

    tokio::spawn(async move {
      let result = future.await;
      // Receiver may have been reset; nothing to do then
      let _ = tx.send(result);
    });
  }

  /// Poll for completion; call from the tick handler.
  ///
  /// Returns `true` exactly once per run, when the result arrives. Success
  /// triggers invalidation of the declared tags before the caller observes
  /// the state change.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(Ok(data)) => {
        self.state = MutationState::Success(data);
        self.receiver = None;
        self.cache.invalidate(&self.invalidates);
        true
      }
      Ok(Err(error)) => {
        self.state = MutationState::Error(error);
        self.receiver = None;
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.state = MutationState::Error(ApiError::Transport(
          "request task dropped".to_string(),
        ));
        self.receiver = None;
        true
      }
    }
  }

  /// Return to `Idle` after the caller has consumed a terminal state.
  pub fn reset(&mut self) {
    self.state = MutationState::Idle;
    self.receiver = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::query::{CacheKey, Query, QueryStatus};
  use std::time::Duration;

  async fn settle<T: Send + 'static>(mutation: &mut Mutation<T>) {
    for _ in 0..50 {
      tokio::time::sleep(Duration::from_millis(5)).await;
      if mutation.poll() {
        return;
      }
    }
  }

  #[tokio::test]
  async fn test_success_invalidates_declared_tags() {
    let cache = QueryCache::new();

    // A table bound to the donors tag, already loaded
    let mut list = Query::new(
      cache.clone(),
      CacheKey::new("donors.list", &0u32),
      vec![Tag("donors")],
      || async { Ok(vec!["a".to_string()]) },
    );
    list.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    list.poll();
    assert_eq!(list.snapshot().status, QueryStatus::Ready);

    let mut create = Mutation::new(cache.clone(), vec![Tag("donors")]);
    create.run(async { Ok(()) });
    settle(&mut create).await;

    assert!(matches!(create.state(), MutationState::Success(())));
    assert!(list.snapshot().stale, "bound read should be marked stale");
  }

  #[tokio::test]
  async fn test_failure_does_not_invalidate() {
    let cache = QueryCache::new();
    let key = CacheKey::new("donors.list", &0u32);
    cache.retain(&key, &[Tag("donors")]);
    let generation = cache.begin_fetch(&key).expect("start");
    cache.commit(&key, generation, Ok::<_, ApiError>(1u32));

    let mut create = Mutation::new(cache.clone(), vec![Tag("donors")]);
    create.run(async {
      Err::<(), _>(ApiError::Status {
        status: 400,
        message: "Donor ID already exists".to_string(),
      })
    });
    settle(&mut create).await;

    match create.state() {
      MutationState::Error(e) => assert!(e.is_duplicate_id()),
      other => panic!("expected error state, got {:?}", std::mem::discriminant(other)),
    }
    // The existing dataset is untouched
    let snap = cache.snapshot::<u32>(&key);
    assert!(!snap.stale);
    assert_eq!(snap.data.as_deref(), Some(&1));
  }

  #[tokio::test]
  async fn test_run_while_running_is_ignored() {
    let cache = QueryCache::new();
    let mut m: Mutation<u32> = Mutation::new(cache, vec![]);

    m.run(async {
      tokio::time::sleep(Duration::from_millis(20)).await;
      Ok(1)
    });
    m.run(async { Ok(2) });
    settle(&mut m).await;

    assert!(matches!(m.state(), MutationState::Success(1)));
  }
}
