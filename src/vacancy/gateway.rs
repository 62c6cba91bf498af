//! Write path for vacancies.
//!
//! Every write goes to the remote first. Only an acknowledged write
//! invalidates the collection, and nothing is patched locally: the UI shows a
//! change once the server confirmed it and the re-fetch landed.

use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use super::cache::{VacancyCache, VacancyQuery};
use super::client::RemoteStore;
use super::types::{StatusUpdate, VacancyStatus};
use crate::error::SyncError;

/// A user-initiated write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
  Update { uid: String, status: VacancyStatus },
  Delete { uid: String },
}

impl Mutation {
  pub fn uid(&self) -> &str {
    match self {
      Mutation::Update { uid, .. } | Mutation::Delete { uid } => uid,
    }
  }
}

impl fmt::Display for Mutation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Mutation::Update { status, .. } => write!(f, "mark as {}", status),
      Mutation::Delete { .. } => write!(f, "delete"),
    }
  }
}

/// Server acknowledgement of a mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
  Updated(StatusUpdate),
  /// `removed` is false when the server had nothing to delete
  Deleted { uid: String, removed: bool },
}

/// Funnels writes to the remote store and invalidates the cache afterwards.
pub struct MutationGateway<R: RemoteStore> {
  remote: Arc<R>,
  cache: VacancyCache,
}

impl<R: RemoteStore> MutationGateway<R> {
  pub fn new(remote: Arc<R>, cache: VacancyCache) -> Self {
    Self { remote, cache }
  }

  /// Apply one mutation. Failures come back as values; the cache is only
  /// invalidated after the remote acknowledged the write.
  pub async fn mutate(&self, mutation: Mutation) -> Result<MutationOutcome, SyncError> {
    match mutation {
      Mutation::Update { uid, status } => self
        .update(&uid, status)
        .await
        .map(MutationOutcome::Updated),
      Mutation::Delete { uid } => {
        let removed = self.delete(&uid).await?;
        Ok(MutationOutcome::Deleted { uid, removed })
      }
    }
  }

  pub async fn update(&self, uid: &str, status: VacancyStatus) -> Result<StatusUpdate, SyncError> {
    match self.remote.update_vacancy(uid, status).await {
      Ok(ack) => {
        info!(uid, status = %ack.status, "vacancy status updated");
        self.cache.invalidate(&VacancyQuery::AllVacancies);
        Ok(ack)
      }
      Err(err) => {
        warn!(uid, error = %err, "status update failed");
        Err(err)
      }
    }
  }

  pub async fn delete(&self, uid: &str) -> Result<bool, SyncError> {
    match self.remote.delete_vacancy(uid).await {
      Ok(removed) => {
        info!(uid, removed, "vacancy delete acknowledged");
        self.cache.invalidate(&VacancyQuery::AllVacancies);
        Ok(removed)
      }
      Err(err) => {
        warn!(uid, error = %err, "delete failed");
        Err(err)
      }
    }
  }
}

impl<R: RemoteStore> Clone for MutationGateway<R> {
  fn clone(&self) -> Self {
    Self {
      remote: Arc::clone(&self.remote),
      cache: self.cache.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheSnapshot, Freshness};
  use crate::vacancy::cache::vacancy_cache;
  use crate::vacancy::testing::{record, FakeRemote};
  use crate::vacancy::types::VacancyRecord;
  use std::sync::Mutex;

  const KEY: VacancyQuery = VacancyQuery::AllVacancies;

  fn setup(records: Vec<VacancyRecord>) -> (Arc<FakeRemote>, VacancyCache, MutationGateway<FakeRemote>) {
    let remote = Arc::new(FakeRemote::with_records(records));
    let cache = vacancy_cache(Arc::clone(&remote));
    let gateway = MutationGateway::new(Arc::clone(&remote), cache.clone());
    (remote, cache, gateway)
  }

  fn uids(snapshot: &CacheSnapshot<Vec<VacancyRecord>>) -> Vec<String> {
    snapshot
      .data()
      .map(|records| records.iter().map(|r| r.uid.clone()).collect())
      .unwrap_or_default()
  }

  type Seen = Arc<Mutex<Vec<(Freshness, Option<VacancyStatus>)>>>;

  fn status_of_a(seen: &Seen) -> impl Fn(&CacheSnapshot<Vec<VacancyRecord>>) + Send + Sync + 'static {
    let seen = seen.clone();
    move |snapshot: &CacheSnapshot<Vec<VacancyRecord>>| {
      let status = snapshot
        .data()
        .and_then(|records| records.iter().find(|r| r.uid == "a"))
        .map(|r| r.status);
      seen.lock().unwrap().push((snapshot.freshness, status));
    }
  }

  #[tokio::test]
  async fn test_update_refreshes_every_subscriber_once() {
    let (remote, cache, gateway) = setup(vec![record("a", "Acme"), record("b", "Globex")]);
    let first: Seen = Default::default();
    let second: Seen = Default::default();
    let _first = cache.subscribe(&KEY, status_of_a(&first));
    let _second = cache.subscribe(&KEY, status_of_a(&second));
    cache.fetch(&KEY).await.unwrap();
    assert_eq!(remote.reads(), 1);
    first.lock().unwrap().clear();
    second.lock().unwrap().clear();

    let outcome = gateway
      .mutate(Mutation::Update {
        uid: "a".to_string(),
        status: VacancyStatus::Applied,
      })
      .await
      .unwrap();
    assert_eq!(
      outcome,
      MutationOutcome::Updated(StatusUpdate {
        uid: "a".to_string(),
        status: VacancyStatus::Applied,
      })
    );
    cache.fetch(&KEY).await.unwrap();

    let expected = vec![
      (Freshness::Stale, Some(VacancyStatus::Created)),
      (Freshness::Fetching, Some(VacancyStatus::Created)),
      (Freshness::Fresh, Some(VacancyStatus::Applied)),
    ];
    assert_eq!(*first.lock().unwrap(), expected);
    assert_eq!(*second.lock().unwrap(), expected);
    assert_eq!(remote.reads(), 2);
    assert_eq!(remote.writes(), 1);
  }

  #[tokio::test]
  async fn test_failed_update_does_not_invalidate() {
    let (remote, cache, gateway) = setup(vec![record("a", "Acme")]);
    let _subscription = cache.subscribe(&KEY, |_| {});
    cache.fetch(&KEY).await.unwrap();

    remote.fail_writes(true);
    let err = gateway
      .update("a", VacancyStatus::Rejected)
      .await
      .unwrap_err();
    assert!(matches!(err, SyncError::NetworkFailure(_)));

    let snapshot = cache.read(&KEY);
    assert_eq!(snapshot.freshness, Freshness::Fresh);
    assert_eq!(remote.reads(), 1);
  }

  #[tokio::test]
  async fn test_failed_delete_keeps_record() {
    let (remote, cache, gateway) = setup(vec![record("a", "Acme"), record("b", "Globex")]);
    let _subscription = cache.subscribe(&KEY, |_| {});
    cache.fetch(&KEY).await.unwrap();

    remote.fail_writes(true);
    assert!(gateway
      .mutate(Mutation::Delete {
        uid: "a".to_string()
      })
      .await
      .is_err());

    assert_eq!(uids(&cache.read(&KEY)), vec!["a", "b"]);
    cache.invalidate(&KEY);
    cache.fetch(&KEY).await.unwrap();
    assert_eq!(uids(&cache.read(&KEY)), vec!["a", "b"]);
  }

  #[tokio::test]
  async fn test_delete_waits_for_refetch() {
    let (_remote, cache, gateway) = setup(vec![record("a", "Acme"), record("b", "Globex")]);
    let _subscription = cache.subscribe(&KEY, |_| {});
    cache.fetch(&KEY).await.unwrap();

    let outcome = gateway
      .mutate(Mutation::Delete {
        uid: "a".to_string(),
      })
      .await
      .unwrap();
    assert_eq!(
      outcome,
      MutationOutcome::Deleted {
        uid: "a".to_string(),
        removed: true
      }
    );

    // No optimistic removal: the old collection stays until the re-fetch lands
    let snapshot = cache.read(&KEY);
    assert!(snapshot.is_fetching());
    assert_eq!(uids(&snapshot), vec!["a", "b"]);

    cache.fetch(&KEY).await.unwrap();
    assert_eq!(uids(&cache.read(&KEY)), vec!["b"]);
  }

  #[tokio::test]
  async fn test_delete_of_missing_record_is_acknowledged() {
    let (remote, cache, gateway) = setup(vec![record("b", "Globex")]);
    let _subscription = cache.subscribe(&KEY, |_| {});
    cache.fetch(&KEY).await.unwrap();

    assert_eq!(gateway.delete("a").await, Ok(false));
    cache.fetch(&KEY).await.unwrap();
    assert_eq!(remote.reads(), 2);
  }

  #[tokio::test]
  async fn test_mutation_without_subscribers_defers_refetch() {
    let (remote, cache, gateway) = setup(vec![record("a", "Acme")]);
    cache.fetch(&KEY).await.unwrap();

    gateway.update("a", VacancyStatus::Applied).await.unwrap();
    tokio::task::yield_now().await;

    assert_eq!(cache.read(&KEY).freshness, Freshness::Stale);
    assert_eq!(remote.reads(), 1);
  }

  #[test]
  fn test_mutation_display() {
    let update = Mutation::Update {
      uid: "a".to_string(),
      status: VacancyStatus::Withdrawn,
    };
    assert_eq!(update.to_string(), "mark as Withdrawn");
    assert_eq!(update.uid(), "a");
  }
}
