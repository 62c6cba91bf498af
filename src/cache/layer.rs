//! Query cache that orchestrates subscriptions, invalidation and network fetching.

use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, warn};

use super::entry::{CacheEntry, FetchResult, Gate, InFlight, Listener, SharedFetch};
use super::traits::{CacheSnapshot, Freshness, QueryKey};
use crate::error::SyncError;

type FetcherFn<K, C> =
  Box<dyn Fn(&K) -> futures::future::BoxFuture<'static, Result<C, SyncError>> + Send + Sync>;

/// Keyed, subscriber-based cache of remote query results.
///
/// - At most one fetch per key is in flight; concurrent requests attach to it.
/// - Freshness has no TTL. An entry only goes stale through `invalidate`.
/// - A failed fetch marks the entry `Errored` and keeps the previous value.
/// - Invalidations arriving during a fetch are coalesced into one follow-up
///   fetch, and the superseded result is discarded.
///
/// Fetch cycles run as spawned tasks, so the cache must be used from within a
/// tokio runtime.
pub struct QueryCache<K: QueryKey, C: Send + Sync + 'static> {
  inner: Arc<Inner<K, C>>,
}

struct Inner<K: QueryKey, C: Send + Sync + 'static> {
  entries: Mutex<HashMap<K, CacheEntry<C>>>,
  fetcher: FetcherFn<K, C>,
  revalidate_on_subscribe: AtomicBool,
  next_listener: AtomicU64,
}

impl<K: QueryKey, C: Send + Sync + 'static> QueryCache<K, C> {
  /// Create a cache that loads values with `fetcher`.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn(&K) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<C, SyncError>> + Send + 'static,
  {
    Self {
      inner: Arc::new(Inner {
        entries: Mutex::new(HashMap::new()),
        fetcher: Box::new(move |key| fetcher(key).boxed()),
        revalidate_on_subscribe: AtomicBool::new(true),
        next_listener: AtomicU64::new(1),
      }),
    }
  }

  /// Whether a new subscription re-fetches an entry that is already fresh.
  ///
  /// Enabled by default so that mounting a view picks up writes made by other
  /// processes. When disabled, only stale or errored entries are fetched.
  pub fn with_revalidate_on_subscribe(self, enabled: bool) -> Self {
    self
      .inner
      .revalidate_on_subscribe
      .store(enabled, Ordering::Relaxed);
    self
  }

  /// Current best-known value for `key`, possibly stale.
  pub fn read(&self, key: &K) -> CacheSnapshot<C> {
    self
      .inner
      .lock()
      .get(key)
      .map(CacheEntry::snapshot)
      .unwrap_or_else(CacheSnapshot::empty)
  }

  /// Fetch `key` from the remote, attaching to a fetch already in flight.
  pub async fn fetch(&self, key: &K) -> FetchResult<C> {
    let fetch = Inner::ensure_fetch(&self.inner, key);
    fetch.await
  }

  /// Mark `key` stale.
  ///
  /// With active subscribers a re-fetch starts right away (or is queued behind
  /// the fetch in flight). Without subscribers it waits for the next one.
  pub fn invalidate(&self, key: &K) {
    Inner::invalidate(&self.inner, key);
  }

  /// Register `callback` for every transition of `key`.
  ///
  /// The callback runs outside the cache lock and may call back into the cache.
  /// Dropping the returned handle unsubscribes.
  pub fn subscribe<F>(&self, key: &K, callback: F) -> Subscription<K, C>
  where
    F: Fn(&CacheSnapshot<C>) + Send + Sync + 'static,
  {
    let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
    let gate = Arc::new(Mutex::new(Gate {
      active: true,
      version: 0,
    }));

    let notification = {
      let mut entries = self.inner.lock();
      let entry = entries.entry(key.clone()).or_insert_with(CacheEntry::new);
      entry.listeners.push(Listener {
        id,
        callback: Arc::new(callback),
        gate: Arc::clone(&gate),
      });

      let wants_fetch = self.inner.revalidate_on_subscribe.load(Ordering::Relaxed)
        || entry.freshness != Freshness::Fresh;
      if entry.in_flight.is_none() && wants_fetch {
        drop(Inner::start_cycle(&self.inner, key, entry));
        Some(entry.transition())
      } else {
        None
      }
    };

    debug!(key = %key.description(), subscriber = id, "subscribed");
    if let Some(notification) = notification {
      notification.deliver();
    }

    Subscription {
      cache: Arc::downgrade(&self.inner),
      key: key.clone(),
      id,
      gate,
    }
  }

  /// Number of live subscriptions for `key`.
  pub fn subscriber_count(&self, key: &K) -> usize {
    self
      .inner
      .lock()
      .get(key)
      .map(|entry| entry.listeners.len())
      .unwrap_or(0)
  }
}

impl<K: QueryKey, C: Send + Sync + 'static> Clone for QueryCache<K, C> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

impl<K: QueryKey, C: Send + Sync + 'static> Inner<K, C> {
  fn lock(&self) -> MutexGuard<'_, HashMap<K, CacheEntry<C>>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn ensure_fetch(this: &Arc<Self>, key: &K) -> SharedFetch<C> {
    let (fetch, notification) = {
      let mut entries = this.lock();
      let entry = entries.entry(key.clone()).or_insert_with(CacheEntry::new);
      if let Some(in_flight) = &entry.in_flight {
        debug!(key = %key.description(), "attaching to in-flight fetch");
        return in_flight.fetch.clone();
      }
      let fetch = Self::start_cycle(this, key, entry);
      (fetch, entry.transition())
    };
    notification.deliver();
    fetch
  }

  /// Start a fetch cycle. Caller holds the lock and checked nothing is in flight.
  fn start_cycle(this: &Arc<Self>, key: &K, entry: &mut CacheEntry<C>) -> SharedFetch<C> {
    entry.generation += 1;
    entry.refetch_queued = false;
    entry.freshness = Freshness::Fetching;
    debug!(key = %key.description(), generation = entry.generation, "starting fetch");

    let fetch = run_cycle(Arc::clone(this), key.clone(), entry.generation)
      .boxed()
      .shared();
    let task = tokio::spawn(fetch.clone()).abort_handle();
    entry.in_flight = Some(InFlight {
      fetch: fetch.clone(),
      task,
    });
    fetch
  }

  fn invalidate(this: &Arc<Self>, key: &K) {
    let notifications = {
      let mut entries = this.lock();
      let Some(entry) = entries.get_mut(key) else {
        debug!(key = %key.description(), "nothing cached, invalidation ignored");
        return;
      };

      if entry.in_flight.is_some() {
        debug!(key = %key.description(), "invalidated during fetch, re-fetch queued");
        entry.refetch_queued = true;
        return;
      }

      entry.freshness = Freshness::Stale;
      let stale = entry.transition();
      if !entry.has_subscribers() {
        debug!(key = %key.description(), "no subscribers, re-fetch deferred");
        return;
      }

      drop(Self::start_cycle(this, key, entry));
      [stale, entry.transition()]
    };

    for notification in notifications {
      notification.deliver();
    }
  }

  fn detach(&self, key: &K, id: u64) {
    let mut entries = self.lock();
    let Some(entry) = entries.get_mut(key) else {
      return;
    };
    entry.listeners.retain(|listener| listener.id != id);
    debug!(key = %key.description(), subscriber = id, "unsubscribed");

    if entry.has_subscribers() {
      return;
    }
    // One handle lives in the entry and one in the driver task; anything
    // beyond that is an explicit `fetch` caller still waiting on the result.
    let waiting = entry
      .in_flight
      .as_ref()
      .and_then(|in_flight| in_flight.fetch.strong_count())
      .unwrap_or(0);
    if waiting > 2 {
      return;
    }
    if let Some(in_flight) = entry.in_flight.take() {
      in_flight.task.abort();
      entry.generation += 1;
      entry.refetch_queued = false;
      entry.freshness = Freshness::Stale;
      debug!(key = %key.description(), "last subscriber left, fetch cancelled");
    }
  }
}

/// Drive one fetch cycle to completion.
///
/// Loops while invalidations were queued during the fetch and someone is still
/// subscribed, so the applied value was always requested after the latest
/// invalidation.
async fn run_cycle<K: QueryKey, C: Send + Sync + 'static>(
  inner: Arc<Inner<K, C>>,
  key: K,
  mut generation: u64,
) -> FetchResult<C> {
  loop {
    let outcome = (inner.fetcher)(&key).await;

    let (result, notification) = {
      let mut entries = inner.lock();
      let Some(entry) = entries.get_mut(&key) else {
        return outcome.map(Arc::new);
      };

      if entry.generation != generation {
        debug!(key = %key.description(), generation, "discarding superseded fetch result");
        return outcome.map(Arc::new);
      }

      if entry.refetch_queued && entry.has_subscribers() {
        entry.refetch_queued = false;
        entry.generation += 1;
        generation = entry.generation;
        debug!(key = %key.description(), generation, "re-fetching after invalidation");
        continue;
      }

      let stale_on_arrival = std::mem::take(&mut entry.refetch_queued);
      let result = entry.apply(outcome, stale_on_arrival);
      if let Err(err) = &result {
        warn!(key = %key.description(), error = %err, "fetch failed, keeping previous value");
      } else {
        debug!(key = %key.description(), generation, "fetch complete");
      }
      (result, entry.transition())
    };

    notification.deliver();
    return result;
  }
}

/// Handle for a cache subscription. Dropping it unsubscribes.
pub struct Subscription<K: QueryKey, C: Send + Sync + 'static> {
  cache: Weak<Inner<K, C>>,
  key: K,
  id: u64,
  gate: Arc<Mutex<Gate>>,
}

impl<K: QueryKey, C: Send + Sync + 'static> Subscription<K, C> {
  pub fn key(&self) -> &K {
    &self.key
  }

  /// Detach now. Equivalent to dropping the handle.
  pub fn unsubscribe(self) {}
}

impl<K: QueryKey, C: Send + Sync + 'static> Drop for Subscription<K, C> {
  fn drop(&mut self) {
    self
      .gate
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .active = false;
    if let Some(inner) = self.cache.upgrade() {
      inner.detach(&self.key, self.id);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::AtomicUsize;
  use std::time::Duration;

  #[derive(Debug, Clone, PartialEq, Eq, Hash)]
  struct TestKey;

  impl QueryKey for TestKey {
    fn description(&self) -> String {
      "test".to_string()
    }
  }

  /// Counts remote calls and how many overlap.
  #[derive(Default)]
  struct Backend {
    calls: AtomicUsize,
    running: AtomicUsize,
    max_running: AtomicUsize,
    fail: AtomicBool,
  }

  impl Backend {
    fn calls(&self) -> usize {
      self.calls.load(Ordering::SeqCst)
    }
  }

  /// Marks a remote call as running until dropped, including on abort.
  struct Running(Arc<Backend>);

  impl Running {
    fn enter(backend: Arc<Backend>) -> Self {
      let running = backend.running.fetch_add(1, Ordering::SeqCst) + 1;
      backend.max_running.fetch_max(running, Ordering::SeqCst);
      Self(backend)
    }
  }

  impl Drop for Running {
    fn drop(&mut self) {
      self.0.running.fetch_sub(1, Ordering::SeqCst);
    }
  }

  /// Cache whose value is the number of the remote call that produced it.
  fn backend_cache(backend: Arc<Backend>, delay: Duration) -> QueryCache<TestKey, usize> {
    QueryCache::new(move |_key: &TestKey| {
      let backend = backend.clone();
      async move {
        let call = backend.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let running = Running::enter(backend.clone());
        tokio::time::sleep(delay).await;
        drop(running);
        if backend.fail.load(Ordering::SeqCst) {
          Err(SyncError::NetworkFailure("unreachable".to_string()))
        } else {
          Ok(call)
        }
      }
    })
  }

  type Seen = Arc<Mutex<Vec<(Freshness, Option<usize>)>>>;

  fn recorder(seen: &Seen) -> impl Fn(&CacheSnapshot<usize>) + Send + Sync + 'static {
    let seen = seen.clone();
    move |snapshot: &CacheSnapshot<usize>| {
      seen
        .lock()
        .unwrap()
        .push((snapshot.freshness, snapshot.data().copied()));
    }
  }

  #[tokio::test]
  async fn test_fetch_marks_fresh() {
    let backend = Arc::new(Backend::default());
    let cache = backend_cache(backend.clone(), Duration::from_millis(1));

    assert_eq!(cache.read(&TestKey).freshness, Freshness::Stale);

    let value = cache.fetch(&TestKey).await.unwrap();
    assert_eq!(*value, 1);

    let snapshot = cache.read(&TestKey);
    assert_eq!(snapshot.freshness, Freshness::Fresh);
    assert_eq!(snapshot.data(), Some(&1));
    assert!(snapshot.fetched_at.is_some());
  }

  #[tokio::test]
  async fn test_concurrent_fetches_share_one_request() {
    let backend = Arc::new(Backend::default());
    let cache = backend_cache(backend.clone(), Duration::from_millis(20));

    let (a, b, c) = tokio::join!(
      cache.fetch(&TestKey),
      cache.fetch(&TestKey),
      cache.fetch(&TestKey)
    );

    assert_eq!(backend.calls(), 1);
    assert_eq!((*a.unwrap(), *b.unwrap(), *c.unwrap()), (1, 1, 1));
  }

  #[tokio::test]
  async fn test_failed_fetch_keeps_previous_value() {
    let backend = Arc::new(Backend::default());
    let cache = backend_cache(backend.clone(), Duration::from_millis(1));
    cache.fetch(&TestKey).await.unwrap();

    backend.fail.store(true, Ordering::SeqCst);
    let err = cache.fetch(&TestKey).await.unwrap_err();
    assert!(matches!(err, SyncError::NetworkFailure(_)));

    let snapshot = cache.read(&TestKey);
    assert_eq!(snapshot.freshness, Freshness::Errored);
    assert_eq!(snapshot.data(), Some(&1));
    assert_eq!(snapshot.error, Some(err));
  }

  #[tokio::test]
  async fn test_subscribe_fetches_and_notifies() {
    let backend = Arc::new(Backend::default());
    let cache = backend_cache(backend.clone(), Duration::from_millis(1));
    let seen: Seen = Default::default();

    let _subscription = cache.subscribe(&TestKey, recorder(&seen));
    assert!(cache.read(&TestKey).is_pending());
    cache.fetch(&TestKey).await.unwrap();

    assert_eq!(backend.calls(), 1);
    assert_eq!(
      *seen.lock().unwrap(),
      vec![(Freshness::Fetching, None), (Freshness::Fresh, Some(1))]
    );
  }

  #[tokio::test]
  async fn test_invalidate_refetches_for_subscribers() {
    let backend = Arc::new(Backend::default());
    let cache = backend_cache(backend.clone(), Duration::from_millis(1));
    let seen: Seen = Default::default();
    let _subscription = cache.subscribe(&TestKey, recorder(&seen));
    cache.fetch(&TestKey).await.unwrap();
    seen.lock().unwrap().clear();

    let calls_before = backend.calls();
    cache.invalidate(&TestKey);
    assert!(cache.read(&TestKey).is_fetching());
    let value = cache.fetch(&TestKey).await.unwrap();

    // Only data requested after the invalidation is served
    assert!(*value > calls_before);
    assert_eq!(
      *seen.lock().unwrap(),
      vec![
        (Freshness::Stale, Some(1)),
        (Freshness::Fetching, Some(1)),
        (Freshness::Fresh, Some(2)),
      ]
    );
  }

  #[tokio::test]
  async fn test_invalidate_without_subscribers_is_deferred() {
    let backend = Arc::new(Backend::default());
    let cache =
      backend_cache(backend.clone(), Duration::from_millis(1)).with_revalidate_on_subscribe(false);
    cache.fetch(&TestKey).await.unwrap();

    cache.invalidate(&TestKey);
    assert_eq!(cache.read(&TestKey).freshness, Freshness::Stale);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(backend.calls(), 1);

    let _subscription = cache.subscribe(&TestKey, |_| {});
    let value = cache.fetch(&TestKey).await.unwrap();
    assert_eq!(*value, 2);
    assert_eq!(backend.calls(), 2);
  }

  #[tokio::test]
  async fn test_fresh_entry_not_refetched_when_revalidation_disabled() {
    let backend = Arc::new(Backend::default());
    let cache =
      backend_cache(backend.clone(), Duration::from_millis(1)).with_revalidate_on_subscribe(false);
    cache.fetch(&TestKey).await.unwrap();

    let _subscription = cache.subscribe(&TestKey, |_| {});
    assert_eq!(cache.read(&TestKey).freshness, Freshness::Fresh);
    assert_eq!(backend.calls(), 1);
  }

  #[tokio::test]
  async fn test_invalidations_during_fetch_coalesce() {
    let backend = Arc::new(Backend::default());
    let cache = backend_cache(backend.clone(), Duration::from_millis(20));
    let seen: Seen = Default::default();
    let _subscription = cache.subscribe(&TestKey, recorder(&seen));

    cache.invalidate(&TestKey);
    cache.invalidate(&TestKey);
    cache.invalidate(&TestKey);
    let value = cache.fetch(&TestKey).await.unwrap();

    // The first result is superseded; one follow-up fetch covers all three
    assert_eq!(*value, 2);
    assert_eq!(backend.calls(), 2);
    assert_eq!(backend.max_running.load(Ordering::SeqCst), 1);
    assert_eq!(
      *seen.lock().unwrap(),
      vec![(Freshness::Fetching, None), (Freshness::Fresh, Some(2))]
    );
  }

  #[tokio::test]
  async fn test_invalidation_during_unobserved_fetch_leaves_entry_stale() {
    let backend = Arc::new(Backend::default());
    let cache = backend_cache(backend.clone(), Duration::from_millis(20));
    let fetch = cache.fetch(&TestKey);
    let invalidate = async {
      tokio::time::sleep(Duration::from_millis(5)).await;
      cache.invalidate(&TestKey);
    };

    let (value, ()) = tokio::join!(fetch, invalidate);
    assert_eq!(*value.unwrap(), 1);
    assert_eq!(backend.calls(), 1);
    assert_eq!(cache.read(&TestKey).freshness, Freshness::Stale);
  }

  #[tokio::test]
  async fn test_unsubscribed_callback_is_not_called() {
    let backend = Arc::new(Backend::default());
    let cache = backend_cache(backend.clone(), Duration::from_millis(5));
    let gone: Seen = Default::default();
    let stays: Seen = Default::default();

    let leaving = cache.subscribe(&TestKey, recorder(&gone));
    let _staying = cache.subscribe(&TestKey, recorder(&stays));
    leaving.unsubscribe();
    cache.fetch(&TestKey).await.unwrap();

    assert_eq!(*gone.lock().unwrap(), vec![(Freshness::Fetching, None)]);
    assert_eq!(stays.lock().unwrap().last(), Some(&(Freshness::Fresh, Some(1))));
    assert_eq!(cache.subscriber_count(&TestKey), 1);
  }

  #[tokio::test]
  async fn test_callback_can_invalidate_after_error() {
    let backend = Arc::new(Backend::default());
    backend.fail.store(true, Ordering::SeqCst);
    let cache = backend_cache(backend.clone(), Duration::from_millis(1));
    let seen: Seen = Default::default();

    let record = recorder(&seen);
    let retry = cache.clone();
    let retry_backend = backend.clone();
    let _subscription = cache.subscribe(&TestKey, move |snapshot| {
      record(snapshot);
      if snapshot.is_errored() {
        retry_backend.fail.store(false, Ordering::SeqCst);
        retry.invalidate(&TestKey);
      }
    });

    let settled = tokio::time::timeout(Duration::from_secs(2), async {
      while cache.read(&TestKey).freshness != Freshness::Fresh {
        tokio::time::sleep(Duration::from_millis(5)).await;
      }
    })
    .await;

    assert!(settled.is_ok());
    assert_eq!(backend.calls(), 2);
    assert_eq!(cache.read(&TestKey).data(), Some(&2));
    assert_eq!(
      *seen.lock().unwrap(),
      vec![
        (Freshness::Fetching, None),
        (Freshness::Errored, None),
        (Freshness::Stale, None),
        (Freshness::Fetching, None),
        (Freshness::Fresh, Some(2)),
      ]
    );
  }

  #[tokio::test]
  async fn test_last_unsubscribe_cancels_background_fetch() {
    let backend = Arc::new(Backend::default());
    let cache = backend_cache(backend.clone(), Duration::from_millis(30));

    let subscription = cache.subscribe(&TestKey, |_| {});
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(backend.calls(), 1);
    drop(subscription);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let snapshot = cache.read(&TestKey);
    assert_eq!(snapshot.freshness, Freshness::Stale);
    assert!(snapshot.data().is_none());
  }

  #[tokio::test]
  async fn test_subscription_churn_never_overlaps_fetches() {
    let backend = Arc::new(Backend::default());
    let cache = backend_cache(backend.clone(), Duration::from_millis(3));

    for round in 0..10 {
      let first = cache.subscribe(&TestKey, |_| {});
      let second = cache.subscribe(&TestKey, |_| {});
      if round % 2 == 0 {
        cache.invalidate(&TestKey);
      }
      drop(first);
      tokio::time::sleep(Duration::from_millis(1)).await;
      if round % 3 == 0 {
        drop(second);
      } else {
        cache.fetch(&TestKey).await.ok();
      }
    }
    cache.fetch(&TestKey).await.unwrap();

    assert_eq!(backend.max_running.load(Ordering::SeqCst), 1);
  }
}
