//! Per-key cache state and subscriber bookkeeping.

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, Shared};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::AbortHandle;

use super::traits::{CacheSnapshot, Freshness};
use crate::error::SyncError;

/// Outcome of one fetch cycle, shared by every caller attached to it.
pub type FetchResult<C> = Result<Arc<C>, SyncError>;

pub(crate) type SharedFetch<C> = Shared<BoxFuture<'static, FetchResult<C>>>;

type Callback<C> = Arc<dyn Fn(&CacheSnapshot<C>) + Send + Sync>;

/// Delivery state of one subscriber.
///
/// `version` is the last entry version delivered; older notifications that
/// lose a race against newer ones are dropped so a subscriber never goes back
/// to a previous state.
#[derive(Debug)]
pub(crate) struct Gate {
  pub active: bool,
  pub version: u64,
}

pub(crate) struct Listener<C> {
  pub id: u64,
  pub callback: Callback<C>,
  pub gate: Arc<Mutex<Gate>>,
}

impl<C> Clone for Listener<C> {
  fn clone(&self) -> Self {
    Self {
      id: self.id,
      callback: Arc::clone(&self.callback),
      gate: Arc::clone(&self.gate),
    }
  }
}

/// A fetch cycle that has not completed yet.
pub(crate) struct InFlight<C> {
  pub fetch: SharedFetch<C>,
  pub task: AbortHandle,
}

/// Notification collected under the lock and delivered after releasing it.
pub(crate) struct Notification<C> {
  listeners: Vec<Listener<C>>,
  version: u64,
  snapshot: CacheSnapshot<C>,
}

impl<C> Notification<C> {
  pub fn deliver(self) {
    for listener in &self.listeners {
      {
        let mut gate = listener.gate.lock().unwrap_or_else(PoisonError::into_inner);
        if !gate.active || gate.version >= self.version {
          continue;
        }
        gate.version = self.version;
      }
      // Gate released: the callback may re-enter the cache or drop its own
      // subscription, both of which lock the gate again.
      (listener.callback)(&self.snapshot);
    }
  }
}

pub(crate) struct CacheEntry<C> {
  pub value: Option<Arc<C>>,
  pub freshness: Freshness,
  pub error: Option<SyncError>,
  pub fetched_at: Option<DateTime<Utc>>,
  pub listeners: Vec<Listener<C>>,
  pub in_flight: Option<InFlight<C>>,
  /// Number of the most recently started fetch; results of older ones are discarded
  pub generation: u64,
  /// Set when an invalidation arrives while a fetch is in flight
  pub refetch_queued: bool,
  /// Bumped on every notified transition
  version: u64,
}

impl<C> CacheEntry<C> {
  pub fn new() -> Self {
    Self {
      value: None,
      freshness: Freshness::Stale,
      error: None,
      fetched_at: None,
      listeners: Vec::new(),
      in_flight: None,
      generation: 0,
      refetch_queued: false,
      version: 0,
    }
  }

  pub fn has_subscribers(&self) -> bool {
    !self.listeners.is_empty()
  }

  pub fn snapshot(&self) -> CacheSnapshot<C> {
    CacheSnapshot {
      value: self.value.clone(),
      freshness: self.freshness,
      error: self.error.clone(),
      fetched_at: self.fetched_at,
    }
  }

  /// Record a transition and capture what subscribers should see.
  pub fn transition(&mut self) -> Notification<C> {
    self.version += 1;
    Notification {
      listeners: self.listeners.clone(),
      version: self.version,
      snapshot: self.snapshot(),
    }
  }

  /// Store a completed fetch. Errors keep the previous value servable.
  pub fn apply(&mut self, outcome: Result<C, SyncError>, stale_on_arrival: bool) -> FetchResult<C> {
    self.in_flight = None;
    match outcome {
      Ok(value) => {
        let value = Arc::new(value);
        self.value = Some(Arc::clone(&value));
        self.error = None;
        self.fetched_at = Some(Utc::now());
        self.freshness = if stale_on_arrival {
          Freshness::Stale
        } else {
          Freshness::Fresh
        };
        Ok(value)
      }
      Err(err) => {
        self.error = Some(err.clone());
        self.freshness = Freshness::Errored;
        Err(err)
      }
    }
  }
}
