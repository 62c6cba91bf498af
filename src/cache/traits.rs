//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use crate::error::SyncError;

/// Key identifying one cached query (e.g. "all vacancies").
pub trait QueryKey: Clone + Eq + Hash + Debug + Send + Sync + 'static {
  /// Human-readable description used in logs
  fn description(&self) -> String;
}

/// Freshness of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
  /// Value was fetched and nothing invalidated it since
  Fresh,
  /// Servable but due for re-fetch (also the state of a never-fetched entry)
  Stale,
  /// A remote read is in flight
  Fetching,
  /// The last remote read failed; any previous value is still servable
  Errored,
}

/// Point-in-time view of a cache entry, handed to readers and subscribers.
#[derive(Debug)]
pub struct CacheSnapshot<C> {
  /// Best known value, possibly stale
  pub value: Option<Arc<C>>,
  pub freshness: Freshness,
  /// Error of the last failed fetch, cleared by the next success
  pub error: Option<SyncError>,
  /// When `value` was fetched
  pub fetched_at: Option<DateTime<Utc>>,
}

impl<C> CacheSnapshot<C> {
  /// Snapshot of a key nothing has been fetched for yet.
  pub fn empty() -> Self {
    Self {
      value: None,
      freshness: Freshness::Stale,
      error: None,
      fetched_at: None,
    }
  }

  pub fn data(&self) -> Option<&C> {
    self.value.as_deref()
  }

  /// Whether a background fetch is in flight.
  pub fn is_fetching(&self) -> bool {
    self.freshness == Freshness::Fetching
  }

  /// Fetching with nothing to show yet.
  pub fn is_pending(&self) -> bool {
    self.is_fetching() && self.value.is_none()
  }

  pub fn is_errored(&self) -> bool {
    self.freshness == Freshness::Errored
  }
}

// Derived Clone would require C: Clone.
impl<C> Clone for CacheSnapshot<C> {
  fn clone(&self) -> Self {
    Self {
      value: self.value.clone(),
      freshness: self.freshness,
      error: self.error.clone(),
      fetched_at: self.fetched_at,
    }
  }
}
