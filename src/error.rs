//! Errors surfaced by the synchronization layer.
//!
//! Remote failures are values, not faults: the cache and the mutation gateway
//! catch them at their boundary and hand them to the caller or to subscribers.

use thiserror::Error;

/// Failure of a remote read or write.
///
/// `Clone` because a single in-flight fetch result is shared by every caller
/// attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
  /// Remote unreachable, timed out, or answered with a non-2xx status
  #[error("network failure: {0}")]
  NetworkFailure(String),
  /// Well-formed GraphQL response carrying an `errors` payload
  #[error("remote error: {0}")]
  RemoteError(String),
  /// Response body could not be decoded
  #[error("could not decode response: {0}")]
  SerializationFailure(String),
}

impl SyncError {
  pub fn network(operation: &str, err: impl std::fmt::Display) -> Self {
    Self::NetworkFailure(format!("{}: {}", operation, err))
  }

  pub fn serialization(operation: &str, err: impl std::fmt::Display) -> Self {
    Self::SerializationFailure(format!("{}: {}", operation, err))
  }
}
