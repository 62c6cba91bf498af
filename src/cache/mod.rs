//! Generic subscriber-based query cache.
//!
//! This module provides a domain-agnostic cache that:
//! - Serves the best known value synchronously, possibly stale
//! - Deduplicates concurrent fetches of one key into a single remote call
//! - Re-fetches on explicit invalidation only (no TTL, no polling)
//! - Keeps the previous value when a fetch fails
//! - Discards fetch results superseded by a newer fetch of the same key

mod entry;
mod layer;
mod traits;

pub use entry::FetchResult;
pub use layer::{QueryCache, Subscription};
pub use traits::{CacheSnapshot, Freshness, QueryKey};
