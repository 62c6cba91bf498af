//! Client-side synchronization layer for captured job vacancies.
//!
//! - [`cache`]: subscriber-based query cache with single-flight fetches
//! - [`vacancy`]: record types, the GraphQL remote and the mutation gateway
//! - [`selection`]: session-scoped store for the selected vacancy

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod selection;
pub mod vacancy;

pub use error::SyncError;
