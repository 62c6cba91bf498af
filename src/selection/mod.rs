//! Session-scoped store for the currently selected vacancy.
//!
//! The selection survives restarts within one login session. Volatile fields
//! named by the [`PersistPolicy`] never reach storage.

mod policy;
mod storage;
mod store;

pub use policy::{PersistPolicy, DEFAULT_EXCLUDED_FIELDS, DEFAULT_STORAGE_KEY};
pub use storage::{MemoryStorage, SessionStorage, SqliteSessionStorage};
pub use store::{SelectionState, SelectionStore};
