//! Local persistence for overrides and session state.
//!
//! This module provides:
//! - A string-keyed store trait with SQLite and in-memory backends
//! - A namespaced JSON layer that treats storage failures as cache misses
//! - The `Sourced<T>` wrapper telling callers which tier answered

mod layer;
mod source;
mod storage;

pub use layer::{OverrideCache, StorageKey};
pub use source::{DataSource, Sourced};
pub use storage::{KvStore, MemoryStore, SqliteStore};
