//! Namespaced JSON layer over a key-value store.

use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::storage::KvStore;

/// Logical keys for everything persisted locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKey {
  AuthSession,
  CurrentIntern,
  CurrentHr,
  Profile,
  Leaves,
  HrLeaves,
  Announcements,
  Invoices,
  HrInvoices,
  Interns,
  Policies,
}

impl StorageKey {
  pub fn as_str(self) -> &'static str {
    match self {
      StorageKey::AuthSession => "authSession",
      StorageKey::CurrentIntern => "currentIntern",
      StorageKey::CurrentHr => "currentHr",
      StorageKey::Profile => "profile",
      StorageKey::Leaves => "leaves",
      StorageKey::HrLeaves => "hrLeaves",
      StorageKey::Announcements => "announcements",
      StorageKey::Invoices => "invoices",
      StorageKey::HrInvoices => "hrInvoices",
      StorageKey::Interns => "interns",
      StorageKey::Policies => "policies",
    }
  }
}

/// Override cache: JSON values under `<namespace>.<key>`.
///
/// Storage failures never propagate. A failed read is a miss and a failed
/// write is dropped; both are logged.
pub struct OverrideCache<S: KvStore> {
  store: Arc<S>,
  namespace: String,
}

impl<S: KvStore> OverrideCache<S> {
  pub fn new(store: S, namespace: impl Into<String>) -> Self {
    Self {
      store: Arc::new(store),
      namespace: namespace.into(),
    }
  }

  fn full_key(&self, key: StorageKey) -> String {
    format!("{}.{}", self.namespace, key.as_str())
  }

  /// Read and decode a value. Missing, unreadable and undecodable all map to `None`.
  pub fn get<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
    let full_key = self.full_key(key);
    let raw = match self.store.get(&full_key) {
      Ok(Some(raw)) => raw,
      Ok(None) => return None,
      Err(e) => {
        warn!(key = %full_key, error = %e, "local store read failed");
        return None;
      }
    };

    match serde_json::from_str(&raw) {
      Ok(value) => {
        debug!(key = %full_key, "override hit");
        Some(value)
      }
      Err(e) => {
        warn!(key = %full_key, error = %e, "discarding unreadable override");
        None
      }
    }
  }

  /// Encode and store a value.
  pub fn set<T: Serialize + ?Sized>(&self, key: StorageKey, value: &T) {
    let full_key = self.full_key(key);
    let raw = match serde_json::to_string(value) {
      Ok(raw) => raw,
      Err(e) => {
        warn!(key = %full_key, error = %e, "failed to encode override");
        return;
      }
    };

    if let Err(e) = self.store.set(&full_key, &raw) {
      warn!(key = %full_key, error = %e, "local store write failed");
    }
  }

  pub fn clear(&self, key: StorageKey) {
    let full_key = self.full_key(key);
    if let Err(e) = self.store.remove(&full_key) {
      warn!(key = %full_key, error = %e, "local store remove failed");
    }
  }
}

impl<S: KvStore> Clone for OverrideCache<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      namespace: self.namespace.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryStore;
  use color_eyre::{eyre::eyre, Result};

  struct BrokenStore;

  impl KvStore for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<String>> {
      Err(eyre!("disk on fire"))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
      Err(eyre!("disk on fire"))
    }

    fn remove(&self, _key: &str) -> Result<()> {
      Err(eyre!("disk on fire"))
    }
  }

  #[test]
  fn test_values_are_namespaced_json() {
    let cache = OverrideCache::new(MemoryStore::new(), "internflow");
    cache.set(StorageKey::Leaves, &vec!["L-001", "L-002"]);

    let raw = cache.store.get("internflow.leaves").unwrap();
    assert_eq!(raw.as_deref(), Some(r#"["L-001","L-002"]"#));

    let back: Option<Vec<String>> = cache.get(StorageKey::Leaves);
    assert_eq!(back, Some(vec!["L-001".to_string(), "L-002".to_string()]));
  }

  #[test]
  fn test_storage_failures_are_misses() {
    let cache = OverrideCache::new(BrokenStore, "internflow");
    cache.set(StorageKey::Profile, &42);
    let value: Option<i32> = cache.get(StorageKey::Profile);
    assert_eq!(value, None);
    cache.clear(StorageKey::Profile);
  }

  #[test]
  fn test_garbage_value_is_a_miss() {
    let store = MemoryStore::new();
    store.set("internflow.policies", "{not json").unwrap();
    let cache = OverrideCache::new(store, "internflow");
    let value: Option<serde_json::Value> = cache.get(StorageKey::Policies);
    assert!(value.is_none());
  }

  #[test]
  fn test_clear_removes_value() {
    let cache = OverrideCache::new(MemoryStore::new(), "ns");
    cache.set(StorageKey::Interns, &1);
    cache.clear(StorageKey::Interns);
    assert_eq!(cache.get::<i32>(StorageKey::Interns), None);
  }
}
