//! Result wrapper recording which tier answered a read.

use serde::Serialize;

/// Data plus the tier it came from.
#[derive(Debug, Clone)]
pub struct Sourced<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: DataSource,
}

impl<T> Sourced<T> {
  pub fn backend(data: T) -> Self {
    Self {
      data,
      source: DataSource::Backend,
    }
  }

  pub fn cached(data: T) -> Self {
    Self {
      data,
      source: DataSource::Override,
    }
  }

  pub fn mock(data: T) -> Self {
    Self {
      data,
      source: DataSource::Mock,
    }
  }
}

/// Indicates which tier answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
  /// Live backend response
  Backend,
  /// Locally persisted value from an earlier save or read
  Override,
  /// Seed data from the mock store
  Mock,
}

impl DataSource {
  pub fn label(self) -> &'static str {
    match self {
      DataSource::Backend => "live",
      DataSource::Override => "offline: saved copy",
      DataSource::Mock => "offline: demo data",
    }
  }
}
