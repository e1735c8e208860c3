//! Core traits and types for the caching system.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

/// Trait for entities that can be cached.
///
/// Implementors expose the stable server-assigned id used for the per-entity
/// key and tombstones, plus the category used by the category-filter check.
pub trait Cacheable: Clone + Send + Sync + Serialize + DeserializeOwned {
  /// Server-assigned identifier (e.g., product id)
  fn id(&self) -> u64;

  /// Category the entity belongs to
  fn category(&self) -> &str;

  /// Entity type name used as the per-entity key prefix (e.g., "product")
  fn entity_type() -> &'static str;
}

/// Value stored under a cache key: one entity for per-entity keys, an
/// ordered list for category and page keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CacheEntry<T> {
  Many(Vec<T>),
  One(T),
}

impl<T> CacheEntry<T> {
  pub fn into_vec(self) -> Vec<T> {
    match self {
      CacheEntry::Many(items) => items,
      CacheEntry::One(item) => vec![item],
    }
  }
}

/// Why a resolve came back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupError {
  /// Remote fetch failed or returned nothing usable
  NotFound,
  /// The searched product is not in the requested category
  CategoryMismatch,
}

impl fmt::Display for LookupError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LookupError::NotFound => write!(f, "Product not found"),
      LookupError::CategoryMismatch => {
        write!(f, "The product does not belong to the selected category")
      }
    }
  }
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data, already filtered against tombstones
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// Set when the result was emptied for a user-visible reason
  pub error: Option<LookupError>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      error: None,
    }
  }

  /// Create a new cache result from cached data.
  pub fn from_cache(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
      error: None,
    }
  }

  pub fn with_error(mut self, error: LookupError) -> Self {
    self.error = Some(error);
    self
  }
}

/// Indicates where cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fetched from the remote API on a cache miss
  Network,
  /// Served from persistent storage
  Cache,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_entry_decodes_single_object() {
    let entry: CacheEntry<serde_json::Value> = serde_json::from_str(r#"{"id":1}"#).unwrap();
    assert_eq!(entry.into_vec().len(), 1);
  }

  #[test]
  fn test_entry_decodes_list() {
    let entry: CacheEntry<serde_json::Value> =
      serde_json::from_str(r#"[{"id":1},{"id":2}]"#).unwrap();
    assert_eq!(entry.into_vec().len(), 2);
  }

  #[test]
  fn test_with_error_keeps_source() {
    let result = CacheResult::from_cache(Vec::<u8>::new()).with_error(LookupError::NotFound);
    assert_eq!(result.source, CacheSource::Cache);
    assert_eq!(result.error, Some(LookupError::NotFound));
  }
}
