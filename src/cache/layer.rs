//! Cache layer that orchestrates caching logic with network fetching.

use color_eyre::Result;
use serde::Serialize;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::keys::{CacheKey, CatalogQuery, RemoteRequest, DELETED_KEY};
use super::storage::KeyValueStore;
use super::traits::{CacheEntry, CacheResult, Cacheable, LookupError};

/// Listing parameters shared by every resolve.
#[derive(Debug, Clone)]
pub struct CacheSettings {
  /// Number of entities surfaced per listing page
  pub page_size: u32,
  /// Known categories whose list entries are repaired on delete
  pub categories: Vec<String>,
}

/// Controller state needed to reach every entry a delete can touch.
#[derive(Debug, Clone, Default)]
pub struct InvalidationScope {
  /// Active id search, whose single-entity slot is dropped on a match
  pub search_id: Option<u64>,
  /// Highest page number the controller knows about
  pub total_pages: u32,
}

/// Read-through/write-through cache with tombstones for deleted entities.
///
/// Sits between the catalog controller and the remote API. Holds no query
/// state of its own; every call receives the state it needs.
pub struct ProductCache<S: KeyValueStore> {
  storage: Arc<S>,
  settings: CacheSettings,
}

impl<S: KeyValueStore> ProductCache<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: S, settings: CacheSettings) -> Self {
    Self {
      storage: Arc::new(storage),
      settings,
    }
  }

  pub fn storage(&self) -> &S {
    &self.storage
  }

  /// Resolve a query to a tombstone-filtered, ready-to-render list.
  ///
  /// 1. Derive the key (id, then category, then page)
  /// 2. On hit, filter the cached entities against tombstones
  /// 3. On miss, fetch, filter, then write the list and every entity back
  /// 4. Apply the category cross-check and the page window
  pub async fn resolve<T, F, Fut>(&self, query: &CatalogQuery, fetcher: F) -> CacheResult<Vec<T>>
  where
    T: Cacheable,
    F: FnOnce(RemoteRequest) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
  {
    let Some(key) = query.cache_key(T::entity_type()) else {
      debug!(search_id = ?query.search_id, "id search is not a valid id");
      return CacheResult::from_cache(Vec::new()).with_error(LookupError::NotFound);
    };

    let mut result = match self.read_entry::<T>(&key) {
      Some(cached) => {
        debug!(%key, count = cached.len(), "cache hit");
        let deleted = self.deleted_ids();
        CacheResult::from_cache(without_deleted(cached, &deleted))
      }
      None => {
        debug!(%key, "cache miss");
        let request = key.remote_request(self.settings.page_size);
        match fetcher(request).await {
          Ok(fetched) => {
            let deleted = self.deleted_ids();
            let items = without_deleted(fetched, &deleted);
            self.store_fetched(&key, &items);
            CacheResult::from_network(items)
          }
          Err(e) => {
            debug!(%key, error = %e, "remote fetch failed");
            CacheResult::from_network(Vec::new()).with_error(LookupError::NotFound)
          }
        }
      }
    };

    if query.is_cross_filtered() {
      let mismatched = matches!(
        (result.data.first(), query.category.as_deref()),
        (Some(first), Some(category)) if first.category() != category
      );
      if mismatched {
        result.data.clear();
        result.error = Some(LookupError::CategoryMismatch);
      }
    }

    if query.is_paginated() {
      let page_size = self.settings.page_size as usize;
      let skip = result.data.len().saturating_sub(page_size);
      result.data = result.data.split_off(skip);
    }

    result
  }

  /// Tombstone `id` and strip it from every entry the scope can reach.
  ///
  /// Storage failures are logged and skipped; the remaining keys are still
  /// repaired. Does not touch the remote API.
  pub fn invalidate_on_delete<T: Cacheable>(&self, id: u64, scope: &InvalidationScope) {
    let mut deleted = self.deleted_ids();
    if deleted.insert(id) {
      self.write_json(DELETED_KEY, &deleted);
    }

    for category in &self.settings.categories {
      self.rewrite_without::<T>(&CacheKey::Category(category.clone()), id);
    }

    if let Some(search_id) = scope.search_id {
      let key = CacheKey::entity(T::entity_type(), search_id);
      let matches = self
        .read_entry::<T>(&key)
        .is_some_and(|cached| cached.iter().any(|e| e.id() == id));
      if matches {
        debug!(%key, "dropping single-entity entry");
        self.remove_key(&key.to_string());
      }
    }

    for page in 1..=scope.total_pages {
      self.rewrite_without::<T>(&CacheKey::Page(page), id);
    }
  }

  /// Wipe every persisted key, tombstones included.
  pub fn clear_all(&self) {
    match self.storage.clear() {
      Ok(()) => info!("cleared all cached entries"),
      Err(e) => warn!(error = %e, "failed to clear storage"),
    }
  }

  /// Overwrite the single-entity entry after a create or edit.
  ///
  /// Category and page lists are left as they are until their next miss.
  pub fn write_through_upsert<T: Cacheable>(&self, entity: &T) {
    let key = CacheKey::entity(T::entity_type(), entity.id());
    self.write_json(&key.to_string(), entity);
  }

  /// Current tombstone set. Unreadable data counts as empty.
  pub fn deleted_ids(&self) -> BTreeSet<u64> {
    let raw = match self.storage.get(DELETED_KEY) {
      Ok(raw) => raw,
      Err(e) => {
        warn!(error = %e, "failed to read tombstones");
        None
      }
    };

    raw
      .and_then(|raw| match serde_json::from_str(&raw) {
        Ok(ids) => Some(ids),
        Err(e) => {
          warn!(error = %e, "ignoring malformed tombstone set");
          None
        }
      })
      .unwrap_or_default()
  }

  fn store_fetched<T: Cacheable>(&self, key: &CacheKey, items: &[T]) {
    // Per-entity keys hold a single object; the fan-out below covers them.
    if !key.is_entity() {
      self.write_json(&key.to_string(), &items);
    }

    for item in items {
      self.write_through_upsert(item);
    }
    debug!(%key, count = items.len(), "stored fetched entities");
  }

  fn rewrite_without<T: Cacheable>(&self, key: &CacheKey, id: u64) {
    let Some(cached) = self.read_entry::<T>(key) else {
      return;
    };

    let before = cached.len();
    let kept: Vec<T> = cached.into_iter().filter(|e| e.id() != id).collect();
    if kept.len() != before {
      debug!(%key, id, "removed tombstoned entity from entry");
    }
    self.write_json(&key.to_string(), &kept);
  }

  fn read_entry<T: Cacheable>(&self, key: &CacheKey) -> Option<Vec<T>> {
    let key = key.to_string();
    let raw = match self.storage.get(&key) {
      Ok(raw) => raw?,
      Err(e) => {
        warn!(%key, error = %e, "failed to read cache entry");
        return None;
      }
    };

    match serde_json::from_str::<CacheEntry<T>>(&raw) {
      Ok(entry) => Some(entry.into_vec()),
      Err(e) => {
        warn!(%key, error = %e, "ignoring malformed cache entry");
        None
      }
    }
  }

  fn write_json<V: Serialize + ?Sized>(&self, key: &str, value: &V) {
    let encoded = match serde_json::to_string(value) {
      Ok(encoded) => encoded,
      Err(e) => {
        warn!(key, error = %e, "failed to encode cache entry");
        return;
      }
    };

    if let Err(e) = self.storage.set(key, &encoded) {
      warn!(key, error = %e, "failed to write cache entry");
    }
  }

  fn remove_key(&self, key: &str) {
    if let Err(e) = self.storage.remove(key) {
      warn!(key, error = %e, "failed to remove cache entry");
    }
  }
}

impl<S: KeyValueStore> Clone for ProductCache<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      settings: self.settings.clone(),
    }
  }
}

fn without_deleted<T: Cacheable>(items: Vec<T>, deleted: &BTreeSet<u64>) -> Vec<T> {
  items
    .into_iter()
    .filter(|e| !deleted.contains(&e.id()))
    .collect()
}
