//! Cached catalog client that wraps CatalogClient with transparent caching.

use color_eyre::Result;
use tracing::warn;

use crate::cache::{
  CacheResult, CacheSettings, CatalogQuery, InvalidationScope, KeyValueStore, ProductCache,
};
use crate::config::Config;

use super::client::CatalogClient;
use super::session::Session;
use super::types::{NewProduct, Product};

/// Catalog client with transparent caching and tombstones.
///
/// Reads go through the product cache; writes hit the remote API and are
/// mirrored into the cache.
pub struct CachedCatalogClient<S: KeyValueStore> {
  inner: CatalogClient,
  cache: ProductCache<S>,
}

impl<S: KeyValueStore> CachedCatalogClient<S> {
  /// Create a new cached client over the given storage.
  pub fn new(config: &Config, storage: S) -> Result<Self> {
    let inner = CatalogClient::new(config)?;
    let cache = ProductCache::new(
      storage,
      CacheSettings {
        page_size: config.catalog.page_size,
        categories: config.catalog.categories.clone(),
      },
    );

    Ok(Self::from_parts(inner, cache))
  }

  pub fn from_parts(inner: CatalogClient, cache: ProductCache<S>) -> Self {
    Self { inner, cache }
  }

  #[cfg(test)]
  pub fn cache(&self) -> &ProductCache<S> {
    &self.cache
  }

  /// Resolve the products for the current query state.
  pub async fn products(&self, query: &CatalogQuery) -> CacheResult<Vec<Product>> {
    self
      .cache
      .resolve(query, |request| {
        let inner = self.inner.clone();
        async move { inner.fetch(&request).await }
      })
      .await
  }

  /// Look up one product by id through the cache.
  pub async fn product(&self, id: u64) -> Option<Product> {
    self
      .products(&CatalogQuery::by_id(id))
      .await
      .data
      .into_iter()
      .next()
  }

  /// Create a product and cache it under its new id.
  pub async fn create_product(&self, product: &NewProduct) -> Result<Product> {
    let created = self.inner.create_product(product).await?;
    self.cache.write_through_upsert(&created);
    Ok(created)
  }

  /// Update a product and refresh its single-product entry.
  pub async fn update_product(&self, id: u64, product: &NewProduct) -> Result<Product> {
    let updated = self.inner.update_product(id, product).await?;
    self.cache.write_through_upsert(&updated);
    Ok(updated)
  }

  /// Hide a product locally, then ask the server to delete it.
  ///
  /// The remote delete is independent of the local invalidation; its
  /// failure is logged and the product stays hidden.
  pub async fn delete_product(&self, id: u64, scope: &InvalidationScope) {
    self.cache.invalidate_on_delete::<Product>(id, scope);

    if let Err(e) = self.inner.delete_product(id).await {
      warn!(id, error = %e, "remote delete failed");
    }
  }

  /// Wipe every cached entry, tombstones and session included.
  pub fn clear_all(&self) {
    self.cache.clear_all();
  }

  pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
    let token = self.inner.login(username, password).await?;
    let session = Session {
      token,
      username: username.to_string(),
    };
    session.save(self.cache.storage())?;
    Ok(session)
  }

  pub fn logout(&self) -> Result<()> {
    Session::forget(self.cache.storage())
  }

  pub fn session(&self) -> Result<Option<Session>> {
    Session::restore(self.cache.storage())
  }

  /// The current session, failing when nobody is logged in.
  pub fn require_session(&self) -> Result<Session> {
    Session::require(self.cache.storage())
  }
}

impl<S: KeyValueStore> Clone for CachedCatalogClient<S> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
      cache: self.cache.clone(),
    }
  }
}
