//! Cache key derivation from the catalog query state.
//!
//! A query resolves to exactly one key shape, picked by a fixed priority:
//! id search, then category filter, then the paginated listing. The remote
//! request for a miss follows the same priority.

use std::fmt;

/// Storage key holding the tombstoned entity ids.
pub const DELETED_KEY: &str = "deletedProducts";

/// Query parameters supplied by the catalog controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
  pub search_id: Option<String>,
  pub category: Option<String>,
  pub page: Option<u32>,
}

impl CatalogQuery {
  /// Build a query, treating blank inputs as absent.
  pub fn new(search_id: Option<&str>, category: Option<&str>, page: Option<u32>) -> Self {
    Self {
      search_id: non_blank(search_id),
      category: non_blank(category),
      page,
    }
  }

  pub fn by_id(id: impl ToString) -> Self {
    Self {
      search_id: Some(id.to_string()),
      ..Self::default()
    }
  }

  #[cfg(test)]
  pub fn by_category(category: &str) -> Self {
    Self::new(None, Some(category), None)
  }

  #[cfg(test)]
  pub fn by_page(page: u32) -> Self {
    Self {
      page: Some(page),
      ..Self::default()
    }
  }

  /// Page number, defaulting to the first page.
  pub fn page(&self) -> u32 {
    self.page.unwrap_or(1).max(1)
  }

  /// True when neither an id search nor a category filter is active.
  pub fn is_paginated(&self) -> bool {
    self.search_id.is_none() && self.category.is_none()
  }

  /// True when both an id search and a category filter are active.
  pub fn is_cross_filtered(&self) -> bool {
    self.search_id.is_some() && self.category.is_some()
  }

  /// Numeric id of the active id search, if it parses.
  pub fn product_id(&self) -> Option<u64> {
    self.search_id.as_deref().and_then(|id| id.parse().ok())
  }

  /// Key for this query. `None` when the id search is not a valid id and
  /// so cannot match any entity.
  pub fn cache_key(&self, entity_type: &'static str) -> Option<CacheKey> {
    if self.search_id.is_some() {
      self
        .product_id()
        .map(|id| CacheKey::Entity { entity_type, id })
    } else if let Some(category) = &self.category {
      Some(CacheKey::Category(category.clone()))
    } else {
      Some(CacheKey::Page(self.page()))
    }
  }
}

fn non_blank(value: Option<&str>) -> Option<String> {
  value
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .map(String::from)
}

/// Key under which a cache entry is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheKey {
  /// `<entity_type>_<id>`, a single entity
  Entity { entity_type: &'static str, id: u64 },
  /// `category_<name>`, the list for one category
  Category(String),
  /// `page_<n>`, the cumulative listing up to page n
  Page(u32),
}

impl CacheKey {
  pub fn entity(entity_type: &'static str, id: u64) -> Self {
    CacheKey::Entity { entity_type, id }
  }

  pub fn is_entity(&self) -> bool {
    matches!(self, CacheKey::Entity { .. })
  }

  /// Fetch that refills this entry on a miss.
  pub fn remote_request(&self, page_size: u32) -> RemoteRequest {
    match self {
      CacheKey::Entity { id, .. } => RemoteRequest::ById(*id),
      CacheKey::Category(category) => RemoteRequest::ByCategory(category.clone()),
      CacheKey::Page(page) => RemoteRequest::Listing {
        limit: page_size.saturating_mul(*page),
      },
    }
  }
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CacheKey::Entity { entity_type, id } => write!(f, "{}_{}", entity_type, id),
      CacheKey::Category(name) => write!(f, "category_{}", name),
      CacheKey::Page(n) => write!(f, "page_{}", n),
    }
  }
}

/// Remote fetch issued on a cache miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteRequest {
  /// `GET /products/{id}`
  ById(u64),
  /// `GET /products/category/{category}`
  ByCategory(String),
  /// `GET /products?limit=N`
  Listing { limit: u32 },
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(query: &CatalogQuery) -> CacheKey {
    query.cache_key("product").unwrap()
  }

  #[test]
  fn test_id_beats_category_and_page() {
    let query = CatalogQuery::new(Some("5"), Some("jewelery"), Some(3));
    assert_eq!(key(&query).to_string(), "product_5");
    assert_eq!(key(&query).remote_request(5), RemoteRequest::ById(5));
  }

  #[test]
  fn test_category_beats_page() {
    let query = CatalogQuery::new(None, Some("men's clothing"), Some(2));
    assert_eq!(key(&query).to_string(), "category_men's clothing");
    assert_eq!(
      key(&query).remote_request(5),
      RemoteRequest::ByCategory("men's clothing".into())
    );
  }

  #[test]
  fn test_page_listing_is_cumulative() {
    let query = CatalogQuery::by_page(3);
    assert_eq!(key(&query).to_string(), "page_3");
    assert_eq!(key(&query).remote_request(5), RemoteRequest::Listing { limit: 15 });
  }

  #[test]
  fn test_blank_inputs_are_absent() {
    let query = CatalogQuery::new(Some("  "), Some(""), None);
    assert!(query.is_paginated());
    assert_eq!(key(&query), CacheKey::Page(1));
  }

  #[test]
  fn test_page_zero_clamps_to_first_page() {
    assert_eq!(CatalogQuery::by_page(0).page(), 1);
  }

  #[test]
  fn test_id_key_uses_numeric_form() {
    let query = CatalogQuery::new(Some(" 05 "), None, None);
    assert_eq!(query.product_id(), Some(5));
    assert_eq!(key(&query).to_string(), "product_5");
    assert_eq!(key(&query), CacheKey::entity("product", 5));
  }

  #[test]
  fn test_unparsable_id_has_no_key() {
    let query = CatalogQuery::new(Some("abc"), Some("jewelery"), None);
    assert!(!query.is_paginated());
    assert_eq!(query.product_id(), None);
    assert_eq!(query.cache_key("product"), None);
  }
}
