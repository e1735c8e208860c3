use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::Cacheable;

/// Product as served by the remote catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id: u64,
  pub title: String,
  pub price: f64,
  pub category: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub image: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rating: Option<Rating>,
}

/// Customer rating summary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
  pub rate: f64,
  pub count: u64,
}

impl Cacheable for Product {
  fn id(&self) -> u64 {
    self.id
  }

  fn category(&self) -> &str {
    &self.category
  }

  fn entity_type() -> &'static str {
    "product"
  }
}

/// Body for create and update calls (a product without its id)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProduct {
  pub title: String,
  pub price: f64,
  pub category: String,
  pub description: String,
  pub image: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
  #[error("Please enter a valid price.")]
  InvalidPrice,
  #[error("Title must not be empty.")]
  EmptyTitle,
  #[error("Unknown category '{0}'.")]
  UnknownCategory(String),
}

/// Raw form fields, as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
  pub title: String,
  pub price: String,
  pub category: String,
  pub description: String,
  pub image: String,
}

impl ProductForm {
  /// Prefill the form from an existing product (edit flow).
  pub fn from_product(product: &Product) -> Self {
    Self {
      title: product.title.clone(),
      price: product.price.to_string(),
      category: product.category.clone(),
      description: product.description.clone(),
      image: product.image.clone(),
    }
  }

  /// Validate against the known categories and build the request body.
  pub fn validate(&self, categories: &[String]) -> Result<NewProduct, ValidationError> {
    let price: f64 = self
      .price
      .trim()
      .parse()
      .map_err(|_| ValidationError::InvalidPrice)?;
    if !price.is_finite() || price < 0.0 {
      return Err(ValidationError::InvalidPrice);
    }

    let title = self.title.trim();
    if title.is_empty() {
      return Err(ValidationError::EmptyTitle);
    }

    if !categories.iter().any(|c| c == &self.category) {
      return Err(ValidationError::UnknownCategory(self.category.clone()));
    }

    Ok(NewProduct {
      title: title.to_string(),
      price,
      category: self.category.clone(),
      description: self.description.trim().to_string(),
      image: self.image.trim().to_string(),
    })
  }
}
