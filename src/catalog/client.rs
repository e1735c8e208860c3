use color_eyre::{eyre::eyre, Result};
use tracing::{debug, warn};
use url::Url;

use crate::cache::RemoteRequest;
use crate::catalog::api_types::{ApiLoginRequest, ApiLoginResponse, OneOrMany};
use crate::catalog::session::AuthError;
use crate::catalog::types::{NewProduct, Product};
use crate::config::Config;

/// Remote catalog API client
#[derive(Clone)]
pub struct CatalogClient {
  http: reqwest::Client,
  base_url: Url,
}

impl CatalogClient {
  pub fn new(config: &Config) -> Result<Self> {
    Self::with_base_url(&config.api.base_url)
  }

  pub fn with_base_url(base_url: &str) -> Result<Self> {
    let base_url =
      Url::parse(base_url).map_err(|e| eyre!("Invalid API base URL {}: {}", base_url, e))?;

    let http = reqwest::Client::builder()
      .user_agent(concat!("shopcache/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base_url })
  }

  fn endpoint(&self, segments: &[&str]) -> Result<Url> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| eyre!("API base URL cannot have a path: {}", self.base_url))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  /// URL for the fetch issued on a cache miss
  pub fn request_url(&self, request: &RemoteRequest) -> Result<Url> {
    match request {
      RemoteRequest::ById(id) => self.endpoint(&["products", id.to_string().as_str()]),
      RemoteRequest::ByCategory(category) => {
        self.endpoint(&["products", "category", category.as_str()])
      }
      RemoteRequest::Listing { limit } => {
        let mut url = self.endpoint(&["products"])?;
        url
          .query_pairs_mut()
          .append_pair("limit", &limit.to_string());
        Ok(url)
      }
    }
  }

  /// Fetch products for a cache miss, normalized to a list
  pub async fn fetch(&self, request: &RemoteRequest) -> Result<Vec<Product>> {
    let url = self.request_url(request)?;
    debug!(%url, "fetching products");

    let response = self
      .http
      .get(url.clone())
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch {}: {}", url, e))?
      .error_for_status()
      .map_err(|e| eyre!("Failed to fetch {}: {}", url, e))?;

    // Unknown ids come back as an empty 200 body, which fails to parse here.
    let products: OneOrMany<Product> = response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse products from {}: {}", url, e))?;

    Ok(products.into_vec())
  }

  /// Create a product
  pub async fn create_product(&self, product: &NewProduct) -> Result<Product> {
    let url = self.endpoint(&["products"])?;

    self
      .http
      .post(url)
      .json(product)
      .send()
      .await
      .and_then(|r| r.error_for_status())
      .map_err(|e| eyre!("Failed to save product: {}", e))?
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse created product: {}", e))
  }

  /// Replace a product
  pub async fn update_product(&self, id: u64, product: &NewProduct) -> Result<Product> {
    let url = self.endpoint(&["products", id.to_string().as_str()])?;

    let mut updated: Product = self
      .http
      .put(url)
      .json(product)
      .send()
      .await
      .and_then(|r| r.error_for_status())
      .map_err(|e| eyre!("Failed to save product {}: {}", id, e))?
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse updated product {}: {}", id, e))?;

    // The id in the path is authoritative.
    updated.id = id;
    Ok(updated)
  }

  /// Delete a product
  pub async fn delete_product(&self, id: u64) -> Result<()> {
    let url = self.endpoint(&["products", id.to_string().as_str()])?;

    self
      .http
      .delete(url)
      .send()
      .await
      .and_then(|r| r.error_for_status())
      .map_err(|e| eyre!("Failed to delete product {}: {}", id, e))?;

    Ok(())
  }

  /// Exchange credentials for an auth token
  pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
    let url = self
      .endpoint(&["auth", "login"])
      .map_err(|_| AuthError::InvalidCredentials)?;

    let response = self
      .http
      .post(url)
      .json(&ApiLoginRequest { username, password })
      .send()
      .await
      .and_then(|r| r.error_for_status());

    let body: ApiLoginResponse = match response {
      Ok(response) => response.json().await.map_err(|e| {
        warn!(error = %e, "unexpected login response");
        AuthError::InvalidCredentials
      })?,
      Err(e) => {
        warn!(error = %e, "login failed");
        return Err(AuthError::InvalidCredentials);
      }
    };

    Ok(body.token)
  }
}
