use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cache::SqliteStore;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub catalog: CatalogConfig,
  #[serde(default)]
  pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the product API
  #[serde(default = "default_base_url")]
  pub base_url: String,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
    }
  }
}

fn default_base_url() -> String {
  "https://fakestoreapi.com".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
  /// Products shown per listing page
  #[serde(default = "default_page_size")]
  pub page_size: u32,
  /// Highest page number repaired when a product is deleted
  #[serde(default = "default_total_pages")]
  pub total_pages: u32,
  /// Known product categories
  #[serde(default = "default_categories")]
  pub categories: Vec<String>,
}

impl Default for CatalogConfig {
  fn default() -> Self {
    Self {
      page_size: default_page_size(),
      total_pages: default_total_pages(),
      categories: default_categories(),
    }
  }
}

fn default_page_size() -> u32 {
  5
}

fn default_total_pages() -> u32 {
  4
}

fn default_categories() -> Vec<String> {
  ["electronics", "jewelery", "men's clothing", "women's clothing"]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
  /// Path of the SQLite store (default: $XDG_DATA_HOME/shopcache/store.db)
  pub path: Option<PathBuf>,
}

impl StorageConfig {
  pub fn resolved_path(&self) -> Result<PathBuf> {
    match &self.path {
      Some(path) => Ok(path.clone()),
      None => SqliteStore::default_path(),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./shopcache.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/shopcache/config.yaml
  ///
  /// Falls back to built-in defaults when no file is found.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };
    config.validate()?;

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("shopcache.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("shopcache").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    Ok(serde_yaml::from_str(contents)?)
  }

  fn validate(&self) -> Result<()> {
    if self.catalog.page_size == 0 {
      return Err(eyre!("catalog.page_size must be at least 1"));
    }
    if self.catalog.categories.is_empty() {
      return Err(eyre!("catalog.categories must not be empty"));
    }
    Ok(())
  }

  /// Get the login password from the environment.
  ///
  /// Checks SHOPCACHE_PASSWORD.
  pub fn get_password() -> Result<String> {
    std::env::var("SHOPCACHE_PASSWORD")
      .map_err(|_| eyre!("Password not found. Pass --password or set SHOPCACHE_PASSWORD."))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_file_uses_defaults() {
    let config = Config::parse("{}").unwrap();
    assert_eq!(config.api.base_url, "https://fakestoreapi.com");
    assert_eq!(config.catalog.page_size, 5);
    assert_eq!(config.catalog.categories.len(), 4);
    assert!(config.storage.path.is_none());
  }

  #[test]
  fn test_partial_override() {
    let config = Config::parse(
      "api:\n  base_url: http://localhost:3000\ncatalog:\n  page_size: 8\n",
    )
    .unwrap();
    assert_eq!(config.api.base_url, "http://localhost:3000");
    assert_eq!(config.catalog.page_size, 8);
    assert_eq!(config.catalog.total_pages, 4);
  }

  #[test]
  fn test_zero_page_size_is_rejected() {
    let config = Config::parse("catalog:\n  page_size: 0\n").unwrap();
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_load_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shopcache.yaml");
    std::fs::write(&path, "storage:\n  path: /tmp/shop.db\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.storage.path, Some(PathBuf::from("/tmp/shop.db")));
  }

  #[test]
  fn test_missing_explicit_file_is_an_error() {
    assert!(Config::load(Some(Path::new("/nonexistent/shopcache.yaml"))).is_err());
  }
}
