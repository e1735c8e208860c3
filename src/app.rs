use color_eyre::{eyre::eyre, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cache::{
  CacheResult, CacheSource, CatalogQuery, InvalidationScope, KeyValueStore, LookupError,
};
use crate::catalog::cached_client::CachedCatalogClient;
use crate::catalog::types::{Product, ProductForm};
use crate::commands::{AddArgs, Command, EditArgs};
use crate::config::Config;
use crate::ui;

/// Monotonic stamp for resolve calls.
///
/// An outcome is applied only if no newer resolve started after it.
#[derive(Debug, Default)]
pub struct RequestEpoch(AtomicU64);

impl RequestEpoch {
  /// Start a new request and return its epoch.
  pub fn begin(&self) -> u64 {
    self.0.fetch_add(1, Ordering::SeqCst) + 1
  }

  pub fn is_current(&self, epoch: u64) -> bool {
    self.0.load(Ordering::SeqCst) == epoch
  }
}

/// A finished resolve, tagged with the epoch it was started under
#[derive(Debug)]
pub struct ResolveOutcome {
  pub epoch: u64,
  pub result: CacheResult<Vec<Product>>,
}

/// Query state and what is currently displayed for it
#[derive(Debug, Default)]
pub struct CatalogState {
  pub query: CatalogQuery,
  pub products: Vec<Product>,
  pub error: Option<LookupError>,
  /// Highest listing page the delete fan-out repairs
  pub total_pages: u32,
}

/// Catalog controller: owns the query state and drives the cached client
pub struct App<S: KeyValueStore> {
  client: CachedCatalogClient<S>,
  config: Config,
  state: CatalogState,
  epoch: Arc<RequestEpoch>,
  outcome_tx: mpsc::UnboundedSender<ResolveOutcome>,
  outcome_rx: mpsc::UnboundedReceiver<ResolveOutcome>,
}

impl<S: KeyValueStore> App<S> {
  pub fn new(config: Config, storage: S) -> Result<Self> {
    let client = CachedCatalogClient::new(&config, storage)?;
    Ok(Self::with_client(config, client))
  }

  pub fn with_client(config: Config, client: CachedCatalogClient<S>) -> Self {
    let state = CatalogState {
      total_pages: config.catalog.total_pages,
      ..CatalogState::default()
    };

    let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

    Self {
      client,
      config,
      state,
      epoch: Arc::new(RequestEpoch::default()),
      outcome_tx,
      outcome_rx,
    }
  }

  #[cfg(test)]
  pub fn state(&self) -> &CatalogState {
    &self.state
  }

  /// Run one command and return its rendered output.
  pub async fn run(&mut self, command: Command) -> Result<String> {
    match command {
      Command::List(args) => {
        self.set_query(args.to_query());
        self.refresh().await;
        Ok(self.render_list())
      }
      Command::Show { id } => {
        let product = self.show(id).await?;
        Ok(ui::product_detail(&product))
      }
      Command::Add(args) => {
        let product = self.add(args).await?;
        Ok(format!("Created product #{}.\n", product.id))
      }
      Command::Edit { id, fields } => {
        let product = self.edit(id, fields).await?;
        Ok(format!("Saved product #{}.\n", product.id))
      }
      Command::Delete { id, view } => {
        self.set_query(view.to_query());
        self.delete(id).await?;
        Ok(format!("Deleted product #{}.\n", id))
      }
      Command::Clear => {
        self.clear_all().await;
        Ok(self.render_list())
      }
      Command::Login { username, password } => {
        let password = match password {
          Some(p) => p,
          None => Config::get_password()?,
        };
        let session = self.client.login(&username, &password).await?;
        Ok(format!("{}\n", ui::session_line(Some(&session))))
      }
      Command::Logout => {
        self.client.logout()?;
        Ok("Logged out.\n".to_string())
      }
      Command::Whoami => {
        let session = self.client.session()?;
        Ok(format!("{}\n", ui::session_line(session.as_ref())))
      }
    }
  }

  pub fn set_query(&mut self, query: CatalogQuery) {
    if query.is_paginated() {
      self.state.total_pages = self.state.total_pages.max(query.page());
    }
    self.state.query = query;
  }

  /// Resolve the current query and wait until its outcome is applied.
  ///
  /// Outcomes of earlier resolves that are still in flight are dropped.
  pub async fn refresh(&mut self) {
    self.start_refresh();
    while let Some(outcome) = self.outcome_rx.recv().await {
      if self.apply_outcome(outcome) {
        return;
      }
    }
  }

  /// Spawn a resolve for the current query and return its epoch.
  pub fn start_refresh(&self) -> u64 {
    let epoch = self.epoch.begin();
    let client = self.client.clone();
    let query = self.state.query.clone();
    let tx = self.outcome_tx.clone();

    tokio::spawn(async move {
      let result = client.products(&query).await;
      // Ignore send errors - the app may have shut down
      let _ = tx.send(ResolveOutcome { epoch, result });
    });

    epoch
  }

  /// Store a finished resolve unless a newer one has started since.
  pub fn apply_outcome(&mut self, outcome: ResolveOutcome) -> bool {
    let ResolveOutcome { epoch, result } = outcome;
    if !self.epoch.is_current(epoch) {
      debug!(epoch, "dropping stale resolve outcome");
      return false;
    }

    if result.source == CacheSource::Network {
      info!(count = result.data.len(), "loaded products from network");
    }
    self.state.products = result.data;
    self.state.error = result.error;
    true
  }

  pub async fn show(&self, id: u64) -> Result<Product> {
    self
      .client
      .product(id)
      .await
      .ok_or_else(|| eyre!("{}: #{}", LookupError::NotFound, id))
  }

  pub async fn add(&mut self, args: AddArgs) -> Result<Product> {
    self.client.require_session()?;

    let form = ProductForm {
      title: args.title,
      price: args.price,
      category: args.category,
      description: args.description,
      image: args.image,
    };
    let new_product = form.validate(&self.config.catalog.categories)?;

    let created = self.client.create_product(&new_product).await?;
    self.state.products.push(created.clone());
    Ok(created)
  }

  pub async fn edit(&mut self, id: u64, fields: EditArgs) -> Result<Product> {
    self.client.require_session()?;

    let current = self.show(id).await?;
    let mut form = ProductForm::from_product(&current);
    if let Some(title) = fields.title {
      form.title = title;
    }
    if let Some(price) = fields.price {
      form.price = price;
    }
    if let Some(category) = fields.category {
      form.category = category;
    }
    if let Some(description) = fields.description {
      form.description = description;
    }
    if let Some(image) = fields.image {
      form.image = image;
    }
    let new_product = form.validate(&self.config.catalog.categories)?;

    let updated = self.client.update_product(id, &new_product).await?;
    if let Some(slot) = self.state.products.iter_mut().find(|p| p.id == id) {
      *slot = updated.clone();
    }
    Ok(updated)
  }

  pub async fn delete(&mut self, id: u64) -> Result<()> {
    self.client.require_session()?;

    let scope = InvalidationScope {
      search_id: self.state.query.product_id(),
      total_pages: self.state.total_pages,
    };
    self.client.delete_product(id, &scope).await;
    self.state.products.retain(|p| p.id != id);
    Ok(())
  }

  /// Wipe storage, reset the query state and reload.
  pub async fn clear_all(&mut self) {
    self.client.clear_all();
    self.state.query = CatalogQuery::default();
    self.state.error = None;
    self.state.products.clear();
    info!("reset catalog state");
    self.refresh().await;
  }

  fn render_list(&self) -> String {
    ui::product_list(&self.state.products, self.state.error)
  }
}
