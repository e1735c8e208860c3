//! Login state persisted next to the product cache.

use color_eyre::Result;
use thiserror::Error;
use tracing::info;

use crate::cache::KeyValueStore;

pub const TOKEN_KEY: &str = "authToken";
pub const USERNAME_KEY: &str = "username";

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AuthError {
  #[error("Invalid username or password.")]
  InvalidCredentials,
  #[error("You must be logged in to do that.")]
  NotLoggedIn,
}

/// An authenticated user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub token: String,
  pub username: String,
}

impl Session {
  /// Restore a session from storage. Both keys must be present.
  pub fn restore<S: KeyValueStore + ?Sized>(storage: &S) -> Result<Option<Self>> {
    let token = storage.get(TOKEN_KEY)?;
    let username = storage.get(USERNAME_KEY)?;

    Ok(match (token, username) {
      (Some(token), Some(username)) => Some(Self { token, username }),
      _ => None,
    })
  }

  pub fn save<S: KeyValueStore + ?Sized>(&self, storage: &S) -> Result<()> {
    storage.set(TOKEN_KEY, &self.token)?;
    storage.set(USERNAME_KEY, &self.username)?;
    info!(username = %self.username, "logged in");
    Ok(())
  }

  pub fn forget<S: KeyValueStore + ?Sized>(storage: &S) -> Result<()> {
    storage.remove(TOKEN_KEY)?;
    storage.remove(USERNAME_KEY)?;
    info!("logged out");
    Ok(())
  }

  /// The current session, or `NotLoggedIn`.
  pub fn require<S: KeyValueStore + ?Sized>(storage: &S) -> Result<Self> {
    Self::restore(storage)?.ok_or_else(|| AuthError::NotLoggedIn.into())
  }
}
