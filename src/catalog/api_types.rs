//! Wire shapes for the remote catalog API.

use serde::{Deserialize, Serialize};

/// A response that is either a single object or a list of them.
///
/// `GET /products/{id}` answers with one product while list endpoints
/// answer with arrays; both normalize to a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
  Many(Vec<T>),
  One(T),
}

impl<T> OneOrMany<T> {
  pub fn into_vec(self) -> Vec<T> {
    match self {
      OneOrMany::Many(items) => items,
      OneOrMany::One(item) => vec![item],
    }
  }
}

#[derive(Debug, Serialize)]
pub struct ApiLoginRequest<'a> {
  pub username: &'a str,
  pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ApiLoginResponse {
  pub token: String,
}
