//! Plain-text rendering for command output.

use std::fmt::Write;

use crate::cache::LookupError;
use crate::catalog::session::Session;
use crate::catalog::types::{Product, Rating};

const MAX_STARS: usize = 5;

/// Render a product listing, or the reason it is empty.
pub fn product_list(products: &[Product], error: Option<LookupError>) -> String {
  if let Some(error) = error {
    return format!("{}.\n", error);
  }
  if products.is_empty() {
    return "No products found.\n".to_string();
  }

  let title_width = products
    .iter()
    .map(|p| p.title.chars().count())
    .max()
    .unwrap_or(0)
    .min(48);

  let mut out = String::new();
  for product in products {
    let _ = writeln!(
      out,
      "{:>4}  {:<width$}  {:>9}  {}",
      product.id,
      truncate(&product.title, title_width),
      format!("${:.2}", product.price),
      product.category,
      width = title_width,
    );
  }
  out
}

/// Render the detail view of one product.
pub fn product_detail(product: &Product) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "{} (#{})", product.title, product.id);
  let _ = writeln!(out, "{}", product.category);
  let _ = writeln!(out, "${:.2}", product.price);
  if let Some(rating) = &product.rating {
    let _ = writeln!(out, "{}", rating_line(rating));
  }
  if !product.image.is_empty() {
    let _ = writeln!(out, "{}", product.image);
  }
  if !product.description.is_empty() {
    let _ = writeln!(out, "\n{}", product.description);
  }
  out
}

pub fn rating_line(rating: &Rating) -> String {
  format!(
    "{} ({} - {} reviews)",
    stars(rating.rate),
    rating.rate,
    rating.count
  )
}

/// Rounded filled stars out of five.
pub fn stars(rate: f64) -> String {
  let filled = if rate.is_finite() {
    rate.round().clamp(0.0, MAX_STARS as f64) as usize
  } else {
    0
  };
  "★".repeat(filled) + &"☆".repeat(MAX_STARS - filled)
}

pub fn session_line(session: Option<&Session>) -> String {
  match session {
    Some(session) => format!("Welcome, {}!", session.username),
    None => "Not logged in.".to_string(),
  }
}

fn truncate(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    return s.to_string();
  }
  let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
  out.push('…');
  out
}
