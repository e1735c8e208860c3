//! Command-line surface of the catalog.

use clap::{Args, Subcommand};

use crate::cache::CatalogQuery;

#[derive(Debug, Subcommand)]
pub enum Command {
  /// List products for the given filters
  List(QueryArgs),
  /// Show one product in detail
  Show { id: u64 },
  /// Create a product (requires login)
  Add(AddArgs),
  /// Edit a product (requires login)
  Edit {
    id: u64,
    #[command(flatten)]
    fields: EditArgs,
  },
  /// Delete a product (requires login)
  ///
  /// The filters describe the view the product is deleted from.
  Delete {
    id: u64,
    #[command(flatten)]
    view: QueryArgs,
  },
  /// Clear every cached entry and reload the first page
  Clear,
  /// Log in and remember the session
  Login {
    #[arg(short, long)]
    username: String,
    /// Falls back to SHOPCACHE_PASSWORD
    #[arg(long)]
    password: Option<String>,
  },
  /// Forget the current session
  Logout,
  /// Show the logged-in user
  Whoami,
}

/// Query filters, applied by priority: id, then category, then page
#[derive(Debug, Clone, Default, Args)]
pub struct QueryArgs {
  /// Search by product id
  #[arg(long = "id")]
  pub search_id: Option<String>,
  /// Filter by category
  #[arg(short, long)]
  pub category: Option<String>,
  /// Page of the default listing
  #[arg(short, long)]
  pub page: Option<u32>,
}

impl QueryArgs {
  pub fn to_query(&self) -> CatalogQuery {
    CatalogQuery::new(
      self.search_id.as_deref(),
      self.category.as_deref(),
      self.page,
    )
  }
}

#[derive(Debug, Clone, Args)]
pub struct AddArgs {
  #[arg(long)]
  pub title: String,
  #[arg(long)]
  pub price: String,
  #[arg(long, default_value = "electronics")]
  pub category: String,
  #[arg(long, default_value = "")]
  pub description: String,
  #[arg(long, default_value = "")]
  pub image: String,
}

/// Fields to change; unset fields keep their current value
#[derive(Debug, Clone, Default, Args)]
pub struct EditArgs {
  #[arg(long)]
  pub title: Option<String>,
  #[arg(long)]
  pub price: Option<String>,
  #[arg(long)]
  pub category: Option<String>,
  #[arg(long)]
  pub description: Option<String>,
  #[arg(long)]
  pub image: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::Parser;

  #[derive(Parser)]
  struct Cli {
    #[command(subcommand)]
    command: Command,
  }

  fn parse(args: &[&str]) -> Command {
    Cli::try_parse_from(std::iter::once("shopcache").chain(args.iter().copied()))
      .unwrap()
      .command
  }

  #[test]
  fn test_list_defaults_to_first_page() {
    let Command::List(args) = parse(&["list"]) else {
      panic!("expected list");
    };
    assert_eq!(args.to_query(), CatalogQuery::default());
    assert_eq!(args.to_query().page(), 1);
  }

  #[test]
  fn test_list_with_filters() {
    let Command::List(args) = parse(&["list", "--id", "5", "-c", "jewelery"]) else {
      panic!("expected list");
    };
    let query = args.to_query();
    assert_eq!(query.search_id.as_deref(), Some("5"));
    assert!(query.is_cross_filtered());
  }

  #[test]
  fn test_delete_takes_view_filters() {
    let Command::Delete { id, view } = parse(&["delete", "3", "--page", "2"]) else {
      panic!("expected delete");
    };
    assert_eq!(id, 3);
    assert_eq!(view.to_query(), CatalogQuery::by_page(2));
  }

  #[test]
  fn test_edit_fields_are_optional() {
    let Command::Edit { id, fields } = parse(&["edit", "7", "--price", "9.99"]) else {
      panic!("expected edit");
    };
    assert_eq!(id, 7);
    assert_eq!(fields.price.as_deref(), Some("9.99"));
    assert!(fields.title.is_none());
  }
}
