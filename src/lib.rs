//! # custom-builder
//!
//! Get custom-shaped results from the usual fluent query chains.
//!
//! A model opts in by starting its query through
//! [`custom_query`](custom::HasCustomBuilder::custom_query) instead of
//! [`query`](model::Model::query). The chain reads the same, but terminal
//! calls hand the raw row collection to the supplied callback and return the
//! callback's output. Without a callback the builder behaves exactly like
//! the standard one.
//!
//! ```
//! use custom_builder::{HasCustomBuilder, Model, ModelResult};
//!
//! #[derive(Debug)]
//! struct Order {
//!     id: i64,
//!     status: String,
//! }
//!
//! impl Model for Order {
//!     fn table() -> &'static str {
//!         "orders"
//!     }
//!
//!     fn from_row(row: &sqlx::postgres::PgRow) -> ModelResult<Self> {
//!         use sqlx::Row;
//!         Ok(Self {
//!             id: row.try_get("id")?,
//!             status: row.try_get("status")?,
//!         })
//!     }
//! }
//!
//! let query = Order::custom_query(|orders| {
//!     orders.into_iter().map(|o| o.id).collect::<Vec<_>>()
//! })
//! .select("id, status")
//! .where_eq("status", "pending")
//! .latest();
//!
//! // query.get(&pool) now returns ModelResult<Vec<i64>>
//! assert_eq!(
//!     query.to_sql(),
//!     "SELECT id, status FROM orders WHERE status = $1 ORDER BY created_at DESC"
//! );
//! ```

pub mod custom;
pub mod error;
pub mod model;
pub mod query;

#[cfg(test)]
mod tests;

pub use custom::*;
pub use error::*;
pub use model::*;
pub use query::*;
