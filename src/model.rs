//! Model contract - the minimal surface a database entity exposes to the
//! query layer.
//!
//! A type implementing [`Model`] declares which table it lives in and how to
//! hydrate itself from a row. Everything else (persistence, relationships,
//! lifecycle) is the host application's business.

use std::fmt::Debug;

use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres};

use crate::error::ModelResult;
use crate::query::QueryBuilder;

/// Trait for types that map to rows of a database table
pub trait Model: Send + Sync + Debug + Sized {
    /// Table name for this model
    fn table() -> &'static str;

    /// Primary key column name
    fn key_column() -> &'static str {
        "id"
    }

    /// Create a model instance from a database row
    fn from_row(row: &PgRow) -> ModelResult<Self>;

    /// Get a query builder scoped to this model's table
    fn query() -> QueryBuilder<Self> {
        QueryBuilder::new().from(Self::table())
    }

    /// Find a record by primary key
    async fn find<K: Into<Value> + Send>(
        pool: &Pool<Postgres>,
        key: K,
    ) -> ModelResult<Option<Self>> {
        Self::query()
            .where_eq(Self::key_column(), key)
            .first(pool)
            .await
    }

    /// Get all records of this model
    async fn all(pool: &Pool<Postgres>) -> ModelResult<Vec<Self>> {
        Self::query().get(pool).await
    }
}
