//! Custom query builder - run the usual fluent chains, get the results back
//! in whatever shape a caller-supplied callback produces.
//!
//! ```text
//! Order::custom_query(|orders| orders.into_iter().map(|o| o.id).collect::<Vec<_>>())
//!     .select("id, status")
//!     .where_eq("status", "pending")
//!     .latest()
//!     .get(&pool)  // Vec<i64> instead of Vec<Order>
//! ```

use std::fmt;

use serde_json::Value;
use sqlx::{Pool, Postgres};

use crate::error::ModelResult;
use crate::model::Model;
use crate::query::QueryBuilder;

/// Result transformation applied to the raw rows of a terminal query call.
///
/// `FnOnce` makes a second invocation unrepresentable: the callback runs at
/// most once per builder, after execution and hydration succeed.
pub type Transform<M, T> = Box<dyn FnOnce(Vec<M>) -> T + Send>;

/// A [`QueryBuilder`] wrapper that hands the raw result collection to a
/// transformation callback before returning it.
///
/// The callback is fixed at construction. Without one (see
/// [`CustomBuilder::new`]) the builder behaves exactly like the standard
/// builder obtained from [`Model::query`].
pub struct CustomBuilder<M: Model, T = Vec<M>> {
    query: QueryBuilder<M>,
    transform: Transform<M, T>,
}

impl<M: Model, T> fmt::Debug for CustomBuilder<M, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomBuilder")
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

impl<M: Model> CustomBuilder<M> {
    /// Builder without a callback; results pass through unmodified
    pub fn new() -> Self {
        Self {
            query: M::query(),
            transform: Box::new(|rows| rows),
        }
    }
}

impl<M: Model> Default for CustomBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model, T> CustomBuilder<M, T> {
    /// Builder whose terminal calls return `transform`'s output
    pub fn with_transform<F>(transform: F) -> Self
    where
        F: FnOnce(Vec<M>) -> T + Send + 'static,
    {
        Self {
            query: M::query(),
            transform: Box::new(transform),
        }
    }

    // Fluent passthroughs to the wrapped builder. Each re-wraps so the
    // stored transform survives the whole chain.

    pub fn select(mut self, columns: &str) -> Self {
        self.query = self.query.select(columns);
        self
    }

    pub fn select_distinct(mut self, columns: &str) -> Self {
        self.query = self.query.select_distinct(columns);
        self
    }

    pub fn where_eq<V: Into<Value>>(mut self, column: &str, value: V) -> Self {
        self.query = self.query.where_eq(column, value);
        self
    }

    pub fn where_ne<V: Into<Value>>(mut self, column: &str, value: V) -> Self {
        self.query = self.query.where_ne(column, value);
        self
    }

    pub fn where_gt<V: Into<Value>>(mut self, column: &str, value: V) -> Self {
        self.query = self.query.where_gt(column, value);
        self
    }

    pub fn where_gte<V: Into<Value>>(mut self, column: &str, value: V) -> Self {
        self.query = self.query.where_gte(column, value);
        self
    }

    pub fn where_lt<V: Into<Value>>(mut self, column: &str, value: V) -> Self {
        self.query = self.query.where_lt(column, value);
        self
    }

    pub fn where_lte<V: Into<Value>>(mut self, column: &str, value: V) -> Self {
        self.query = self.query.where_lte(column, value);
        self
    }

    pub fn where_like(mut self, column: &str, pattern: &str) -> Self {
        self.query = self.query.where_like(column, pattern);
        self
    }

    pub fn where_in<V: Into<Value>>(mut self, column: &str, values: Vec<V>) -> Self {
        self.query = self.query.where_in(column, values);
        self
    }

    pub fn where_not_in<V: Into<Value>>(mut self, column: &str, values: Vec<V>) -> Self {
        self.query = self.query.where_not_in(column, values);
        self
    }

    pub fn where_null(mut self, column: &str) -> Self {
        self.query = self.query.where_null(column);
        self
    }

    pub fn where_not_null(mut self, column: &str) -> Self {
        self.query = self.query.where_not_null(column);
        self
    }

    pub fn where_between<V: Into<Value>>(mut self, column: &str, low: V, high: V) -> Self {
        self.query = self.query.where_between(column, low, high);
        self
    }

    pub fn order_by(mut self, column: &str) -> Self {
        self.query = self.query.order_by(column);
        self
    }

    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.query = self.query.order_by_desc(column);
        self
    }

    pub fn latest(mut self) -> Self {
        self.query = self.query.latest();
        self
    }

    pub fn oldest(mut self) -> Self {
        self.query = self.query.oldest();
        self
    }

    pub fn limit(mut self, count: i64) -> Self {
        self.query = self.query.limit(count);
        self
    }

    pub fn offset(mut self, count: i64) -> Self {
        self.query = self.query.offset(count);
        self
    }

    pub fn paginate(mut self, per_page: i64, page: i64) -> Self {
        self.query = self.query.paginate(per_page, page);
        self
    }

    /// Render the wrapped query as SQL with numbered placeholders
    pub fn to_sql(&self) -> String {
        self.query.to_sql()
    }

    /// Positional parameter bindings of the wrapped query
    pub fn bindings(&self) -> Vec<Value> {
        self.query.bindings()
    }

    /// Execute the query and return the transformed result.
    ///
    /// The raw rows are exactly what [`QueryBuilder::get`] would have
    /// produced for the same chain; the callback runs once, after execution
    /// and hydration succeed. Errors surface before it is reached.
    pub async fn get(self, pool: &Pool<Postgres>) -> ModelResult<T> {
        let rows = self.query.get(pool).await?;
        Ok((self.transform)(rows))
    }

    /// Execute with `LIMIT 1` and return the transformed result.
    ///
    /// The callback sees the zero-or-one-row collection.
    pub async fn first(self, pool: &Pool<Postgres>) -> ModelResult<T> {
        self.limit(1).get(pool).await
    }

    /// Count matching rows. A scalar count is not a row collection, so the
    /// stored callback does not apply.
    pub async fn count(self, pool: &Pool<Postgres>) -> ModelResult<i64> {
        self.query.count(pool).await
    }
}

/// Entry points for models that want custom-shaped query results.
///
/// Blanket-implemented for every [`Model`], so any model can opt in without
/// touching its own definition:
///
/// - [`custom_query`](HasCustomBuilder::custom_query) builds queries whose
///   terminal calls return the callback's output instead of the hydrated
///   row collection.
/// - [`custom_query_raw`](HasCustomBuilder::custom_query_raw) is the
///   no-callback form, identical in behavior to [`Model::query`].
pub trait HasCustomBuilder: Model {
    /// Start a query whose results are reshaped by `transform`
    fn custom_query<T, F>(transform: F) -> CustomBuilder<Self, T>
    where
        F: FnOnce(Vec<Self>) -> T + Send + 'static,
    {
        CustomBuilder::with_transform(transform)
    }

    /// Start a custom query without a callback
    fn custom_query_raw() -> CustomBuilder<Self> {
        CustomBuilder::new()
    }
}

impl<M: Model> HasCustomBuilder for M {}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;
    use sqlx::postgres::PgRow;
    use sqlx::Row;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Order {
        id: i64,
        status: String,
    }

    impl Model for Order {
        fn table() -> &'static str {
            "orders"
        }

        fn from_row(row: &PgRow) -> ModelResult<Self> {
            Ok(Self {
                id: row.try_get("id")?,
                status: row.try_get("status")?,
            })
        }
    }

    fn pending_order() -> Order {
        Order {
            id: 1,
            status: "pending".to_string(),
        }
    }

    #[test]
    fn raw_builder_passes_rows_through_unmodified() {
        let builder = Order::custom_query_raw();
        let rows = vec![pending_order()];

        let out = (builder.transform)(rows.clone());
        assert_eq!(out, rows);
    }

    #[test]
    fn transform_receives_raw_rows_and_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let builder = Order::custom_query(move |orders| {
            counter.fetch_add(1, Ordering::SeqCst);
            orders.len()
        });

        let out = (builder.transform)(vec![pending_order(), pending_order()]);
        assert_eq!(out, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn transform_reshapes_pending_orders_into_plain_values() {
        let builder = Order::custom_query(|orders| {
            orders
                .into_iter()
                .map(|o| json!({ "id": o.id, "status": o.status }))
                .collect::<Vec<_>>()
        })
        .where_eq("status", "pending");

        assert_eq!(builder.to_sql(), "SELECT * FROM orders WHERE status = $1");
        assert_eq!(builder.bindings(), vec![json!("pending")]);

        let shaped = (builder.transform)(vec![pending_order()]);
        assert_eq!(shaped, vec![json!({ "id": 1, "status": "pending" })]);
    }

    #[test]
    fn transform_survives_the_whole_fluent_chain() {
        let builder = Order::custom_query(|orders| orders.len())
            .select("id, status")
            .where_eq("status", "pending")
            .latest()
            .limit(5);

        assert_eq!(
            builder.to_sql(),
            "SELECT id, status FROM orders WHERE status = $1 \
             ORDER BY created_at DESC LIMIT 5"
        );

        let out = (builder.transform)(Vec::new());
        assert_eq!(out, 0);
    }

    #[test]
    fn debug_output_shows_the_wrapped_query() {
        let builder = Order::custom_query(|orders| orders.len()).where_eq("id", 1);
        let rendered = format!("{:?}", builder);
        assert!(rendered.contains("CustomBuilder"));
        assert!(rendered.contains("orders"));
    }
}
