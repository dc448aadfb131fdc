//! Fluent query builder for SELECT statements.
//!
//! Accumulates clauses through self-consuming chain calls, renders
//! placeholder-based SQL with positional bindings, and executes against a
//! Postgres pool, hydrating rows through the model's [`from_row`].
//!
//! [`from_row`]: crate::model::Model::from_row

use std::marker::PhantomData;

use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::{Pool, Postgres, Row};

use crate::error::{ModelError, ModelResult};
use crate::model::Model;

/// Comparison operators for WHERE predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
}

impl Comparison {
    fn as_sql(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "!=",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
            Comparison::Like => "LIKE",
        }
    }
}

/// Sort direction for ORDER BY clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A single WHERE predicate
#[derive(Debug, Clone)]
enum Predicate {
    Compare {
        column: String,
        cmp: Comparison,
        value: Value,
    },
    In {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },
    Null {
        column: String,
        negated: bool,
    },
    Between {
        column: String,
        low: Value,
        high: Value,
    },
}

impl Predicate {
    /// Append this predicate to `sql`, pushing bound values onto `args`.
    /// Placeholder numbers continue from the current length of `args`.
    fn render(&self, sql: &mut String, args: &mut Vec<Value>) {
        match self {
            Predicate::Compare { column, cmp, value } => {
                args.push(value.clone());
                sql.push_str(&format!("{} {} ${}", column, cmp.as_sql(), args.len()));
            }
            Predicate::In {
                column,
                values,
                negated,
            } => {
                if values.is_empty() {
                    // IN over an empty set matches nothing, NOT IN everything
                    sql.push_str(if *negated { "TRUE" } else { "FALSE" });
                    return;
                }
                let keyword = if *negated { "NOT IN" } else { "IN" };
                sql.push_str(&format!("{} {} (", column, keyword));
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(", ");
                    }
                    args.push(value.clone());
                    sql.push_str(&format!("${}", args.len()));
                }
                sql.push(')');
            }
            Predicate::Null { column, negated } => {
                let keyword = if *negated { "IS NOT NULL" } else { "IS NULL" };
                sql.push_str(&format!("{} {}", column, keyword));
            }
            Predicate::Between { column, low, high } => {
                args.push(low.clone());
                let first = args.len();
                args.push(high.clone());
                sql.push_str(&format!("{} BETWEEN ${} AND ${}", column, first, args.len()));
            }
        }
    }
}

/// Query builder for constructing SELECT queries
#[derive(Debug)]
pub struct QueryBuilder<M = ()> {
    table: Option<String>,
    columns: Vec<String>,
    distinct: bool,
    predicates: Vec<Predicate>,
    ordering: Vec<(String, SortOrder)>,
    limit_count: Option<i64>,
    offset_count: Option<i64>,
    _model: PhantomData<M>,
}

// Manual impl so cloning never requires M: Clone
impl<M> Clone for QueryBuilder<M> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            columns: self.columns.clone(),
            distinct: self.distinct,
            predicates: self.predicates.clone(),
            ordering: self.ordering.clone(),
            limit_count: self.limit_count,
            offset_count: self.offset_count,
            _model: PhantomData,
        }
    }
}

impl<M> Default for QueryBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> QueryBuilder<M> {
    /// Create a new, empty query builder
    pub fn new() -> Self {
        Self {
            table: None,
            columns: Vec::new(),
            distinct: false,
            predicates: Vec::new(),
            ordering: Vec::new(),
            limit_count: None,
            offset_count: None,
            _model: PhantomData,
        }
    }

    /// Add SELECT columns, given as a comma-separated list
    pub fn select(mut self, columns: &str) -> Self {
        self.columns
            .extend(columns.split(',').map(|c| c.trim().to_string()));
        self
    }

    /// Add SELECT DISTINCT columns
    pub fn select_distinct(mut self, columns: &str) -> Self {
        self.distinct = true;
        self.select(columns)
    }

    /// Set the FROM table
    pub fn from(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    fn compare(mut self, column: &str, cmp: Comparison, value: Value) -> Self {
        self.predicates.push(Predicate::Compare {
            column: column.to_string(),
            cmp,
            value,
        });
        self
    }

    /// Add a WHERE equality condition
    pub fn where_eq<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.compare(column, Comparison::Eq, value.into())
    }

    /// Add a WHERE inequality condition
    pub fn where_ne<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.compare(column, Comparison::Ne, value.into())
    }

    /// Add a WHERE greater-than condition
    pub fn where_gt<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.compare(column, Comparison::Gt, value.into())
    }

    /// Add a WHERE greater-than-or-equal condition
    pub fn where_gte<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.compare(column, Comparison::Gte, value.into())
    }

    /// Add a WHERE less-than condition
    pub fn where_lt<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.compare(column, Comparison::Lt, value.into())
    }

    /// Add a WHERE less-than-or-equal condition
    pub fn where_lte<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.compare(column, Comparison::Lte, value.into())
    }

    /// Add a WHERE LIKE condition
    pub fn where_like(self, column: &str, pattern: &str) -> Self {
        self.compare(column, Comparison::Like, Value::String(pattern.to_string()))
    }

    /// Add a WHERE IN condition
    pub fn where_in<T: Into<Value>>(mut self, column: &str, values: Vec<T>) -> Self {
        self.predicates.push(Predicate::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
        });
        self
    }

    /// Add a WHERE NOT IN condition
    pub fn where_not_in<T: Into<Value>>(mut self, column: &str, values: Vec<T>) -> Self {
        self.predicates.push(Predicate::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            negated: true,
        });
        self
    }

    /// Add a WHERE IS NULL condition
    pub fn where_null(mut self, column: &str) -> Self {
        self.predicates.push(Predicate::Null {
            column: column.to_string(),
            negated: false,
        });
        self
    }

    /// Add a WHERE IS NOT NULL condition
    pub fn where_not_null(mut self, column: &str) -> Self {
        self.predicates.push(Predicate::Null {
            column: column.to_string(),
            negated: true,
        });
        self
    }

    /// Add a WHERE BETWEEN condition
    pub fn where_between<T: Into<Value>>(mut self, column: &str, low: T, high: T) -> Self {
        self.predicates.push(Predicate::Between {
            column: column.to_string(),
            low: low.into(),
            high: high.into(),
        });
        self
    }

    /// Add an ORDER BY clause (ascending)
    pub fn order_by(mut self, column: &str) -> Self {
        self.ordering.push((column.to_string(), SortOrder::Asc));
        self
    }

    /// Add an ORDER BY clause (descending)
    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.ordering.push((column.to_string(), SortOrder::Desc));
        self
    }

    /// Order by `created_at`, newest first
    pub fn latest(self) -> Self {
        self.order_by_desc("created_at")
    }

    /// Order by `created_at`, oldest first
    pub fn oldest(self) -> Self {
        self.order_by("created_at")
    }

    /// Add a LIMIT clause
    pub fn limit(mut self, count: i64) -> Self {
        self.limit_count = Some(count);
        self
    }

    /// Add an OFFSET clause
    pub fn offset(mut self, count: i64) -> Self {
        self.offset_count = Some(count);
        self
    }

    /// Add pagination (LIMIT + OFFSET)
    pub fn paginate(self, per_page: i64, page: i64) -> Self {
        self.limit(per_page).offset((page - 1) * per_page)
    }

    /// Render the query as SQL with numbered placeholders
    pub fn to_sql(&self) -> String {
        self.render().0
    }

    /// Positional parameter bindings, in placeholder order
    pub fn bindings(&self) -> Vec<Value> {
        self.render().1
    }

    fn render(&self) -> (String, Vec<Value>) {
        let mut sql = String::from(if self.distinct {
            "SELECT DISTINCT "
        } else {
            "SELECT "
        });
        let mut args = Vec::new();

        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }

        if let Some(table) = &self.table {
            sql.push_str(&format!(" FROM {}", table));
        }

        for (i, predicate) in self.predicates.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            predicate.render(&mut sql, &mut args);
        }

        if !self.ordering.is_empty() {
            let clauses: Vec<String> = self
                .ordering
                .iter()
                .map(|(column, order)| format!("{} {}", column, order.as_sql()))
                .collect();
            sql.push_str(&format!(" ORDER BY {}", clauses.join(", ")));
        }

        if let Some(limit) = self.limit_count {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        if let Some(offset) = self.offset_count {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        (sql, args)
    }
}

impl<M: Model> QueryBuilder<M> {
    /// Execute the query and hydrate all matching rows
    pub async fn get(self, pool: &Pool<Postgres>) -> ModelResult<Vec<M>> {
        let (sql, args) = self.render();
        tracing::debug!(table = M::table(), sql = %sql, "executing query");

        let mut query = sqlx::query(&sql);
        for value in args {
            query = bind_value(query, value);
        }

        let rows = query.fetch_all(pool).await?;
        rows.iter().map(M::from_row).collect()
    }

    /// Execute the query and hydrate the first matching row
    pub async fn first(self, pool: &Pool<Postgres>) -> ModelResult<Option<M>> {
        let mut rows = self.limit(1).get(pool).await?;
        Ok(rows.pop())
    }

    /// Execute the query and hydrate the first matching row, or error
    pub async fn first_or_fail(self, pool: &Pool<Postgres>) -> ModelResult<M> {
        self.first(pool)
            .await?
            .ok_or_else(|| ModelError::NotFound(M::table().to_string()))
    }

    /// Count matching rows
    pub async fn count(mut self, pool: &Pool<Postgres>) -> ModelResult<i64> {
        self.columns = vec!["COUNT(*)".to_string()];
        // ORDER BY, LIMIT and OFFSET do not apply to a bare aggregate; a
        // leftover OFFSET would skip the single result row
        self.ordering.clear();
        self.limit_count = None;
        self.offset_count = None;
        let (sql, args) = self.render();
        tracing::debug!(table = M::table(), sql = %sql, "executing count query");

        let mut query = sqlx::query(&sql);
        for value in args {
            query = bind_value(query, value);
        }

        let row = query.fetch_one(pool).await?;
        let count: i64 = row.try_get(0)?;
        Ok(count)
    }
}

/// Bind a JSON operand onto a query using its native Postgres type
fn bind_value(
    query: sqlx::query::Query<'_, Postgres, PgArguments>,
    value: Value,
) -> sqlx::query::Query<'_, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else {
                query.bind(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => query.bind(s),
        other => query.bind(other),
    }
}
