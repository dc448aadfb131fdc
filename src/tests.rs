//! Tests covering builder equivalence, table scoping, instance independence,
//! and SQL rendering.

use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::custom::HasCustomBuilder;
use crate::error::ModelResult;
use crate::model::Model;

#[derive(Debug, Clone)]
struct User {
    id: Option<Uuid>,
    email: String,
    name: String,
    created_at: Option<DateTime<Utc>>,
}

impl Model for User {
    fn table() -> &'static str {
        "users"
    }

    fn from_row(row: &PgRow) -> ModelResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(Debug, Clone)]
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

mod custom_builder_properties {
    use super::*;

    #[test]
    fn raw_custom_query_builds_identical_sql_to_the_default_builder() {
        let custom = User::custom_query_raw()
            .select("id, email")
            .where_eq("status", "active")
            .latest()
            .limit(10);
        let standard = User::query()
            .select("id, email")
            .where_eq("status", "active")
            .latest()
            .limit(10);

        assert_eq!(custom.to_sql(), standard.to_sql());
        assert_eq!(custom.bindings(), standard.bindings());
    }

    #[test]
    fn callback_does_not_change_the_accumulated_query() {
        let custom = User::custom_query(|users| users.len())
            .where_gt("age", 21)
            .order_by("name");
        let standard = User::query().where_gt("age", 21).order_by("name");

        assert_eq!(custom.to_sql(), standard.to_sql());
        assert_eq!(custom.bindings(), standard.bindings());
    }

    #[test]
    fn builders_query_their_own_model_table() {
        assert_eq!(User::custom_query_raw().to_sql(), "SELECT * FROM users");
        assert_eq!(Order::custom_query_raw().to_sql(), "SELECT * FROM orders");
    }

    #[test]
    fn separate_entry_point_calls_accumulate_state_independently() {
        let narrowed = Order::custom_query_raw().where_eq("status", "pending");
        let untouched = Order::custom_query_raw();

        assert_eq!(narrowed.to_sql(), "SELECT * FROM orders WHERE status = $1");
        assert_eq!(untouched.to_sql(), "SELECT * FROM orders");
    }

    #[test]
    fn reshaping_chain_keeps_the_custom_builder_type() {
        let query = User::custom_query(|users| {
            users
                .into_iter()
                .map(|u| (u.name, u.email))
                .collect::<Vec<_>>()
        })
        .select("name, email")
        .where_eq("active", true);

        assert_eq!(query.to_sql(), "SELECT name, email FROM users WHERE active = $1");
        assert_eq!(query.bindings(), vec![json!(true)]);
    }
}

mod query_builder_rendering {
    use super::*;

    #[test]
    fn bare_query_selects_everything_from_the_table() {
        assert_eq!(User::query().to_sql(), "SELECT * FROM users");
    }

    #[test]
    fn placeholders_are_numbered_across_predicates() {
        let query = User::query()
            .where_eq("role", "admin")
            .where_in("status", vec!["active", "pending"])
            .where_between("age", 18, 65);

        assert_eq!(
            query.to_sql(),
            "SELECT * FROM users WHERE role = $1 AND status IN ($2, $3) \
             AND age BETWEEN $4 AND $5"
        );
        assert_eq!(
            query.bindings(),
            vec![
                json!("admin"),
                json!("active"),
                json!("pending"),
                json!(18),
                json!(65)
            ]
        );
    }

    #[test]
    fn empty_in_list_matches_no_rows() {
        let query = User::query().where_in("id", Vec::<i64>::new());

        assert_eq!(query.to_sql(), "SELECT * FROM users WHERE FALSE");
        assert!(query.bindings().is_empty());
    }

    #[test]
    fn empty_not_in_list_matches_all_rows() {
        let query = User::query().where_not_in("id", Vec::<i64>::new());

        assert_eq!(query.to_sql(), "SELECT * FROM users WHERE TRUE");
        assert!(query.bindings().is_empty());
    }

    #[test]
    fn null_and_pattern_predicates_render_together() {
        let query = User::query()
            .where_not_null("email_verified_at")
            .where_like("name", "%Ada%");

        assert_eq!(
            query.to_sql(),
            "SELECT * FROM users WHERE email_verified_at IS NOT NULL AND name LIKE $1"
        );
        assert_eq!(query.bindings(), vec![json!("%Ada%")]);
    }

    #[test]
    fn select_distinct_renders_distinct_columns() {
        let query = User::query().select_distinct("country");

        assert_eq!(query.to_sql(), "SELECT DISTINCT country FROM users");
    }

    #[test]
    fn latest_and_oldest_order_by_created_at() {
        assert_eq!(
            User::query().latest().to_sql(),
            "SELECT * FROM users ORDER BY created_at DESC"
        );
        assert_eq!(
            User::query().oldest().to_sql(),
            "SELECT * FROM users ORDER BY created_at ASC"
        );
    }

    #[test]
    fn paginate_computes_limit_and_offset() {
        let sql = User::query().paginate(15, 3).to_sql();

        assert!(sql.contains("LIMIT 15"));
        assert!(sql.contains("OFFSET 30"));
    }

    #[test]
    fn cloned_builders_do_not_share_clause_state() {
        let base = User::query().where_eq("active", true);
        let narrowed = base.clone().where_gt("age", 30);

        assert_eq!(base.to_sql(), "SELECT * FROM users WHERE active = $1");
        assert_eq!(
            narrowed.to_sql(),
            "SELECT * FROM users WHERE active = $1 AND age > $2"
        );
    }

    #[test]
    fn rendering_is_pure_and_repeatable() {
        let query = User::query().where_eq("role", "admin").order_by("name");

        assert_eq!(query.to_sql(), query.to_sql());
        assert_eq!(query.bindings(), query.bindings());
    }
}
