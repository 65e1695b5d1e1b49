//! Catalog introspection plumbing.
//!
//! A driver describes a table as a set of named catalog queries; the session
//! runs them and hands the rows back for reconstruction. The grammars for
//! backend-emitted definition text live in the per-backend modules.

pub mod mysql;
pub mod postgres;

use super::CompiledQuery;
use crate::binder::Binder;
use crate::ast::{Value, ValueKind};
use std::collections::HashMap;

/// A result row: column name to JSON value.
pub type Row = HashMap<String, serde_json::Value>;

/// Rows of every catalog query, keyed by query name.
pub type CatalogResults = HashMap<&'static str, Vec<Row>>;

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    pub name: &'static str,
    pub query: CompiledQuery,
}

impl CatalogQuery {
    /// Catalog query filtered by one physical table name, bound as `:c0`.
    pub fn for_table(name: &'static str, sql: &str, physical_table: &str) -> Self {
        let mut binder = Binder::new();
        let key = binder.assign(Value::String(physical_table.to_string()), ValueKind::String);
        let sql = sql.replace("{table}", &format!(":{}", key));
        Self {
            name,
            query: CompiledQuery {
                sql,
                params: binder.into_params(),
            },
        }
    }
}

/// Rows of the query `name`, empty if it was not run.
pub fn rows<'a>(results: &'a CatalogResults, name: &str) -> &'a [Row] {
    results.get(name).map(Vec::as_slice).unwrap_or(&[])
}

/// Text value of a row column; numbers are rendered as text.
pub fn text(row: &Row, key: &str) -> Option<String> {
    match lookup(row, key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Integer value of a row column, parsing text if needed.
pub fn number(row: &Row, key: &str) -> Option<i64> {
    match lookup(row, key)? {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Catalogs disagree on column-name case; try as given, then lower, then upper.
fn lookup<'a>(row: &'a Row, key: &str) -> Option<&'a serde_json::Value> {
    row.get(key)
        .or_else(|| row.get(&key.to_lowercase()))
        .or_else(|| row.get(&key.to_uppercase()))
        .filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_helpers() {
        let mut row = Row::new();
        row.insert("COLUMN_NAME".into(), serde_json::json!("id"));
        row.insert("len".into(), serde_json::json!("12"));
        row.insert("empty".into(), serde_json::Value::Null);
        assert_eq!(text(&row, "column_name").as_deref(), Some("id"));
        assert_eq!(number(&row, "len"), Some(12));
        assert_eq!(text(&row, "empty"), None);
    }

    #[test]
    fn test_table_query_binds_name() {
        let q = CatalogQuery::for_table("columns", "SELECT 1 WHERE t = {table}", "app_users");
        assert_eq!(q.query.sql, "SELECT 1 WHERE t = :c0");
        assert_eq!(q.query.param("c0"), Some(&Value::from("app_users")));
    }
}
