//! Session behaviour over an in-memory connection.

use pretty_assertions::assert_eq;
use serde_json::{Value as Json, json};
use sqlcraft::prelude::*;
use sqlcraft::transpiler::Row;
use sqlcraft::transpiler::catalog::postgres;
use std::collections::HashMap;
use std::sync::Mutex;

/// Records executed SQL and answers queries from canned rows keyed by SQL.
#[derive(Default)]
struct MemoryConnection {
    executed: Mutex<Vec<String>>,
    fetched: Mutex<Vec<String>>,
    responses: Mutex<HashMap<String, Vec<Row>>>,
    fail_on: Option<String>,
}

impl MemoryConnection {
    fn respond(&self, sql: &str, rows: Vec<Row>) {
        self.responses.lock().unwrap().insert(sql.to_string(), rows);
    }

    fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    fn fetch_count(&self) -> usize {
        self.fetched.lock().unwrap().len()
    }
}

impl Connection for MemoryConnection {
    async fn execute(&self, query: &CompiledQuery) -> SqlResult<u64> {
        if self.fail_on.as_deref().is_some_and(|s| query.sql.contains(s)) {
            return Err(SqlError::Database(format!("rejected: {}", query.sql)));
        }
        self.executed.lock().unwrap().push(query.sql.clone());
        Ok(1)
    }

    async fn fetch_rows(&self, query: &CompiledQuery) -> SqlResult<Vec<Row>> {
        self.fetched.lock().unwrap().push(query.sql.clone());
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(&query.sql)
            .cloned()
            .unwrap_or_default())
    }
}

fn row(pairs: &[(&str, Json)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn users() -> Table {
    Table::new("users")
        .column(Column::new("id", ColumnType::BigInt).serial())
        .column(Column::new("email", ColumnType::Varchar).not_null().max_length(120))
        .index(Index::primary(["id"]))
        .index(Index::unique(["email"]))
}

/// Catalog rows describing `users()` as Postgres reports it.
fn seed_users(db: &Database<MemoryConnection>) {
    let rows: HashMap<&str, Vec<Row>> = HashMap::from([
        (
            postgres::COLUMNS,
            vec![
                row(&[
                    ("column_name", json!("id")),
                    ("udt_name", json!("int8")),
                    ("is_nullable", json!("NO")),
                    ("is_identity", json!("YES")),
                ]),
                row(&[
                    ("column_name", json!("email")),
                    ("udt_name", json!("varchar")),
                    ("is_nullable", json!("NO")),
                    ("character_maximum_length", json!(120)),
                    ("is_identity", json!("NO")),
                ]),
            ],
        ),
        (
            postgres::CONSTRAINTS,
            vec![
                row(&[
                    ("name", json!("users_pkey")),
                    ("kind", json!("p")),
                    ("definition", json!("PRIMARY KEY (id)")),
                ]),
                row(&[
                    ("name", json!("users_email_key")),
                    ("kind", json!("u")),
                    ("definition", json!("UNIQUE (email)")),
                ]),
            ],
        ),
        (
            postgres::INDEXES,
            vec![
                row(&[
                    ("name", json!("users_pkey")),
                    (
                        "definition",
                        json!("CREATE UNIQUE INDEX users_pkey ON public.users USING btree (id)"),
                    ),
                ]),
                row(&[
                    ("name", json!("users_email_key")),
                    (
                        "definition",
                        json!("CREATE UNIQUE INDEX users_email_key ON public.users USING btree (email)"),
                    ),
                ]),
            ],
        ),
    ]);

    for query in db.driver().introspection_queries("users") {
        if let Some(rows) = rows.get(query.name) {
            db.connection().respond(&query.query.sql, rows.clone());
        }
    }
}

fn database() -> Database<MemoryConnection> {
    Database::new(MemoryConnection::default(), Dialect::Postgres.driver(""))
}

#[tokio::test]
async fn test_reflect_missing_table_is_not_found() {
    let db = database();
    let err = db.reflect("users").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(db.cached_tables(), 0);
}

#[tokio::test]
async fn test_reflect_is_cached_until_invalidated() {
    let db = database();
    seed_users(&db);

    let first = db.reflect("users").await.unwrap();
    assert!(first.is_equivalent(&users()), "{:#?}", first);
    let fetches = db.connection().fetch_count();
    assert_eq!(fetches, 3);

    let second = db.reflect("users").await.unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(db.connection().fetch_count(), fetches);

    db.invalidate_schema_cache();
    assert_eq!(db.cached_tables(), 0);
    db.reflect("users").await.unwrap();
    assert_eq!(db.connection().fetch_count(), fetches * 2);
}

#[tokio::test]
async fn test_apply_creates_missing_table() {
    let db = database();
    let statements = db.apply_ddl(&users()).await.unwrap();
    assert_eq!(
        statements,
        vec![
            "CREATE TABLE \"users\" (\"id\" BIGINT NOT NULL, \"email\" VARCHAR(120) NOT NULL)",
            "ALTER TABLE \"users\" ADD CONSTRAINT \"users_pkey\" PRIMARY KEY (\"id\")",
            "ALTER TABLE \"users\" ALTER COLUMN \"id\" ADD GENERATED BY DEFAULT AS IDENTITY",
            "ALTER TABLE \"users\" ADD CONSTRAINT \"users_email_key\" UNIQUE (\"email\")",
        ]
    );
    assert_eq!(db.connection().executed(), statements);
    assert_eq!(db.cached_tables(), 0);
}

#[tokio::test]
async fn test_apply_up_to_date_table_executes_nothing() {
    let db = database();
    seed_users(&db);
    let statements = db.apply_ddl(&users()).await.unwrap();
    assert!(statements.is_empty());
    assert!(db.connection().executed().is_empty());
}

#[tokio::test]
async fn test_apply_alters_by_diff_and_clears_cache() {
    let db = database();
    seed_users(&db);
    db.reflect("users").await.unwrap();
    assert_eq!(db.cached_tables(), 1);

    let target = users()
        .column(Column::new("nickname", ColumnType::Varchar).max_length(40))
        .index(Index::index(["nickname"]));
    let statements = db.apply_ddl(&target).await.unwrap();
    assert_eq!(
        statements,
        vec![
            "ALTER TABLE \"users\" ADD COLUMN \"nickname\" VARCHAR(40)",
            "CREATE INDEX \"users_nickname_idx\" ON \"users\" (\"nickname\")",
        ]
    );
    assert_eq!(db.connection().executed(), statements);
    assert_eq!(db.cached_tables(), 0);
}

#[tokio::test]
async fn test_failed_apply_still_clears_cache() {
    let connection = MemoryConnection {
        fail_on: Some("ADD COLUMN".to_string()),
        ..MemoryConnection::default()
    };
    let db = Database::new(connection, Dialect::Postgres.driver(""));
    seed_users(&db);
    db.reflect("users").await.unwrap();

    let target = users().column(Column::new("bio", ColumnType::Text));
    let err = db.apply_ddl(&target).await.unwrap_err();
    assert!(matches!(err, SqlError::Database(_)));
    assert_eq!(db.cached_tables(), 0);
}

#[tokio::test]
async fn test_invalid_target_is_rejected_before_reading_catalog() {
    let db = database();
    let target = Table::new("users").column(Column::new("id", ColumnType::Integer).serial());
    let err = db.apply_ddl(&target).await.unwrap_err();
    assert!(matches!(err, SqlError::Validation(_)));
    assert_eq!(db.connection().fetch_count(), 0);
}

#[tokio::test]
async fn test_compile_and_fetch_through_session() {
    let db = Database::new(MemoryConnection::default(), Dialect::Mysql.driver("wp_"));
    let select = Select::from("posts").field("title").where_eq("status", "publish");
    let query = db.compile(&select.clone().into()).unwrap();
    assert_eq!(query.sql, "SELECT `title` FROM `wp_posts` WHERE `status` = :c0");

    db.connection()
        .respond(&query.sql, vec![row(&[("title", json!("Hello"))])]);
    let rows = db.fetch(&select.into()).await.unwrap();
    assert_eq!(rows[0]["title"], json!("Hello"));
}
