//! The per-backend compiler contract.

use super::catalog::{CatalogQuery, CatalogResults};
use super::{CompiledQuery, ddl};
use crate::ast::{DuplicateKey, EqualsOneOf, JoinKind, LimitClause, Node, OrderClause, Value};
use crate::binder::Binder;
use crate::error::{SqlError, SqlResult};
use crate::schema::{Column, ColumnType, ForeignKey, Index, Table, TableDiff};
use tracing::debug;

/// One row of a backend's type table.
#[derive(Debug, Clone, Copy)]
pub struct TypeMapping {
    pub column_type: ColumnType,
    /// Native name emitted in DDL.
    pub ddl: &'static str,
    /// Catalog names read back as this type.
    pub catalog: &'static [&'static str],
}

/// Dialect compiler for one backend.
///
/// `render` is an exhaustive match over [`Node`] in every implementation; the
/// hooks below carry the policies that differ between backends.
pub trait Driver: Send + Sync {
    /// Backend name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Prefix prepended to every physical table, index and constraint name.
    fn table_prefix(&self) -> &str;

    /// Quote an identifier, doubling embedded quote characters.
    fn quote_identifier(&self, name: &str) -> String;

    /// Quote a physical name after applying the table prefix.
    fn quote_table(&self, name: &str) -> String {
        self.quote_identifier(&format!("{}{}", self.table_prefix(), name))
    }

    /// Logical name for a physical one.
    fn strip_prefix<'a>(&self, name: &'a str) -> &'a str {
        name.strip_prefix(self.table_prefix()).unwrap_or(name)
    }

    fn placeholder(&self, key: &str) -> String {
        format!(":{}", key)
    }

    /// Coerce a constant into the backend's canonical form before binding.
    fn normalize_value(&self, value: &Value) -> Value {
        value.clone()
    }

    fn join_keyword(&self, kind: JoinKind) -> SqlResult<&'static str> {
        Ok(kind.sql_keyword())
    }

    /// Trailing LIMIT / OFFSET text, with a leading space when not empty.
    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        let mut sql = String::new();
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }
        if let Some(n) = offset {
            sql.push_str(&format!(" OFFSET {}", n));
        }
        sql
    }

    /// Column list of an INSERT with no assigned fields.
    fn empty_insert(&self) -> &'static str {
        " DEFAULT VALUES"
    }

    fn render_equals_one_of(&self, node: &EqualsOneOf, binder: &mut Binder) -> SqlResult<String>;

    /// Upsert suffix of an INSERT.
    fn render_upsert(&self, key: &DuplicateKey, binder: &mut Binder) -> SqlResult<String>;

    /// ORDER BY / LIMIT suffix of UPDATE and DELETE.
    fn render_mutation_tail(
        &self,
        statement: &'static str,
        order: Option<&OrderClause>,
        limit: Option<&LimitClause>,
        binder: &mut Binder,
    ) -> SqlResult<String>;

    /// Render `node`. `nested` is set when the result is an operand of an
    /// enclosing expression and must be parenthesized if compound.
    fn render(&self, node: &Node, binder: &mut Binder, nested: bool) -> SqlResult<String>;

    /// Compile a root node against a fresh binder.
    fn compile(&self, node: &Node) -> SqlResult<CompiledQuery> {
        let mut binder = Binder::new();
        let sql = self.render(node, &mut binder, false)?;
        let params = binder.into_params();
        debug!(backend = self.name(), sql = %sql, params = params.len(), "compiled statement");
        Ok(CompiledQuery { sql, params })
    }

    // ---------------------------------------------------------------
    // Types
    // ---------------------------------------------------------------

    fn type_map(&self) -> &'static [TypeMapping];

    fn native_type(&self, column_type: ColumnType) -> SqlResult<&'static str> {
        self.type_map()
            .iter()
            .find(|m| m.column_type == column_type)
            .map(|m| m.ddl)
            .ok_or_else(|| SqlError::UnsupportedType {
                backend: self.name(),
                column_type: column_type.to_string(),
            })
    }

    /// Reverse lookup of a catalog type name.
    fn column_type_from_catalog(&self, native: &str) -> SqlResult<ColumnType> {
        let native = native.to_lowercase();
        self.type_map()
            .iter()
            .find(|m| m.catalog.contains(&native.as_str()))
            .map(|m| m.column_type)
            .ok_or_else(|| SqlError::UnsupportedType {
                backend: self.name(),
                column_type: native,
            })
    }

    /// Full native type of a column, with length / precision / values.
    fn column_type_sql(&self, column: &Column) -> SqlResult<String>;

    // ---------------------------------------------------------------
    // DDL
    // ---------------------------------------------------------------

    /// `"name" TYPE [NOT NULL] [DEFAULT …]`, without identity.
    fn column_definition(&self, column: &Column) -> SqlResult<String> {
        ddl::column_definition(self, column)
    }

    /// Table with its base columns only.
    fn create_table(&self, table: &Table) -> SqlResult<String> {
        ddl::create_table(self, table)
    }

    fn create_index(&self, table: &str, index: &Index) -> String;

    fn create_foreign_key(&self, table: &str, fk: &ForeignKey) -> String {
        ddl::create_foreign_key(self, table, fk)
    }

    /// Extra constraints a column needs after creation (Postgres enum checks).
    fn column_constraints(&self, _table: &str, _column: &Column) -> SqlResult<Vec<String>> {
        Ok(Vec::new())
    }

    fn add_column(&self, table: &str, column: &Column) -> SqlResult<Vec<String>> {
        let mut statements = vec![format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.quote_table(table),
            self.column_definition(column)?
        )];
        statements.extend(self.column_constraints(table, column)?);
        Ok(statements)
    }

    fn drop_column(&self, table: &str, column: &str) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.quote_table(table),
            self.quote_identifier(column)
        )
    }

    fn create_serial(&self, table: &str, column: &Column) -> SqlResult<String>;

    fn drop_serial(&self, table: &str, column: &Column) -> SqlResult<String>;

    fn drop_table(&self, table: &str) -> String {
        format!("DROP TABLE {}", self.quote_table(table))
    }

    fn drop_index(&self, table: &str, index: &Index) -> String;

    fn drop_foreign_key(&self, table: &str, fk: &ForeignKey) -> String;

    /// Statements creating `table` from scratch, in dependency order.
    fn table_statements(&self, table: &Table) -> SqlResult<Vec<String>> {
        ddl::table_statements(self, table)
    }

    /// Statements altering a live table by `diff`.
    fn diff_statements(&self, diff: &TableDiff) -> SqlResult<Vec<String>> {
        ddl::diff_statements(self, diff)
    }

    // ---------------------------------------------------------------
    // Introspection
    // ---------------------------------------------------------------

    /// Catalog queries describing the logical table `table`.
    fn introspection_queries(&self, table: &str) -> Vec<CatalogQuery>;

    /// Rebuild a table from the rows of [`introspection_queries`].
    ///
    /// [`introspection_queries`]: Driver::introspection_queries
    fn reconstruct_table(&self, table: &str, results: &CatalogResults) -> SqlResult<Table>;
}
