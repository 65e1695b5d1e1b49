use super::{escape_identifier, quote_literals};
use crate::ast::{
    DuplicateKey, EqualsOneOf, LimitClause, Node, OrderClause, Value, ValueKind,
    values::{DATE_FORMAT, DATETIME_FORMAT, TIME_FORMAT},
};
use crate::binder::Binder;
use crate::error::{SqlError, SqlResult};
use crate::schema::{Column, ColumnType, ForeignKey, Index, IndexKind, Table};
use crate::transpiler::catalog::{self, CatalogQuery, CatalogResults};
use crate::transpiler::ddl::quote_list;
use crate::transpiler::dml;
use crate::transpiler::traits::{Driver, TypeMapping};

const TYPE_MAP: &[TypeMapping] = &[
    TypeMapping { column_type: ColumnType::Char, ddl: "CHAR", catalog: &["bpchar", "char", "character"] },
    TypeMapping { column_type: ColumnType::Varchar, ddl: "VARCHAR", catalog: &["varchar", "character varying"] },
    TypeMapping { column_type: ColumnType::Text, ddl: "TEXT", catalog: &["text"] },
    TypeMapping { column_type: ColumnType::Json, ddl: "JSONB", catalog: &["jsonb", "json"] },
    // Enums are TEXT plus a CHECK constraint; recovered from the constraint.
    TypeMapping { column_type: ColumnType::Enum, ddl: "TEXT", catalog: &[] },
    TypeMapping { column_type: ColumnType::Boolean, ddl: "BOOLEAN", catalog: &["bool", "boolean"] },
    TypeMapping { column_type: ColumnType::SmallInt, ddl: "SMALLINT", catalog: &["int2", "smallint"] },
    TypeMapping { column_type: ColumnType::Integer, ddl: "INTEGER", catalog: &["int4", "integer"] },
    TypeMapping { column_type: ColumnType::BigInt, ddl: "BIGINT", catalog: &["int8", "bigint"] },
    TypeMapping { column_type: ColumnType::Float, ddl: "REAL", catalog: &["float4", "real"] },
    TypeMapping { column_type: ColumnType::Double, ddl: "DOUBLE PRECISION", catalog: &["float8", "double precision"] },
    TypeMapping { column_type: ColumnType::Decimal, ddl: "NUMERIC", catalog: &["numeric", "decimal"] },
    TypeMapping { column_type: ColumnType::Date, ddl: "DATE", catalog: &["date"] },
    TypeMapping { column_type: ColumnType::Time, ddl: "TIME", catalog: &["time"] },
    TypeMapping { column_type: ColumnType::DateTime, ddl: "TIMESTAMP", catalog: &["timestamp"] },
    TypeMapping { column_type: ColumnType::Binary, ddl: "BYTEA", catalog: &["bytea"] },
    TypeMapping { column_type: ColumnType::Uuid, ddl: "UUID", catalog: &["uuid"] },
];

/// PostgreSQL driver.
#[derive(Debug, Clone, Default)]
pub struct PostgresDriver {
    prefix: String,
}

impl PostgresDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn constraint_name(&self, table: &str, column: &str) -> String {
        self.quote_table(&format!("{}_{}_enum", table, column))
    }
}

/// Element type used to cast a bound array literal.
fn array_element_type(kind: Option<ValueKind>) -> &'static str {
    match kind {
        Some(ValueKind::Bool) => "boolean",
        Some(ValueKind::Integer) => "bigint",
        Some(ValueKind::Float) => "double precision",
        Some(ValueKind::DateTime) => "timestamp",
        Some(ValueKind::Date) => "date",
        Some(ValueKind::Time) => "time",
        _ => "text",
    }
}

/// Serialize a list as a Postgres array literal, e.g. `{"a","b \"c\""}`.
pub fn array_literal(items: &[Value]) -> Value {
    fn quoted(s: &str) -> String {
        format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
    }
    let elements: Vec<String> = items
        .iter()
        .map(|item| match item {
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(n) => n.to_string(),
            Value::String(s) => quoted(s),
            Value::DateTime(ts) => quoted(&ts.format(DATETIME_FORMAT).to_string()),
            Value::Date(d) => quoted(&d.format(DATE_FORMAT).to_string()),
            Value::Time(t) => quoted(&t.format(TIME_FORMAT).to_string()),
            // Arrays are built without NULL or binary elements.
            Value::Null | Value::Bytes(_) => "NULL".to_string(),
        })
        .collect();
    Value::String(format!("{{{}}}", elements.join(",")))
}

impl Driver for PostgresDriver {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn table_prefix(&self) -> &str {
        &self.prefix
    }

    fn quote_identifier(&self, name: &str) -> String {
        escape_identifier(name, '"')
    }

    fn render_equals_one_of(&self, node: &EqualsOneOf, binder: &mut Binder) -> SqlResult<String> {
        let field = dml::render_field(self, &node.field, binder)?;
        // An empty array has no element type to cast to.
        if node.values.is_empty() {
            return Ok("1 = 0".to_string());
        }
        let key = binder.bind_array(&node.values, &array_literal);
        Ok(format!(
            "{} = ANY(CAST({} AS {}[]))",
            field,
            self.placeholder(&key),
            array_element_type(node.values.kind())
        ))
    }

    fn render_upsert(&self, key: &DuplicateKey, binder: &mut Binder) -> SqlResult<String> {
        let target = quote_list(self, &key.columns);
        if key.assignments.is_empty() {
            return Ok(format!(" ON CONFLICT ({}) DO NOTHING", target));
        }
        let assignments = key
            .assignments
            .iter()
            .map(|a| dml::render_assignment(self, a, binder))
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(format!(
            " ON CONFLICT ({}) DO UPDATE SET {}",
            target,
            assignments.join(", ")
        ))
    }

    fn render_mutation_tail(
        &self,
        statement: &'static str,
        order: Option<&OrderClause>,
        limit: Option<&LimitClause>,
        _binder: &mut Binder,
    ) -> SqlResult<String> {
        if order.is_some() {
            return Err(SqlError::not_implemented(
                self.name(),
                format!("ORDER BY on {}", statement),
            ));
        }
        if limit.is_some() {
            return Err(SqlError::not_implemented(
                self.name(),
                format!("LIMIT on {}", statement),
            ));
        }
        Ok(String::new())
    }

    fn render(&self, node: &Node, b: &mut Binder, nested: bool) -> SqlResult<String> {
        match node {
            Node::Select(s) => {
                let sql = dml::render_select(self, s, b)?;
                Ok(if nested { format!("({})", sql) } else { sql })
            }
            Node::Insert(i) => dml::render_insert(self, i, b),
            Node::Update(u) => dml::render_update(self, u, b),
            Node::Delete(d) => dml::render_delete(self, d, b),
            Node::FieldName(f) => dml::render_field(self, f, b),
            Node::Constant(c) => Ok(dml::render_constant(self, c, b)),
            Node::ConstantArray(a) => dml::render_constant_list(self, a, b),
            Node::Comparison(c) => {
                dml::render_comparison(self, c, b, nested, dml::plain_comparison)
            }
            Node::Boolean(o) => dml::render_boolean(self, o, b, nested),
            Node::Unary(u) => dml::render_unary(self, u, b),
            Node::Arithmetic(a) => dml::render_arithmetic(self, a, b, nested),
            Node::Function(f) => dml::render_function(self, f, b),
            Node::SubQuery(q) => dml::render_sub_query(self, q, b),
            Node::EqualsOneOf(e) => {
                let sql = self.render_equals_one_of(e, b)?;
                Ok(if nested { format!("({})", sql) } else { sql })
            }
            Node::Wildcard(w) => dml::render_wildcard(self, w, b),
            Node::Null => Ok("NULL".to_string()),
            Node::Custom(c) => Ok(c.sql.clone()),
            Node::Table(t) => Ok(self.quote_table(&t.name)),
            Node::SourceTable(t) => Ok(dml::render_source_table(self, t)),
            Node::SourceSubQuery(q) => dml::render_source_sub_query(self, q, b),
            Node::Join(j) => dml::render_join(self, j, b),
            Node::Where(w) => Ok(format!("WHERE {}", self.render(&w.condition, b, false)?)),
            Node::Having(h) => Ok(format!("HAVING {}", self.render(&h.condition, b, false)?)),
            Node::GroupBy(g) => dml::render_group_by(self, g, b),
            Node::Order(o) => dml::render_order(self, o, b),
            Node::Limit(l) => Ok(format!("LIMIT {}", l.0)),
            Node::Offset(o) => Ok(format!("OFFSET {}", o.0)),
            Node::Union(u) => dml::render_union(self, u, b),
            Node::UpdateField(f) => dml::render_assignment(self, f, b),
            Node::DuplicateKey(k) => Ok(self.render_upsert(k, b)?.trim_start().to_string()),
        }
    }

    fn type_map(&self) -> &'static [TypeMapping] {
        TYPE_MAP
    }

    fn column_type_sql(&self, column: &Column) -> SqlResult<String> {
        let native = self.native_type(column.column_type)?;
        Ok(match column.column_type {
            ColumnType::Char | ColumnType::Varchar => match column.max_length {
                Some(len) => format!("{}({})", native, len),
                None => native.to_string(),
            },
            ColumnType::Decimal => match (column.precision, column.scale) {
                (Some(p), Some(s)) => format!("{}({}, {})", native, p, s),
                (Some(p), None) => format!("{}({})", native, p),
                _ => native.to_string(),
            },
            _ => native.to_string(),
        })
    }

    fn create_index(&self, table: &str, index: &Index) -> String {
        let name = self.quote_table(&index.name(table));
        let columns = quote_list(self, &index.columns);
        match index.kind {
            IndexKind::Primary => format!(
                "ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY ({})",
                self.quote_table(table),
                name,
                columns
            ),
            IndexKind::Unique => format!(
                "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({})",
                self.quote_table(table),
                name,
                columns
            ),
            IndexKind::Index => format!(
                "CREATE INDEX {} ON {} ({})",
                name,
                self.quote_table(table),
                columns
            ),
        }
    }

    fn column_constraints(&self, table: &str, column: &Column) -> SqlResult<Vec<String>> {
        if column.column_type != ColumnType::Enum {
            return Ok(Vec::new());
        }
        Ok(vec![format!(
            "ALTER TABLE {} ADD CONSTRAINT {} CHECK ({} IN ({}))",
            self.quote_table(table),
            self.constraint_name(table, &column.name),
            self.quote_identifier(&column.name),
            quote_literals(&column.enum_values)
        )])
    }

    fn create_serial(&self, table: &str, column: &Column) -> SqlResult<String> {
        if !column.column_type.can_be_serial() {
            return Err(SqlError::Validation(format!(
                "serial column '{}' must be an integer type",
                column.name
            )));
        }
        Ok(format!(
            "ALTER TABLE {} ALTER COLUMN {} ADD GENERATED BY DEFAULT AS IDENTITY",
            self.quote_table(table),
            self.quote_identifier(&column.name)
        ))
    }

    fn drop_serial(&self, table: &str, column: &Column) -> SqlResult<String> {
        Ok(format!(
            "ALTER TABLE {} ALTER COLUMN {} DROP IDENTITY",
            self.quote_table(table),
            self.quote_identifier(&column.name)
        ))
    }

    fn drop_index(&self, table: &str, index: &Index) -> String {
        let name = self.quote_table(&index.name(table));
        match index.kind {
            IndexKind::Primary | IndexKind::Unique => format!(
                "ALTER TABLE {} DROP CONSTRAINT {}",
                self.quote_table(table),
                name
            ),
            IndexKind::Index => format!("DROP INDEX {}", name),
        }
    }

    fn drop_foreign_key(&self, table: &str, fk: &ForeignKey) -> String {
        format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.quote_table(table),
            self.quote_table(&fk.name(table))
        )
    }

    fn introspection_queries(&self, table: &str) -> Vec<CatalogQuery> {
        catalog::postgres::queries(&format!("{}{}", self.prefix, table))
    }

    fn reconstruct_table(&self, table: &str, results: &CatalogResults) -> SqlResult<Table> {
        catalog::postgres::reconstruct(self, table, results)
    }
}
