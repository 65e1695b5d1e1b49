use super::{escape_identifier, quote_literals};
use crate::ast::{
    CompareOp, DuplicateKey, EqualsOneOf, JoinKind, LimitClause, Node, OrderClause, Value,
};
use crate::binder::Binder;
use crate::error::{SqlError, SqlResult};
use crate::schema::{Column, ColumnType, ForeignKey, Index, IndexKind, Table};
use crate::transpiler::catalog::{self, CatalogQuery, CatalogResults};
use crate::transpiler::ddl::quote_list;
use crate::transpiler::dml;
use crate::transpiler::traits::{Driver, TypeMapping};

/// Largest LIMIT MySQL accepts; stands in for "no limit" before OFFSET.
const MAX_LIMIT: u64 = u64::MAX;

const DEFAULT_VARCHAR_LENGTH: u32 = 255;

const TYPE_MAP: &[TypeMapping] = &[
    TypeMapping { column_type: ColumnType::Char, ddl: "CHAR", catalog: &["char"] },
    TypeMapping { column_type: ColumnType::Varchar, ddl: "VARCHAR", catalog: &["varchar"] },
    TypeMapping { column_type: ColumnType::Text, ddl: "TEXT", catalog: &["text", "tinytext", "mediumtext", "longtext"] },
    TypeMapping { column_type: ColumnType::Json, ddl: "JSON", catalog: &["json"] },
    TypeMapping { column_type: ColumnType::Enum, ddl: "ENUM", catalog: &["enum"] },
    TypeMapping { column_type: ColumnType::Boolean, ddl: "TINYINT(1)", catalog: &["bool", "boolean"] },
    TypeMapping { column_type: ColumnType::TinyInt, ddl: "TINYINT", catalog: &["tinyint"] },
    TypeMapping { column_type: ColumnType::SmallInt, ddl: "SMALLINT", catalog: &["smallint"] },
    TypeMapping { column_type: ColumnType::Integer, ddl: "INT", catalog: &["int", "integer", "mediumint"] },
    TypeMapping { column_type: ColumnType::BigInt, ddl: "BIGINT", catalog: &["bigint"] },
    TypeMapping { column_type: ColumnType::Float, ddl: "FLOAT", catalog: &["float"] },
    TypeMapping { column_type: ColumnType::Double, ddl: "DOUBLE", catalog: &["double", "real"] },
    TypeMapping { column_type: ColumnType::Decimal, ddl: "DECIMAL", catalog: &["decimal", "numeric"] },
    TypeMapping { column_type: ColumnType::Date, ddl: "DATE", catalog: &["date"] },
    TypeMapping { column_type: ColumnType::Time, ddl: "TIME", catalog: &["time"] },
    TypeMapping { column_type: ColumnType::DateTime, ddl: "DATETIME", catalog: &["datetime", "timestamp"] },
    TypeMapping { column_type: ColumnType::Binary, ddl: "BLOB", catalog: &["blob", "tinyblob", "mediumblob", "longblob", "binary", "varbinary"] },
];

/// MySQL driver.
#[derive(Debug, Clone, Default)]
pub struct MysqlDriver {
    prefix: String,
}

impl MysqlDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

fn mysql_comparison(op: CompareOp, left: &str, right: &str) -> String {
    match op {
        CompareOp::ILike => format!("LOWER({}) LIKE LOWER({})", left, right),
        _ => dml::plain_comparison(op, left, right),
    }
}

impl Driver for MysqlDriver {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn table_prefix(&self) -> &str {
        &self.prefix
    }

    fn quote_identifier(&self, name: &str) -> String {
        escape_identifier(name, '`')
    }

    fn normalize_value(&self, value: &Value) -> Value {
        match value {
            Value::Bool(b) => Value::Int(i64::from(*b)),
            other => other.clone(),
        }
    }

    fn join_keyword(&self, kind: JoinKind) -> SqlResult<&'static str> {
        match kind {
            JoinKind::Full => Err(SqlError::not_implemented(self.name(), "FULL JOIN")),
            other => Ok(other.sql_keyword()),
        }
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (Some(l), Some(o)) => format!(" LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!(" LIMIT {}", l),
            (None, Some(o)) => format!(" LIMIT {} OFFSET {}", MAX_LIMIT, o),
            (None, None) => String::new(),
        }
    }

    fn empty_insert(&self) -> &'static str {
        " () VALUES ()"
    }

    fn render_equals_one_of(&self, node: &EqualsOneOf, binder: &mut Binder) -> SqlResult<String> {
        let field = dml::render_field(self, &node.field, binder)?;
        if node.values.is_empty() {
            return Ok("1 = 0".to_string());
        }
        let list = dml::render_constant_list(self, &node.values, binder)?;
        Ok(format!("{} IN {}", field, list))
    }

    fn render_upsert(&self, key: &DuplicateKey, binder: &mut Binder) -> SqlResult<String> {
        let assignments = if key.assignments.is_empty() {
            // No-op update keeps the statement from failing on a duplicate.
            let first = key
                .columns
                .first()
                .map(|c| self.quote_identifier(c))
                .ok_or_else(|| SqlError::Incomplete("upsert without conflict columns".to_string()))?;
            vec![format!("{} = {}", first, first)]
        } else {
            key.assignments
                .iter()
                .map(|a| dml::render_assignment(self, a, binder))
                .collect::<SqlResult<Vec<_>>>()?
        };
        Ok(format!(" ON DUPLICATE KEY UPDATE {}", assignments.join(", ")))
    }

    fn render_mutation_tail(
        &self,
        _statement: &'static str,
        order: Option<&OrderClause>,
        limit: Option<&LimitClause>,
        binder: &mut Binder,
    ) -> SqlResult<String> {
        dml::mutation_tail(self, order, limit.map(|l| l.0), binder)
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
            Node::Comparison(c) => dml::render_comparison(self, c, b, nested, mysql_comparison),
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
            Node::Offset(o) => Ok(self.limit_offset(None, Some(o.0)).trim_start().to_string()),
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
            ColumnType::Varchar => format!(
                "{}({})",
                native,
                column.max_length.unwrap_or(DEFAULT_VARCHAR_LENGTH)
            ),
            ColumnType::Char => match column.max_length {
                Some(len) => format!("{}({})", native, len),
                None => native.to_string(),
            },
            ColumnType::Enum => format!("{}({})", native, quote_literals(&column.enum_values)),
            ColumnType::Decimal => match (column.precision, column.scale) {
                (Some(p), Some(s)) => format!("{}({}, {})", native, p, s),
                (Some(p), None) => format!("{}({})", native, p),
                _ => native.to_string(),
            },
            _ => native.to_string(),
        })
    }

    fn create_index(&self, table: &str, index: &Index) -> String {
        let columns = quote_list(self, &index.columns);
        match index.kind {
            IndexKind::Primary => format!(
                "ALTER TABLE {} ADD PRIMARY KEY ({})",
                self.quote_table(table),
                columns
            ),
            IndexKind::Unique => format!(
                "CREATE UNIQUE INDEX {} ON {} ({})",
                self.quote_table(&index.name(table)),
                self.quote_table(table),
                columns
            ),
            IndexKind::Index => format!(
                "CREATE INDEX {} ON {} ({})",
                self.quote_table(&index.name(table)),
                self.quote_table(table),
                columns
            ),
        }
    }

    fn create_serial(&self, table: &str, column: &Column) -> SqlResult<String> {
        if !column.column_type.can_be_serial() {
            return Err(SqlError::Validation(format!(
                "serial column '{}' must be an integer type",
                column.name
            )));
        }
        Ok(format!(
            "ALTER TABLE {} MODIFY {} AUTO_INCREMENT",
            self.quote_table(table),
            self.column_definition(column)?
        ))
    }

    fn drop_serial(&self, table: &str, column: &Column) -> SqlResult<String> {
        Ok(format!(
            "ALTER TABLE {} MODIFY {}",
            self.quote_table(table),
            self.column_definition(column)?
        ))
    }

    fn drop_index(&self, table: &str, index: &Index) -> String {
        match index.kind {
            IndexKind::Primary => {
                format!("ALTER TABLE {} DROP PRIMARY KEY", self.quote_table(table))
            }
            _ => format!(
                "DROP INDEX {} ON {}",
                self.quote_table(&index.name(table)),
                self.quote_table(table)
            ),
        }
    }

    fn drop_foreign_key(&self, table: &str, fk: &ForeignKey) -> String {
        format!(
            "ALTER TABLE {} DROP FOREIGN KEY {}",
            self.quote_table(table),
            self.quote_table(&fk.name(table))
        )
    }

    fn introspection_queries(&self, table: &str) -> Vec<CatalogQuery> {
        catalog::mysql::queries(&format!("{}{}", self.prefix, table))
    }

    fn reconstruct_table(&self, table: &str, results: &CatalogResults) -> SqlResult<Table> {
        catalog::mysql::reconstruct(self, table, results)
    }
}
