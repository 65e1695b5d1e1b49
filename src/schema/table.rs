//! Tables, columns, indexes and foreign keys.

use super::types::ColumnType;
use crate::ast::values::{DATE_FORMAT, DATETIME_FORMAT, TIME_FORMAT};
use crate::ast::Value;
use crate::error::{SqlError, SqlResult};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// Raw SQL default expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub serial: bool,
}

fn default_true() -> bool {
    true
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            default: None,
            max_length: None,
            precision: None,
            scale: None,
            enum_values: Vec::new(),
            serial: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Auto-generated identity column. Serial columns are never nullable.
    pub fn serial(mut self) -> Self {
        self.serial = true;
        self.nullable = false;
        self
    }

    pub fn default(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    pub fn max_length(mut self, len: u32) -> Self {
        self.max_length = Some(len);
        self
    }

    pub fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Check that `value` fits this column.
    pub fn validate(&self, value: &Value) -> SqlResult<()> {
        if value.is_null() {
            if !self.nullable && !self.serial {
                return Err(self.invalid("does not accept NULL"));
            }
            return Ok(());
        }
        match (self.column_type, value) {
            (t, Value::String(s)) if t.is_text() => {
                if let Some(max) = self.max_length
                    && s.chars().count() > max as usize
                {
                    return Err(self.invalid(&format!("is limited to {} characters", max)));
                }
                Ok(())
            }
            (ColumnType::Enum, Value::String(s)) => {
                if self.enum_values.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(self.invalid(&format!("does not allow '{}'", s)))
                }
            }
            (ColumnType::Json, Value::String(s)) => serde_json::from_str::<serde_json::Value>(s)
                .map(|_| ())
                .map_err(|e| self.invalid(&format!("holds invalid JSON: {}", e))),
            (ColumnType::Boolean, Value::Bool(_)) => Ok(()),
            (ColumnType::Boolean, Value::Int(0 | 1)) => Ok(()),
            (t, Value::Int(_)) if t.is_numeric() => Ok(()),
            (ColumnType::Float | ColumnType::Double | ColumnType::Decimal, Value::Float(_)) => Ok(()),
            (ColumnType::Decimal, Value::String(s)) => s
                .parse::<f64>()
                .map(|_| ())
                .map_err(|_| self.invalid(&format!("'{}' is not a decimal", s))),
            (ColumnType::DateTime, Value::DateTime(_))
            | (ColumnType::Date, Value::Date(_))
            | (ColumnType::Time, Value::Time(_)) => Ok(()),
            (t, Value::String(s)) if t.is_temporal() => parse_temporal(t, s)
                .map(|_| ())
                .ok_or_else(|| self.invalid(&format!("'{}' is not a valid {}", s, t))),
            (ColumnType::Binary, Value::Bytes(_)) => Ok(()),
            (ColumnType::Uuid, Value::String(s)) => {
                if is_uuid(s) {
                    Ok(())
                } else {
                    Err(self.invalid(&format!("'{}' is not a UUID", s)))
                }
            }
            (t, v) => Err(self.invalid(&format!("cannot hold a {:?} value as {}", v.kind(), t))),
        }
    }

    /// Validate and coerce a value about to be bound into a statement.
    ///
    /// Temporal values cross the boundary as text in the fixed formats.
    pub fn before_insert_filter(&self, value: Value) -> SqlResult<Value> {
        self.validate(&value)?;
        Ok(match value {
            Value::DateTime(ts) => Value::String(ts.format(DATETIME_FORMAT).to_string()),
            Value::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
            Value::Time(t) => Value::String(t.format(TIME_FORMAT).to_string()),
            Value::Int(n) if self.column_type == ColumnType::Boolean => Value::Bool(n != 0),
            other => other,
        })
    }

    /// Coerce a value read back from a result row into its domain form.
    pub fn after_fetch_filter(&self, raw: serde_json::Value) -> SqlResult<Value> {
        if raw.is_null() {
            return Ok(Value::Null);
        }
        match (self.column_type, raw) {
            (ColumnType::Json, serde_json::Value::String(s)) => Ok(Value::String(s)),
            (ColumnType::Json, other) => Ok(Value::String(other.to_string())),
            (ColumnType::Boolean, serde_json::Value::Number(n)) => {
                Ok(Value::Bool(n.as_i64().is_some_and(|n| n != 0)))
            }
            (t, serde_json::Value::String(s)) if t.is_temporal() => {
                let value = parse_temporal(t, &s)
                    .ok_or_else(|| self.invalid(&format!("'{}' is not a valid {}", s, t)))?;
                Ok(value)
            }
            (t, serde_json::Value::String(s)) if t.is_integer() => s
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| self.invalid(&format!("'{}' is not an integer", s))),
            (ColumnType::Float | ColumnType::Double, serde_json::Value::String(s)) => s
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| self.invalid(&format!("'{}' is not a number", s))),
            (ColumnType::Binary, serde_json::Value::String(s)) => Ok(Value::Bytes(s.into_bytes())),
            (_, other) => Value::from_json(other),
        }
    }

    fn invalid(&self, message: &str) -> SqlError {
        SqlError::Validation(format!("column '{}' {}", self.name, message))
    }
}

fn parse_temporal(column_type: ColumnType, s: &str) -> Option<Value> {
    match column_type {
        ColumnType::DateTime => NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(Value::DateTime),
        ColumnType::Date => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .ok()
            .map(Value::Date),
        ColumnType::Time => NaiveTime::parse_from_str(s, TIME_FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S%.f"))
            .ok()
            .map(Value::Time),
        _ => None,
    }
}

fn is_uuid(s: &str) -> bool {
    let groups: Vec<&str> = s.split('-').collect();
    groups.len() == 5
        && groups
            .iter()
            .zip([8, 4, 4, 4, 12])
            .all(|(g, len)| g.len() == len && g.chars().all(|c| c.is_ascii_hexdigit()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndexKind {
    Primary,
    Unique,
    Index,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Index {
    pub kind: IndexKind,
    pub columns: Vec<String>,
}

impl Index {
    pub fn new<I, S>(kind: IndexKind, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn primary<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(IndexKind::Primary, columns)
    }

    pub fn unique<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(IndexKind::Unique, columns)
    }

    pub fn index<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(IndexKind::Index, columns)
    }

    /// Logical index name derived from its table and columns.
    pub fn name(&self, table: &str) -> String {
        match self.kind {
            IndexKind::Primary => format!("{}_pkey", table),
            IndexKind::Unique => format!("{}_{}_key", table, self.columns.join("_")),
            IndexKind::Index => format!("{}_{}_idx", table, self.columns.join("_")),
        }
    }

    pub fn is_primary(&self) -> bool {
        self.kind == IndexKind::Primary
    }
}

/// Referential action on update / delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FkAction {
    #[serde(rename = "CASCADE")]
    Cascade,
    #[default]
    #[serde(rename = "RESTRICT")]
    Restrict,
    #[serde(rename = "SET NULL")]
    SetNull,
}

impl FkAction {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            FkAction::Cascade => "CASCADE",
            FkAction::Restrict => "RESTRICT",
            FkAction::SetNull => "SET NULL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKey {
    pub columns: Vec<String>,
    pub ref_table: String,
    pub ref_columns: Vec<String>,
    #[serde(default)]
    pub on_update: FkAction,
    #[serde(default)]
    pub on_delete: FkAction,
}

impl ForeignKey {
    pub fn new<I, S, J, T>(columns: I, ref_table: impl Into<String>, ref_columns: J) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        J: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            ref_table: ref_table.into(),
            ref_columns: ref_columns.into_iter().map(Into::into).collect(),
            on_update: FkAction::Restrict,
            on_delete: FkAction::Restrict,
        }
    }

    pub fn on_update(mut self, action: FkAction) -> Self {
        self.on_update = action;
        self
    }

    pub fn on_delete(mut self, action: FkAction) -> Self {
        self.on_delete = action;
        self
    }

    /// Logical constraint name derived from its table and columns.
    pub fn name(&self, table: &str) -> String {
        format!("{}_{}_fkey", table, self.columns.join("_"))
    }
}

/// A table definition. Columns keep insertion order for DDL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    #[serde(default)]
    pub indexes: Vec<Index>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.get_column(name).is_some()
    }

    pub fn primary_key(&self) -> Option<&Index> {
        self.indexes.iter().find(|i| i.is_primary())
    }

    pub fn serial_column(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.serial)
    }

    /// Check the structural invariants of the definition.
    pub fn validate(&self) -> SqlResult<()> {
        if self.columns.is_empty() {
            return Err(self.invalid("has no columns"));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(self.invalid(&format!("declares column '{}' twice", column.name)));
            }
            if column.column_type == ColumnType::Enum && column.enum_values.is_empty() {
                return Err(self.invalid(&format!(
                    "enum column '{}' has no values",
                    column.name
                )));
            }
        }

        let primaries: Vec<&Index> = self.indexes.iter().filter(|i| i.is_primary()).collect();
        if primaries.len() > 1 {
            return Err(self.invalid("has more than one primary key"));
        }

        let serials: Vec<&Column> = self.columns.iter().filter(|c| c.serial).collect();
        match serials.as_slice() {
            [] => {}
            [serial] => {
                if !serial.column_type.can_be_serial() {
                    return Err(self.invalid(&format!(
                        "serial column '{}' must be an integer type, not {}",
                        serial.name, serial.column_type
                    )));
                }
                let is_sole_pk = primaries
                    .first()
                    .is_some_and(|pk| pk.columns.len() == 1 && pk.columns[0] == serial.name);
                if !is_sole_pk {
                    return Err(self.invalid(&format!(
                        "serial column '{}' must be the sole primary key column",
                        serial.name
                    )));
                }
            }
            _ => return Err(self.invalid("has more than one serial column")),
        }

        for index in &self.indexes {
            if index.columns.is_empty() {
                return Err(self.invalid("has an index without columns"));
            }
            self.check_columns_exist(&index.columns, "index")?;
        }
        for fk in &self.foreign_keys {
            if fk.columns.is_empty() || fk.columns.len() != fk.ref_columns.len() {
                return Err(self.invalid(&format!(
                    "foreign key to '{}' must pair each column with one referenced column",
                    fk.ref_table
                )));
            }
            self.check_columns_exist(&fk.columns, "foreign key")?;
        }
        Ok(())
    }

    fn check_columns_exist(&self, columns: &[String], owner: &str) -> SqlResult<()> {
        match columns.iter().find(|c| !self.has_column(c)) {
            Some(missing) => Err(self.invalid(&format!(
                "{} references unknown column '{}'",
                owner, missing
            ))),
            None => Ok(()),
        }
    }

    /// Same columns, index set and foreign-key set, regardless of order.
    pub fn is_equivalent(&self, other: &Table) -> bool {
        fn sorted<T: Clone + Ord>(items: &[T]) -> Vec<T> {
            let mut items = items.to_vec();
            items.sort();
            items
        }
        let columns = |t: &Table| {
            let mut cols: Vec<Column> = t.columns.clone();
            cols.sort_by(|a, b| a.name.cmp(&b.name));
            cols
        };
        let index_keys = |t: &Table| {
            sorted(
                &t.indexes
                    .iter()
                    .map(|i| (i.kind as u8, i.columns.clone()))
                    .collect::<Vec<_>>(),
            )
        };
        let fk_keys = |t: &Table| {
            sorted(
                &t.foreign_keys
                    .iter()
                    .map(|f| {
                        (
                            f.columns.clone(),
                            f.ref_table.clone(),
                            f.ref_columns.clone(),
                            f.on_update as u8,
                            f.on_delete as u8,
                        )
                    })
                    .collect::<Vec<_>>(),
            )
        };
        self.name == other.name
            && columns(self) == columns(other)
            && index_keys(self) == index_keys(other)
            && fk_keys(self) == fk_keys(other)
    }

    /// Key-value representation used for interchange and display.
    pub fn to_json(&self) -> SqlResult<serde_json::Value> {
        serde_json::to_value(self)
            .map_err(|e| SqlError::Validation(format!("cannot serialize table: {}", e)))
    }

    pub fn from_json(json: serde_json::Value) -> SqlResult<Self> {
        serde_json::from_value(json)
            .map_err(|e| SqlError::Validation(format!("invalid table definition: {}", e)))
    }

    fn invalid(&self, message: &str) -> SqlError {
        SqlError::Validation(format!("table '{}' {}", self.name, message))
    }
}
