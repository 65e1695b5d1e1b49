//! SQL compilation.
//!
//! A [`Driver`] renders [`Node`](crate::ast::Node) trees into dialect SQL
//! with `:cN` placeholders, emits DDL for the schema model and reads tables
//! back from a live catalog.

pub mod catalog;
pub mod ddl;
pub mod dialect;
pub mod dml;
pub mod sql;
pub mod traits;

#[cfg(test)]
mod tests;

pub use catalog::{CatalogQuery, CatalogResults, Row};
pub use dialect::Dialect;
pub use sql::mysql::MysqlDriver;
pub use sql::postgres::PostgresDriver;
pub use traits::{Driver, TypeMapping};

use crate::ast::Value;
use crate::binder::BoundParam;
use serde::Serialize;

/// Rendered SQL plus its bound parameters in key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<BoundParam>,
}

/// Placeholder syntax of a client library without named parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `$1, $2, …`; a repeated key reuses its number.
    Dollar,
    /// `?`; a repeated key repeats its value.
    QuestionMark,
}

/// SQL with positional placeholders and the values to bind, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionalQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl CompiledQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.iter().find(|p| p.key == key).map(|p| &p.value)
    }

    /// Rewrite `:cN` placeholders into positional ones.
    ///
    /// Quoted regions (`'…'`, `"…"`, `` `…` ``) and `::` casts are left alone.
    pub fn to_positional(&self, style: PlaceholderStyle) -> PositionalQuery {
        let mut sql = String::with_capacity(self.sql.len());
        let mut params: Vec<Value> = Vec::new();
        let mut numbered: Vec<&str> = Vec::new();
        let mut quote: Option<char> = None;
        let mut prev: Option<char> = None;
        let mut chars = self.sql.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            if let Some(q) = quote {
                sql.push(c);
                if c == q {
                    quote = None;
                }
                prev = Some(c);
                continue;
            }
            match c {
                '\'' | '"' | '`' => {
                    quote = Some(c);
                    sql.push(c);
                }
                ':' if prev != Some(':') => {
                    let rest = &self.sql[i + 1..];
                    let key_len = placeholder_len(rest);
                    let key = &rest[..key_len];
                    match self.params.iter().find(|p| key_len > 0 && p.key == key) {
                        Some(param) => {
                            match style {
                                PlaceholderStyle::Dollar => {
                                    let n = match numbered.iter().position(|k| *k == key) {
                                        Some(pos) => pos + 1,
                                        None => {
                                            numbered.push(key);
                                            params.push(param.value.clone());
                                            numbered.len()
                                        }
                                    };
                                    sql.push_str(&format!("${}", n));
                                }
                                PlaceholderStyle::QuestionMark => {
                                    params.push(param.value.clone());
                                    sql.push('?');
                                }
                            }
                            for _ in 0..key_len {
                                chars.next();
                            }
                            prev = Some('0');
                            continue;
                        }
                        None => sql.push(c),
                    }
                }
                _ => sql.push(c),
            }
            prev = Some(c);
        }
        PositionalQuery { sql, params }
    }
}

/// Length of a `cN` key at the start of `s`, 0 if there is none.
fn placeholder_len(s: &str) -> usize {
    let mut chars = s.chars();
    if chars.next() != Some('c') {
        return 0;
    }
    let digits = chars.take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return 0;
    }
    // `:c1x` is not a placeholder.
    match s[1 + digits..].chars().next() {
        Some(c) if c.is_alphanumeric() || c == '_' => 0,
        _ => 1 + digits,
    }
}
