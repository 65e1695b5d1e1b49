//! MySQL catalog reading from `information_schema`.

use super::{CatalogQuery, CatalogResults, number, rows, text};
use crate::error::{SqlError, SqlResult};
use crate::schema::{Column, ColumnType, FkAction, ForeignKey, Index, IndexKind, Table};
use crate::transpiler::traits::Driver;
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{is_not, tag, tag_no_case},
    character::complete::{char, multispace0},
    combinator::{all_consuming, map},
    multi::{many0, separated_list1},
    sequence::{delimited, preceded},
};
use std::collections::{BTreeMap, HashSet};

pub const COLUMNS: &str = "columns";
pub const INDEXES: &str = "indexes";
pub const FOREIGN_KEYS: &str = "foreign_keys";

const COLUMNS_SQL: &str = "SELECT COLUMN_NAME AS column_name, DATA_TYPE AS data_type, \
     COLUMN_TYPE AS column_type, IS_NULLABLE AS is_nullable, COLUMN_DEFAULT AS column_default, \
     CHARACTER_MAXIMUM_LENGTH AS character_maximum_length, \
     NUMERIC_PRECISION AS numeric_precision, NUMERIC_SCALE AS numeric_scale, EXTRA AS extra \
     FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = {table} \
     ORDER BY ORDINAL_POSITION";

const INDEXES_SQL: &str = "SELECT INDEX_NAME AS index_name, NON_UNIQUE AS non_unique, \
     COLUMN_NAME AS column_name \
     FROM information_schema.STATISTICS \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = {table} \
     ORDER BY INDEX_NAME, SEQ_IN_INDEX";

const FOREIGN_KEYS_SQL: &str = "SELECT k.CONSTRAINT_NAME AS name, k.COLUMN_NAME AS column_name, \
     k.REFERENCED_TABLE_NAME AS ref_table, k.REFERENCED_COLUMN_NAME AS ref_column, \
     r.UPDATE_RULE AS update_rule, r.DELETE_RULE AS delete_rule \
     FROM information_schema.KEY_COLUMN_USAGE k \
     JOIN information_schema.REFERENTIAL_CONSTRAINTS r \
     ON r.CONSTRAINT_SCHEMA = k.CONSTRAINT_SCHEMA AND r.CONSTRAINT_NAME = k.CONSTRAINT_NAME \
     WHERE k.TABLE_SCHEMA = DATABASE() AND k.TABLE_NAME = {table} \
     ORDER BY k.CONSTRAINT_NAME, k.ORDINAL_POSITION";

pub fn queries(physical_table: &str) -> Vec<CatalogQuery> {
    vec![
        CatalogQuery::for_table(COLUMNS, COLUMNS_SQL, physical_table),
        CatalogQuery::for_table(INDEXES, INDEXES_SQL, physical_table),
        CatalogQuery::for_table(FOREIGN_KEYS, FOREIGN_KEYS_SQL, physical_table),
    ]
}

pub fn reconstruct<D: Driver + ?Sized>(
    d: &D,
    table: &str,
    results: &CatalogResults,
) -> SqlResult<Table> {
    let mut out = Table::new(table);

    for row in rows(results, COLUMNS) {
        let name = text(row, "column_name")
            .ok_or_else(|| SqlError::catalog(format!("{:?}", row), "column without a name"))?;
        let data_type = text(row, "data_type").unwrap_or_default().to_lowercase();
        let full_type = text(row, "column_type").unwrap_or_default().to_lowercase();
        let extra = text(row, "extra").unwrap_or_default().to_lowercase();

        let column_type = if full_type.starts_with("tinyint(1)") {
            ColumnType::Boolean
        } else {
            d.column_type_from_catalog(&data_type)?
        };
        let mut column = Column::new(name, column_type);
        column.nullable = text(row, "is_nullable").as_deref() == Some("YES");
        column.serial = extra.contains("auto_increment");

        column.default = match text(row, "column_default") {
            Some(default) if extra.contains("default_generated") => Some(default),
            Some(default) if column_type.is_text() || column_type == ColumnType::Enum => {
                Some(format!("'{}'", default.replace('\'', "''")))
            }
            other => other,
        };
        if column.serial {
            column.default = None;
        }

        match column_type {
            ColumnType::Enum => column.enum_values = parse_enum_type(&full_type_raw(row))?,
            ColumnType::Char | ColumnType::Varchar => {
                column.max_length = number(row, "character_maximum_length").map(|n| n as u32);
            }
            ColumnType::Decimal => {
                column.precision = number(row, "numeric_precision").map(|n| n as u32);
                column.scale = number(row, "numeric_scale").map(|n| n as u32);
            }
            _ => {}
        }
        out.columns.push(column);
    }
    if out.columns.is_empty() {
        return Err(SqlError::TableNotFound(table.to_string()));
    }

    let mut foreign_keys: BTreeMap<String, ForeignKey> = BTreeMap::new();
    for row in rows(results, FOREIGN_KEYS) {
        let name = text(row, "name").unwrap_or_default();
        let column = text(row, "column_name").unwrap_or_default();
        let ref_column = text(row, "ref_column").unwrap_or_default();
        let ref_table = text(row, "ref_table").unwrap_or_default();
        let on_update = fk_rule(&text(row, "update_rule").unwrap_or_default())?;
        let on_delete = fk_rule(&text(row, "delete_rule").unwrap_or_default())?;
        let fk = foreign_keys.entry(name).or_insert_with(|| {
            ForeignKey::new(
                Vec::<String>::new(),
                d.strip_prefix(&ref_table),
                Vec::<String>::new(),
            )
            .on_update(on_update)
            .on_delete(on_delete)
        });
        fk.columns.push(column);
        fk.ref_columns.push(ref_column);
    }
    let fk_names: HashSet<&String> = foreign_keys.keys().collect();

    // Index name -> (kind, ordered columns)
    let mut indexes: BTreeMap<String, (IndexKind, Vec<String>)> = BTreeMap::new();
    for row in rows(results, INDEXES) {
        let name = text(row, "index_name").unwrap_or_default();
        if fk_names.contains(&name) {
            continue;
        }
        let kind = if name == "PRIMARY" {
            IndexKind::Primary
        } else if number(row, "non_unique") == Some(0) {
            IndexKind::Unique
        } else {
            IndexKind::Index
        };
        let column = text(row, "column_name").unwrap_or_default();
        indexes
            .entry(name)
            .or_insert_with(|| (kind, Vec::new()))
            .1
            .push(column);
    }

    out.indexes = indexes
        .into_values()
        .map(|(kind, columns)| Index::new(kind, columns))
        .collect();
    out.foreign_keys = foreign_keys.into_values().collect();
    Ok(out)
}

/// `COLUMN_TYPE` as reported, keeping the case of enum values.
fn full_type_raw(row: &super::Row) -> String {
    text(row, "column_type").unwrap_or_default()
}

/// Values of a native enum type, e.g. `enum('on','it''s off')`.
pub fn parse_enum_type(column_type: &str) -> SqlResult<Vec<String>> {
    all_consuming(delimited(multispace0, enum_type, multispace0))(column_type)
        .map(|(_, values)| values)
        .map_err(|e| SqlError::catalog(column_type, e.to_string()))
}

/// Referential rule names of `REFERENTIAL_CONSTRAINTS`.
pub fn fk_rule(rule: &str) -> SqlResult<FkAction> {
    match rule.trim().to_uppercase().as_str() {
        "CASCADE" => Ok(FkAction::Cascade),
        "RESTRICT" | "NO ACTION" | "" => Ok(FkAction::Restrict),
        "SET NULL" => Ok(FkAction::SetNull),
        _ => Err(SqlError::catalog(rule, "unsupported referential action")),
    }
}

fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(
            char('\''),
            many0(alt((
                map(tag("''"), |_| "'".to_string()),
                map(tag("\\'"), |_| "'".to_string()),
                map(is_not("'\\"), |s: &str| s.to_string()),
            ))),
            char('\''),
        ),
        |parts: Vec<String>| parts.concat(),
    )(input)
}

fn enum_type(input: &str) -> IResult<&str, Vec<String>> {
    preceded(
        tag_no_case("enum"),
        delimited(
            delimited(multispace0, char('('), multispace0),
            separated_list1(delimited(multispace0, char(','), multispace0), string_literal),
            preceded(multispace0, char(')')),
        ),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_type() {
        assert_eq!(
            parse_enum_type("enum('On','it''s off')").unwrap(),
            vec!["On".to_string(), "it's off".to_string()]
        );
        assert!(parse_enum_type("set('a','b')").is_err());
        assert!(parse_enum_type("enum()").is_err());
    }

    #[test]
    fn test_fk_rules() {
        assert_eq!(fk_rule("CASCADE").unwrap(), FkAction::Cascade);
        assert_eq!(fk_rule("NO ACTION").unwrap(), FkAction::Restrict);
        assert_eq!(fk_rule("SET NULL").unwrap(), FkAction::SetNull);
        assert!(fk_rule("SET DEFAULT").is_err());
    }
}
