//! DDL generation shared by every driver.
//!
//! A table is never created in one statement: the base columns come first,
//! then the primary key, identity, remaining indexes and foreign keys, each
//! as its own statement.

use super::traits::Driver;
use crate::error::SqlResult;
use crate::schema::{Column, ForeignKey, Table, TableDiff};

pub fn column_definition<D: Driver + ?Sized>(d: &D, column: &Column) -> SqlResult<String> {
    let mut sql = format!(
        "{} {}",
        d.quote_identifier(&column.name),
        d.column_type_sql(column)?
    );
    if !column.nullable {
        sql.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(default);
    }
    Ok(sql)
}

pub fn create_table<D: Driver + ?Sized>(d: &D, table: &Table) -> SqlResult<String> {
    let columns = table
        .columns
        .iter()
        .map(|c| d.column_definition(c))
        .collect::<SqlResult<Vec<_>>>()?;
    Ok(format!(
        "CREATE TABLE {} ({})",
        d.quote_table(&table.name),
        columns.join(", ")
    ))
}

pub fn create_foreign_key<D: Driver + ?Sized>(d: &D, table: &str, fk: &ForeignKey) -> String {
    format!(
        "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON UPDATE {} ON DELETE {}",
        d.quote_table(table),
        d.quote_table(&fk.name(table)),
        quote_list(d, &fk.columns),
        d.quote_table(&fk.ref_table),
        quote_list(d, &fk.ref_columns),
        fk.on_update.sql_keyword(),
        fk.on_delete.sql_keyword()
    )
}

pub fn quote_list<D: Driver + ?Sized>(d: &D, names: &[String]) -> String {
    names
        .iter()
        .map(|n| d.quote_identifier(n))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn table_statements<D: Driver + ?Sized>(d: &D, table: &Table) -> SqlResult<Vec<String>> {
    table.validate()?;
    let mut statements = vec![d.create_table(table)?];

    if let Some(pk) = table.primary_key() {
        statements.push(d.create_index(&table.name, pk));
    }
    if let Some(serial) = table.serial_column() {
        statements.push(d.create_serial(&table.name, serial)?);
    }
    for index in table.indexes.iter().filter(|i| !i.is_primary()) {
        statements.push(d.create_index(&table.name, index));
    }
    for column in &table.columns {
        statements.extend(d.column_constraints(&table.name, column)?);
    }
    for fk in &table.foreign_keys {
        statements.push(d.create_foreign_key(&table.name, fk));
    }
    Ok(statements)
}

/// Drops run before adds so a replaced index or key never collides.
pub fn diff_statements<D: Driver + ?Sized>(d: &D, diff: &TableDiff) -> SqlResult<Vec<String>> {
    let table = diff.table.as_str();
    let mut statements = Vec::new();

    for fk in &diff.dropped_foreign_keys {
        statements.push(d.drop_foreign_key(table, fk));
    }
    if let Some(serial) = &diff.dropped_serial {
        statements.push(d.drop_serial(table, serial)?);
    }
    for index in &diff.dropped_indexes {
        statements.push(d.drop_index(table, index));
    }
    for column in &diff.dropped_columns {
        statements.push(d.drop_column(table, column));
    }
    for column in &diff.added_columns {
        statements.extend(d.add_column(table, column)?);
    }
    let (primary, others): (Vec<_>, Vec<_>) =
        diff.added_indexes.iter().partition(|i| i.is_primary());
    for index in primary.into_iter().chain(others) {
        statements.push(d.create_index(table, index));
    }
    if let Some(serial) = &diff.added_serial {
        statements.push(d.create_serial(table, serial)?);
    }
    for fk in &diff.added_foreign_keys {
        statements.push(d.create_foreign_key(table, fk));
    }
    Ok(statements)
}
