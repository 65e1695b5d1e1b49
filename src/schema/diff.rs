//! Difference between a live table and a target definition.

use super::table::{Column, ForeignKey, Index, Table};

/// What has to change for `current` to match `target`.
///
/// Column type changes are not detected; only presence is compared.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableDiff {
    pub table: String,
    pub added_columns: Vec<Column>,
    pub dropped_columns: Vec<String>,
    pub added_indexes: Vec<Index>,
    pub dropped_indexes: Vec<Index>,
    pub added_foreign_keys: Vec<ForeignKey>,
    pub dropped_foreign_keys: Vec<ForeignKey>,
    /// Column that becomes serial.
    pub added_serial: Option<Column>,
    /// Column that stops being serial.
    pub dropped_serial: Option<Column>,
}

impl TableDiff {
    pub fn between(current: &Table, target: &Table) -> Self {
        let mut diff = TableDiff {
            table: target.name.clone(),
            ..Default::default()
        };

        for column in &target.columns {
            if !current.has_column(&column.name) {
                diff.added_columns.push(column.clone());
            }
        }
        for column in &current.columns {
            if !target.has_column(&column.name) {
                diff.dropped_columns.push(column.name.clone());
            }
        }

        diff.added_indexes = missing_from(&target.indexes, &current.indexes);
        diff.dropped_indexes = missing_from(&current.indexes, &target.indexes);
        diff.added_foreign_keys = missing_from(&target.foreign_keys, &current.foreign_keys);
        diff.dropped_foreign_keys = missing_from(&current.foreign_keys, &target.foreign_keys);

        let current_serial = current.serial_column();
        let target_serial = target.serial_column();
        if current_serial.map(|c| &c.name) != target_serial.map(|c| &c.name) {
            // A dropped column takes its identity with it.
            diff.dropped_serial = current_serial
                .filter(|c| target.has_column(&c.name))
                .cloned();
            diff.added_serial = target_serial.cloned();
        }
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.added_columns.is_empty()
            && self.dropped_columns.is_empty()
            && self.added_indexes.is_empty()
            && self.dropped_indexes.is_empty()
            && self.added_foreign_keys.is_empty()
            && self.dropped_foreign_keys.is_empty()
            && self.added_serial.is_none()
            && self.dropped_serial.is_none()
    }
}

fn missing_from<T: PartialEq + Clone>(items: &[T], other: &[T]) -> Vec<T> {
    items
        .iter()
        .filter(|item| !other.contains(item))
        .cloned()
        .collect()
}
