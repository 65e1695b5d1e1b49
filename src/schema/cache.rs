//! Per-session cache of reflected tables.

use super::table::Table;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Reflected tables keyed by logical name.
///
/// Entries are inserted whole, so readers see either no entry or a complete
/// table. Any DDL must be followed by [`clear`](SchemaCache::clear).
#[derive(Debug, Default)]
pub struct SchemaCache {
    tables: RwLock<HashMap<String, Arc<Table>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<Table>> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Store `table` and hand back the shared copy.
    pub fn insert(&self, table: Table) -> Arc<Table> {
        let table = Arc::new(table);
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(table.name.clone(), Arc::clone(&table));
        table
    }

    pub fn clear(&self) {
        // A panicked writer must not leave a stale schema behind.
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ColumnType};

    #[test]
    fn test_insert_get_clear() {
        let cache = SchemaCache::new();
        assert!(cache.get("users").is_none());
        let stored = cache.insert(
            Table::new("users").column(Column::new("id", ColumnType::Integer)),
        );
        let fetched = cache.get("users").unwrap();
        assert!(Arc::ptr_eq(&stored, &fetched));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_readers() {
        let cache = Arc::new(SchemaCache::new());
        cache.insert(Table::new("t").column(Column::new("a", ColumnType::Text)));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.get("t").map(|t| t.columns.len()))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(1));
        }
    }

    #[test]
    fn test_clear_after_poisoned_lock() {
        let cache = Arc::new(SchemaCache::new());
        cache.insert(Table::new("t").column(Column::new("a", ColumnType::Text)));
        let poisoner = Arc::clone(&cache);
        let result = std::thread::spawn(move || {
            let _guard = poisoner.tables.write().unwrap();
            panic!("writer died");
        })
        .join();
        assert!(result.is_err());
        assert!(cache.tables.is_poisoned());

        cache.clear();
        assert!(cache.get("t").is_none());
        assert!(cache.is_empty());
    }
}
