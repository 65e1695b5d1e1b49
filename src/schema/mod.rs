//! Schema meta-model: tables, columns, indexes, foreign keys.

pub mod cache;
pub mod diff;
pub mod table;
pub mod types;

pub use cache::SchemaCache;
pub use diff::TableDiff;
pub use table::{Column, FkAction, ForeignKey, Index, IndexKind, Table};
pub use types::ColumnType;
