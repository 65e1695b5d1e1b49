//! # sqlcraft
//!
//! Build queries as data, compile them to dialect-correct parameterized SQL.
//!
//! ## Quick Example
//!
//! ```rust
//! use sqlcraft::prelude::*;
//!
//! let select = Select::from("users")
//!     .field("email")
//!     .where_eq("active", true)
//!     .limit(10);
//!
//! let query = PostgresDriver::new().compile(&select.into()).unwrap();
//! assert_eq!(
//!     query.sql,
//!     "SELECT \"email\" FROM \"users\" WHERE \"active\" = :c0 LIMIT 10"
//! );
//! ```
//!
//! ## Layers
//!
//! | Module         | Role                                               |
//! |----------------|----------------------------------------------------|
//! | [`ast`]        | Dialect-free statement tree                        |
//! | [`binder`]     | Parameter keys and table/alias scopes              |
//! | [`transpiler`] | Per-backend drivers: DML, DDL, catalog reading     |
//! | [`schema`]     | Table definitions, diffs, schema cache             |
//! | [`engine`]     | Session over a connection: reflect and apply DDL   |

pub mod ast;
pub mod binder;
pub mod config;
pub mod engine;
pub mod error;
pub mod schema;
pub mod transpiler;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::binder::Binder;
    pub use crate::config::Config;
    pub use crate::engine::{Connection, Database, SqlxConnection};
    pub use crate::error::*;
    pub use crate::schema::{Column, ColumnType, FkAction, ForeignKey, Index, Table};
    pub use crate::transpiler::{
        CompiledQuery, Dialect, Driver, MysqlDriver, PlaceholderStyle, PostgresDriver,
    };
}
