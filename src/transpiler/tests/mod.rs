//! Dialect rendering scenarios.

mod ddl;
mod postgres;
mod rendering;

use crate::ast::Node;
use crate::transpiler::{CompiledQuery, Driver, MysqlDriver, PostgresDriver};

fn pg(node: impl Into<Node>) -> CompiledQuery {
    PostgresDriver::new().compile(&node.into()).unwrap()
}

fn my(node: impl Into<Node>) -> CompiledQuery {
    MysqlDriver::new().compile(&node.into()).unwrap()
}
