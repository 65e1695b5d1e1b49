use crate::error::{SqlError, SqlResult};
use crate::transpiler::PlaceholderStyle;
use crate::transpiler::sql::mysql::MysqlDriver;
use crate::transpiler::sql::postgres::PostgresDriver;
use crate::transpiler::traits::Driver;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    Mysql,
}

impl Dialect {
    pub fn driver(&self, prefix: &str) -> Box<dyn Driver> {
        match self {
            Dialect::Postgres => Box::new(PostgresDriver::with_prefix(prefix)),
            Dialect::Mysql => Box::new(MysqlDriver::with_prefix(prefix)),
        }
    }

    /// Dialect named by a connection URL scheme.
    pub fn from_url(url: &str) -> SqlResult<Self> {
        let scheme = url
            .split_once("://")
            .map(|(scheme, _)| scheme)
            .ok_or_else(|| SqlError::Config(format!("'{}' is not a database URL", url)))?;
        scheme.parse()
    }

    pub fn placeholder_style(&self) -> PlaceholderStyle {
        match self {
            Dialect::Postgres => PlaceholderStyle::Dollar,
            Dialect::Mysql => PlaceholderStyle::QuestionMark,
        }
    }
}

impl FromStr for Dialect {
    type Err = SqlError;

    fn from_str(s: &str) -> SqlResult<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::Mysql),
            other => Err(SqlError::Config(format!("unknown dialect '{}'", other))),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Postgres => write!(f, "postgres"),
            Dialect::Mysql => write!(f, "mysql"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url() {
        assert_eq!(Dialect::from_url("postgres://u@h/db").unwrap(), Dialect::Postgres);
        assert_eq!(Dialect::from_url("mysql://u@h/db").unwrap(), Dialect::Mysql);
        assert!(Dialect::from_url("sqlite::memory:").is_err());
        assert!(Dialect::from_url("oracle://h").is_err());
    }

    #[test]
    fn test_driver_carries_prefix() {
        let driver = Dialect::Mysql.driver("app_");
        assert_eq!(driver.name(), "mysql");
        assert_eq!(driver.quote_table("users"), "`app_users`");
    }
}
