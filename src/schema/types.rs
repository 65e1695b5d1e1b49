//! Abstract column type tags.
//!
//! Drivers map these to native names in their type tables; nothing here
//! knows a backend.

use crate::error::{SqlError, SqlResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Domain type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Char,
    Varchar,
    Text,
    Json,
    Enum,
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Double,
    Decimal,
    Date,
    Time,
    DateTime,
    Binary,
    Uuid,
}

impl ColumnType {
    pub const ALL: [ColumnType; 18] = [
        Self::Char,
        Self::Varchar,
        Self::Text,
        Self::Json,
        Self::Enum,
        Self::Boolean,
        Self::TinyInt,
        Self::SmallInt,
        Self::Integer,
        Self::BigInt,
        Self::Float,
        Self::Double,
        Self::Decimal,
        Self::Date,
        Self::Time,
        Self::DateTime,
        Self::Binary,
        Self::Uuid,
    ];

    /// Lower-case tag used in the key-value schema format.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Char => "char",
            Self::Varchar => "varchar",
            Self::Text => "text",
            Self::Json => "json",
            Self::Enum => "enum",
            Self::Boolean => "boolean",
            Self::TinyInt => "tinyint",
            Self::SmallInt => "smallint",
            Self::Integer => "integer",
            Self::BigInt => "bigint",
            Self::Float => "float",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
            Self::Binary => "binary",
            Self::Uuid => "uuid",
        }
    }

    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::TinyInt | Self::SmallInt | Self::Integer | Self::BigInt
        )
    }

    pub const fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, Self::Float | Self::Double | Self::Decimal)
    }

    /// Types whose values are strings bounded by `max_length`.
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Char | Self::Varchar | Self::Text)
    }

    pub const fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Time | Self::DateTime)
    }

    /// Types a serial column may carry.
    pub const fn can_be_serial(&self) -> bool {
        matches!(self, Self::SmallInt | Self::Integer | Self::BigInt)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColumnType {
    type Err = SqlError;

    fn from_str(s: &str) -> SqlResult<Self> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name() == lower)
            .ok_or_else(|| SqlError::Validation(format!("unknown column type '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        assert_eq!("DateTime".parse::<ColumnType>().unwrap(), ColumnType::DateTime);
        assert_eq!("bigint".parse::<ColumnType>().unwrap(), ColumnType::BigInt);
        assert!("jsonb".parse::<ColumnType>().is_err());
    }

    #[test]
    fn test_serde_tag_matches_name() {
        for t in ColumnType::ALL {
            let json = serde_json::to_value(t).unwrap();
            assert_eq!(json, serde_json::json!(t.name()));
        }
    }

    #[test]
    fn test_serial_capable_types() {
        assert!(ColumnType::BigInt.can_be_serial());
        assert!(!ColumnType::Varchar.can_be_serial());
        assert!(!ColumnType::TinyInt.can_be_serial());
    }
}
