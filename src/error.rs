//! Error types for sqlcraft.

use thiserror::Error;

/// The main error type for sqlcraft operations.
///
/// Variants are grouped by the phase that raises them: node construction,
/// name resolution during rendering, backend capability checks, schema
/// validation, and the catalog / connection boundary.
#[derive(Debug, Error)]
pub enum SqlError {
    /// Operator symbol outside the closed set of its node kind.
    #[error("Invalid operator: '{0}'")]
    InvalidOperator(String),

    /// Value that cannot be carried by a constant node.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Invalid join: {0}")]
    InvalidJoin(String),

    #[error("Invalid union kind: '{0}'")]
    InvalidUnion(String),

    /// A statement was handed a clause kind it has no slot for.
    #[error("{statement} does not accept {clause}")]
    UnsupportedClause {
        statement: &'static str,
        clause: &'static str,
    },

    /// Abstract column type with no native equivalent on a backend.
    #[error("Column type {column_type} has no native equivalent on {backend}")]
    UnsupportedType {
        backend: &'static str,
        column_type: String,
    },

    #[error("Unresolved table or alias: '{0}'")]
    UnresolvedTable(String),

    /// Table bound more than once in a scope and referenced without alias.
    #[error("Ambiguous table reference: '{0}' is bound more than once, use an alias")]
    AmbiguousTable(String),

    #[error("Duplicate alias: '{0}'")]
    DuplicateAlias(String),

    /// Alias already bound by an enclosing scope.
    #[error("Alias '{0}' shadows an alias of an enclosing query")]
    AliasShadowing(String),

    /// Feature this backend cannot express.
    #[error("{operation} is not implemented for {backend}")]
    NotImplemented {
        backend: &'static str,
        operation: String,
    },

    /// Statement rendered without a required part (e.g. its target table).
    #[error("Incomplete statement: {0}")]
    Incomplete(String),

    #[error("Count query not supported: {0}")]
    CountUnsupported(String),

    /// Structural violation in a schema definition.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catalog definition text outside the grammar a driver understands.
    #[error("Cannot parse catalog definition '{definition}': {message}")]
    CatalogParse { definition: String, message: String },

    #[error("Table does not exist: '{0}'")]
    TableNotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SqlError {
    /// Create a capability error for `backend`.
    pub fn not_implemented(backend: &'static str, operation: impl Into<String>) -> Self {
        Self::NotImplemented {
            backend,
            operation: operation.into(),
        }
    }

    /// Create a catalog parse error.
    pub fn catalog(definition: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CatalogParse {
            definition: definition.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TableNotFound(_))
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented { .. })
    }

    /// Resolution errors abort the compilation that raised them.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            Self::UnresolvedTable(_)
                | Self::AmbiguousTable(_)
                | Self::DuplicateAlias(_)
                | Self::AliasShadowing(_)
        )
    }
}

/// Result type alias for sqlcraft operations.
pub type SqlResult<T> = Result<T, SqlError>;
