//! Error types for the data mapper
//!
//! This module defines all error types that can occur while building statements,
//! mapping rows or talking to a database backend.

/// Result type alias for data mapper operations
pub type Result<T> = std::result::Result<T, MapperError>;

/// Error types for data mapper operations
#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    /// A required input (id, name, file, formatter) was empty
    #[error("Invalid argument '{name}': {message}")]
    InvalidArgument { name: String, message: String },

    /// A statement id was registered twice
    #[error("The statement pool already contains a statement named '{0}'")]
    DuplicateStatement(String),

    /// A provider id was registered twice
    #[error("The statement pool already contains a provider named '{0}'")]
    DuplicateProvider(String),

    /// A statement id is not registered
    #[error("The statement pool does not contain a statement named '{0}'")]
    StatementNotFound(String),

    /// A provider id is not registered
    #[error("The statement pool does not contain a provider named '{0}'")]
    ProviderNotFound(String),

    /// A strict substitution found no placeholder for the name
    #[error("No named parameter found for name '{0}'")]
    ParameterNotFound(String),

    /// Placeholders are left in the statement text
    #[error("The sql statement has unresolved parameters: {}", .names.join(", "))]
    UnresolvedParameters { names: Vec<String> },

    /// A required or not-null column is absent from the result row
    #[error("The property {entity}.{column} is required but the column is missing from the result")]
    MissingColumn { entity: String, column: String },

    /// A not-null column holds null
    #[error("The property {entity}.{column} must not be null")]
    NotNullViolation { entity: String, column: String },

    /// A value cannot be converted to the destination type
    #[error("Type mismatch on {entity}.{column}: expected {expected}, got {actual}")]
    TypeMismatch {
        entity: String,
        column: String,
        expected: String,
        actual: String,
    },

    /// Malformed or unreadable statement / provider / configuration document
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Connection error (generic)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Connection timeout
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout { timeout_ms: u64 },

    /// Query execution error
    #[error("Query execution error: {0}")]
    QueryError(String),

    /// Query timeout
    #[error("Query timeout after {timeout_ms}ms")]
    QueryTimeout { timeout_ms: u64 },

    /// Transaction error
    #[error("Transaction error: {0}")]
    TransactionError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// XML parse error
    #[error("XML error: {0}")]
    XmlError(#[from] roxmltree::Error),

    /// SQLite error
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl MapperError {
    /// Create an invalid argument error
    pub fn invalid_argument(name: impl Into<String>, message: impl Into<String>) -> Self {
        MapperError::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid argument error for an empty input
    pub fn empty_argument(name: impl Into<String>) -> Self {
        Self::invalid_argument(name, "must not be empty")
    }

    /// Create an unresolved parameters error
    pub fn unresolved(names: Vec<String>) -> Self {
        MapperError::UnresolvedParameters { names }
    }

    /// Create a missing column error
    pub fn missing_column(entity: impl Into<String>, column: impl Into<String>) -> Self {
        MapperError::MissingColumn {
            entity: entity.into(),
            column: column.into(),
        }
    }

    /// Create a not-null violation error
    pub fn not_null(entity: impl Into<String>, column: impl Into<String>) -> Self {
        MapperError::NotNullViolation {
            entity: entity.into(),
            column: column.into(),
        }
    }

    /// Create a new type mismatch error
    pub fn type_mismatch(entity: &str, column: &str, expected: &str, actual: &str) -> Self {
        MapperError::TypeMismatch {
            entity: entity.to_string(),
            column: column.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        MapperError::Configuration(msg.into())
    }

    /// Create a new connection error (generic)
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        MapperError::ConnectionError(msg.into())
    }

    /// Create a connection timeout error
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        MapperError::ConnectionTimeout { timeout_ms }
    }

    /// Create a new query error
    pub fn query<S: Into<String>>(msg: S) -> Self {
        MapperError::QueryError(msg.into())
    }

    /// Create a query timeout error
    pub fn query_timeout(timeout_ms: u64) -> Self {
        MapperError::QueryTimeout { timeout_ms }
    }

    /// Create a new transaction error
    pub fn transaction<S: Into<String>>(msg: S) -> Self {
        MapperError::TransactionError(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        MapperError::Other(msg.into())
    }
}
