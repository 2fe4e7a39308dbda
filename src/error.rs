//! Error types for fluent-orm.
//!
//! All failures surface as a single [`OrmError`] built with `thiserror`. Driver
//! failures are wrapped, never remapped to a generic message, so callers see
//! the database's own text and SQLSTATE.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrmError {
    /// Empty or invalid field set for an insert, update or table definition.
    #[error("Schema error: {message} (object: {object})")]
    Schema { message: String, object: String },

    /// Malformed request that never reached the database (join conditions, join type).
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Transaction state violation.
    #[error("Transaction conflict: {message}")]
    Conflict { message: String },

    #[error("Database error: {message}")]
    Driver {
        message: String,
        /// e.g., "23000" for an integrity constraint violation
        sql_state: Option<String>,
    },

    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

impl OrmError {
    /// Create a schema error.
    pub fn schema(message: impl Into<String>, object: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
            object: object.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a transaction conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a driver error with optional SQL state.
    pub fn driver(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Driver {
            message: message.into(),
            sql_state,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// SQLSTATE reported by the database, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Driver { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }

    /// Whether the failure came from the connection provider rather than this layer.
    pub fn is_driver(&self) -> bool {
        matches!(self, Self::Driver { .. })
    }
}

/// Convert sqlx errors to OrmError.
impl From<sqlx::Error> for OrmError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                OrmError::driver(db_err.message(), code)
            }
            sqlx::Error::Configuration(msg) => OrmError::config(msg.to_string()),
            sqlx::Error::PoolTimedOut => {
                OrmError::driver("Timed out acquiring a connection from the pool", None)
            }
            sqlx::Error::PoolClosed => OrmError::driver("Connection pool is closed", None),
            sqlx::Error::Io(io_err) => OrmError::driver(format!("I/O error: {}", io_err), None),
            sqlx::Error::Tls(tls_err) => OrmError::driver(format!("TLS error: {}", tls_err), None),
            sqlx::Error::Protocol(msg) => {
                OrmError::driver(format!("Protocol error: {}", msg), None)
            }
            sqlx::Error::ColumnDecode { index, source } => OrmError::driver(
                format!("Failed to decode column {}: {}", index, source),
                None,
            ),
            other => OrmError::driver(other.to_string(), None),
        }
    }
}

/// Result type alias for ORM operations.
pub type OrmResult<T> = Result<T, OrmError>;
