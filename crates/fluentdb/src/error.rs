//! Error types for fluentdb

use thiserror::Error;

/// Result type alias for fluentdb operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for model mapping and database operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// Input does not have a shape the operation can work with
    #[error("Shape error: {0}")]
    Shape(String),

    /// Map-based write without a registered target model
    #[error("Missing model: call `model(..)` before a map-based {0}")]
    MissingModel(&'static str),

    /// UPDATE or DELETE without any WHERE predicate
    #[error("Missing predicate: refusing {0} without a WHERE condition")]
    MissingPredicate(&'static str),

    /// A value could not be converted into a field
    #[error("Conversion error on field '{field}': {message}")]
    Conversion { field: String, message: String },

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// MySQL execution error
    #[cfg(feature = "mysql")]
    #[error("MySQL error: {0}")]
    MySql(#[from] mysql_async::Error),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Transaction lifecycle error
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a conversion error for a specific field
    pub fn conversion(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a shape error
    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this error was reported by the database or its connection.
    pub fn is_execution(&self) -> bool {
        match self {
            Self::Query(_)
            | Self::UniqueViolation(_)
            | Self::ForeignKeyViolation(_)
            | Self::CheckViolation(_)
            | Self::Connection(_) => true,
            #[cfg(feature = "mysql")]
            Self::MySql(_) => true,
            #[cfg(feature = "pool")]
            Self::Pool(_) => true,
            _ => false,
        }
    }

    /// Check if this error comes from misuse of the API rather than the database.
    pub fn is_programming_error(&self) -> bool {
        matches!(
            self,
            Self::Shape(_) | Self::MissingModel(_) | Self::MissingPredicate(_)
        )
    }

    /// Parse a tokio_postgres error into a more specific OrmError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        Self::Query(err)
    }

    /// Attach a field name to a conversion error that was raised without one.
    #[doc(hidden)]
    pub fn in_field(self, field: &str) -> Self {
        match self {
            Self::Conversion { field: f, message } if f.is_empty() => Self::Conversion {
                field: field.to_string(),
                message,
            },
            other => other,
        }
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for OrmError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
