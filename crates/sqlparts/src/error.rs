//! Error types for sqlparts

use crate::params::ParameterSet;
use thiserror::Error;

/// Result type alias for sqlparts operations
pub type QbResult<T> = Result<T, QbError>;

/// Error types for building and executing queries
#[derive(Debug, Error)]
pub enum QbError {
    /// Unknown part name, or a part whose shape the slot cannot hold
    #[error("Invalid query part: {0}")]
    InvalidPart(String),

    /// Required parts are missing at render time
    #[error("Incomplete query: {0}")]
    IncompleteQuery(String),

    /// Placeholder markers and bound values disagree
    #[error("Parameter count mismatch: {placeholders} placeholder(s), {params} value(s)")]
    ParameterCountMismatch { placeholders: usize, params: usize },

    /// The database handle failed while running a rendered statement.
    ///
    /// `params` is kept for callers that want to inspect it; it is never
    /// part of the `Display` output.
    #[error("Query execution failed for `{sql}`: {source}")]
    QueryExecution {
        sql: String,
        params: ParameterSet,
        #[source]
        source: Box<QbError>,
    },

    /// Driver error
    #[error("Driver error: {0}")]
    Driver(#[from] tokio_postgres::Error),

    /// Parameter could not be bound to the statement
    #[error("Bind error: {0}")]
    Bind(String),

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl QbError {
    /// Create an invalid part error
    pub fn invalid_part(message: impl Into<String>) -> Self {
        Self::InvalidPart(message.into())
    }

    /// Create an incomplete query error
    pub fn incomplete(message: impl Into<String>) -> Self {
        Self::IncompleteQuery(message.into())
    }

    /// Create a bind error
    pub fn bind(message: impl Into<String>) -> Self {
        Self::Bind(message.into())
    }

    /// Wrap a handle failure together with the statement that caused it
    pub fn execution(sql: impl Into<String>, params: ParameterSet, source: QbError) -> Self {
        Self::QueryExecution {
            sql: sql.into(),
            params,
            source: Box::new(source),
        }
    }

    /// Check if this is an invalid part error
    pub fn is_invalid_part(&self) -> bool {
        matches!(self, Self::InvalidPart(_))
    }

    /// Check if this is an incomplete query error
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::IncompleteQuery(_))
    }

    /// Check if this is a parameter count mismatch
    pub fn is_count_mismatch(&self) -> bool {
        matches!(self, Self::ParameterCountMismatch { .. })
    }

    /// Check if this is a wrapped execution failure
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::QueryExecution { .. })
    }

    /// Check if this is a timeout error, directly or as the cause of an execution failure
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::QueryExecution { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for QbError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
