//! Error types for piecesql

use std::fmt;
use thiserror::Error;

/// Result type alias for piecesql operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Which side of a primary key lookup had the wrong number of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryKeyArity {
    /// Fewer values than declared key columns.
    TooFew { expected: usize, got: usize },
    /// More values than declared key columns.
    TooMany { expected: usize, got: usize },
}

impl PrimaryKeyArity {
    pub(crate) fn check(expected: usize, got: usize) -> Result<(), Self> {
        match got.cmp(&expected) {
            std::cmp::Ordering::Less => Err(Self::TooFew { expected, got }),
            std::cmp::Ordering::Greater => Err(Self::TooMany { expected, got }),
            std::cmp::Ordering::Equal => Ok(()),
        }
    }
}

impl fmt::Display for PrimaryKeyArity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFew { expected, got } => {
                write!(f, "too few primary key values: expected {expected}, got {got}")
            }
            Self::TooMany { expected, got } => {
                write!(f, "too many primary key values: expected {expected}, got {got}")
            }
        }
    }
}

/// Error types for building and executing queries
#[derive(Debug, Error)]
pub enum QueryError {
    /// `replace_clause` (or a derived query) targeted a clause that is not present
    #[error("Missing clause: {0}")]
    MissingClause(String),

    /// A model-aware helper was used on a query without a bound model
    #[error("Missing model: {0}")]
    MissingModel(String),

    /// An insert/values/update call was given no fields
    #[error("Incomplete expression: {0}")]
    IncompleteExpression(String),

    /// An expression could not be compiled (e.g. comparator without right-hand side)
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    /// Primary key lookup with the wrong number of values
    #[error("Primary key arity: {0}")]
    PrimaryKeyArity(PrimaryKeyArity),

    /// The connection refused to quote a value inline
    #[error("Connection failed to quote value: {0}")]
    ConnectionQuote(String),

    /// The dialect has no rendering for a requested construct
    #[error("{feature} is not supported by the {dialect} dialect")]
    Unsupported { dialect: String, feature: String },

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },
}

impl QueryError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an incomplete expression error
    pub fn incomplete(message: impl Into<String>) -> Self {
        Self::IncompleteExpression(message.into())
    }

    /// Create an unsupported-construct error
    pub fn unsupported(dialect: impl Into<String>, feature: impl fmt::Display) -> Self {
        Self::Unsupported {
            dialect: dialect.into(),
            feature: feature.to_string(),
        }
    }

    /// Check if this is a missing clause error
    pub fn is_missing_clause(&self) -> bool {
        matches!(self, Self::MissingClause(_))
    }

    /// Check if this is a primary key arity error
    pub fn is_primary_key_arity(&self) -> bool {
        matches!(self, Self::PrimaryKeyArity(_))
    }

    /// Check if this is an unsupported-construct error
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<PrimaryKeyArity> for QueryError {
    fn from(err: PrimaryKeyArity) -> Self {
        Self::PrimaryKeyArity(err)
    }
}

/// An error noticed while compiling a chained (infallible) builder call.
///
/// Stored on the query and surfaced by `validate()`/`build()` and every
/// execution entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BuildError {
    Quote(String),
    Unsupported {
        dialect: &'static str,
        feature: String,
    },
}

impl From<BuildError> for QueryError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::Quote(message) => Self::ConnectionQuote(message),
            BuildError::Unsupported { dialect, feature } => Self::Unsupported {
                dialect: dialect.to_string(),
                feature,
            },
        }
    }
}
