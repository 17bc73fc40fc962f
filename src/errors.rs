use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Null argument: {0}")]
    NullArgument(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Non-unique result: {0} entities matched a single-result query")]
    NonUniqueResult(usize),

    /// Failure reported by a manager while executing a query.
    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Unbound parameter: @{0}")]
    UnboundParameter(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl DbError {
    pub(crate) fn type_mismatch(expected: &str, found: &str) -> Self {
        Self::TypeMismatch { expected: expected.to_string(), found: found.to_string() }
    }
}
