use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid path expression '{query}' at {position}: {message}")]
    Syntax {
        query: String,
        position: usize,
        message: String,
    },

    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("query root has no source text to match against")]
    UnlocatedRoot,
}
