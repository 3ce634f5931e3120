//! Error types for the Query DSL

use crate::query::QueryKind;

/// Errors raised while building or serializing requests
///
/// Missing inputs never produce an error: the affected clause is dropped.
/// Errors are reserved for conversions the caller asked for explicitly.
#[derive(Debug, thiserror::Error)]
pub enum DslError {
    #[error("Query of kind '{0}' is not a span query")]
    NotASpanQuery(QueryKind),

    #[error("Query of kind '{0}' is not a multi-term query")]
    NotAMultiTermQuery(QueryKind),

    #[error("Invalid index name '{name}': {reason}")]
    InvalidIndexName { name: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
