//! Error type for the graph store.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A relation whose caller and callee are the same symbol.
    #[error("self-referential relation rejected for symbol {0}")]
    SelfLoop(i64),

    #[error("unknown symbol id {0}")]
    MissingSymbol(i64),

    #[error("corrupt stored document: {0}")]
    Json(#[from] serde_json::Error),
}
