//! Error type for the extraction pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("session error: {0}")]
    Session(#[from] scribe_lsp::SessionError),

    #[error("store error: {0}")]
    Store(#[from] scribe_graph::StoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("walk error: {0}")]
    Walk(#[from] ignore::Error),

    #[error("no language server configured for {0}")]
    NoServer(String),
}
