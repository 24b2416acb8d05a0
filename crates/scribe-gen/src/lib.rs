//! Documentation generation over the symbol graph.
//!
//! The store decides *what* to document and in which order; this
//! crate decides *how* a single symbol becomes documentation. The
//! [`Generator`] trait is the seam: the CLI plugs an LLM-backed
//! implementation in, tests plug in canned ones.

use async_trait::async_trait;
use thiserror::Error;

use scribe_graph::{GeneratedDoc, SymbolContext};

pub mod runner;
pub mod source;

pub use runner::{document_project, document_project_with, GenEvent, GenerationReport, RunnerOptions};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("store error: {0}")]
    Store(#[from] scribe_graph::StoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("generator failed: {0}")]
    Generator(String),
}

/// Everything a generator gets to look at: the symbol with its callee
/// summaries, and the source text of its definition.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub context: SymbolContext,
    pub source: String,
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedDoc, GenerationError>;
}
