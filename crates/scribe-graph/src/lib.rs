//! The symbol graph store.
//!
//! Persists projects, files, symbols, and caller-to-callee relations
//! in SQLite, and schedules documentation generation over them with a
//! leaves-first policy.

pub mod error;
pub mod model;
pub mod scheduler;
pub mod schema;
pub mod store;

pub use error::StoreError;
pub use model::{
    CalleeContext, GeneratedDoc, NewSymbol, ParamDoc, RaiseDoc, RelationKind, ReturnDoc,
    ScanState, SourcePosition, SourceRange, SymbolContext, SymbolKind, SymbolRow,
};
pub use scheduler::{Candidate, DocScheduler};
pub use store::{GraphCounts, GraphStore};
