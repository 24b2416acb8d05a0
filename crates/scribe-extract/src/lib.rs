//! Builds the symbol graph out of language-server answers.
//!
//! A scan walks the project, fingerprints what it finds, skips
//! everything a completed earlier pass already covered, and runs the
//! changed files through the language server to refresh symbols and
//! caller-to-callee relations.

pub mod builder;
pub mod changes;
pub mod discover;
pub mod error;
pub mod extractor;
pub mod fingerprint;

pub use changes::{ChangeSet, ScanPlan};
pub use discover::SourceFile;
pub use error::ExtractError;
pub use extractor::{Extractor, ScanEvent, ScanReport};
