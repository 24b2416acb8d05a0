//! Language-server session management for scribe.
//!
//! This crate launches external language servers (local processes,
//! docker containers, or TCP endpoints), speaks the framed JSON-RPC
//! wire protocol with them, and exposes typed requests for the handful
//! of operations the extraction pipeline needs: `didOpen`,
//! `documentSymbol`, and `references`.

pub mod codec;
pub mod config;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;

pub use config::{ServerConfig, ServerMode, ServerRegistry};
pub use error::SessionError;
pub use session::{Session, SessionState};
pub use transport::{project_relative, server_uri};

pub use lsp_types;
