//! Error taxonomy for language-server sessions.
//!
//! Transient failures (`Timeout`, `ServerCrashed`) are retried by the
//! session itself; `Unavailable` is what callers see once retries are
//! exhausted and the session has faulted.

use thiserror::Error;

/// Errors produced by session lifecycle and request handling.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The server process or container could not be launched, or the
    /// initialize handshake did not complete.
    #[error("failed to start language server: {0}")]
    Start(String),

    /// A request did not receive a response within its deadline.
    #[error("request '{method}' timed out after {millis}ms")]
    Timeout { method: String, millis: u64 },

    /// The server process exited or the connection dropped while
    /// requests were outstanding.
    #[error("language server crashed or disconnected")]
    ServerCrashed,

    /// A malformed frame or envelope was received.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The server replied with a JSON-RPC error object.
    #[error("server error {code}: {message}")]
    Server { code: i64, message: String },

    /// The session faulted after exhausting its restart budget; all
    /// requests fail fast until the session is reopened.
    #[error("session is unavailable (faulted after retry exhaustion)")]
    Unavailable,

    /// The session was closed while the request was in flight.
    #[error("request cancelled by session shutdown")]
    Cancelled,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid message payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl SessionError {
    /// Whether the session should attempt a restart after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::ServerCrashed)
    }
}
