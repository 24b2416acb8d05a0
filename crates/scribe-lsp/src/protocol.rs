//! JSON-RPC 2.0 envelope types.
//!
//! `lsp-types` covers the LSP parameter and result shapes; these types
//! cover the envelope around them, which that crate leaves to clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// An outgoing request carrying a locally generated id.
#[derive(Debug, Serialize)]
pub struct Request<'a> {
    pub jsonrpc: &'static str,
    pub id: i64,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

impl<'a> Request<'a> {
    pub fn new(id: i64, method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        }
    }
}

/// An outgoing notification (no id, no response expected).
#[derive(Debug, Serialize)]
pub struct Notification<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

impl<'a> Notification<'a> {
    pub fn new(method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
        }
    }
}

/// Reply sent for server-initiated requests we don't implement, so
/// well-behaved servers don't stall waiting on us.
#[derive(Debug, Serialize)]
pub struct NullReply {
    pub jsonrpc: &'static str,
    pub id: Value,
    pub result: Value,
}

impl NullReply {
    pub fn to(id: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Value::Null,
        }
    }
}

/// JSON-RPC error object from a response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Any message arriving from the server.
#[derive(Debug, Deserialize)]
pub struct Incoming {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<ResponseError>,
    #[serde(default)]
    pub params: Option<Value>,
}

/// Classification of an incoming message.
#[derive(Debug)]
pub enum IncomingKind {
    /// Response to one of our requests.
    Response { id: i64 },
    /// Server-initiated request that expects a reply.
    ServerRequest { id: Value, method: String },
    /// Server-initiated notification.
    Notification { method: String },
    /// Anything that fits none of the above.
    Invalid,
}

impl Incoming {
    pub fn classify(&self) -> IncomingKind {
        match (&self.id, &self.method) {
            (Some(id), None) => match id.as_i64() {
                Some(id) => IncomingKind::Response { id },
                None => IncomingKind::Invalid,
            },
            (Some(id), Some(method)) => IncomingKind::ServerRequest {
                id: id.clone(),
                method: method.clone(),
            },
            (None, Some(method)) => IncomingKind::Notification {
                method: method.clone(),
            },
            (None, None) => IncomingKind::Invalid,
        }
    }
}
