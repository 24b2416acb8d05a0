//! One managed language-server session.
//!
//! A session owns the server endpoint for one (project, language) pair
//! and exposes a synchronous-looking request API over the asynchronous
//! wire. Lifecycle: `Starting → Initializing → Ready → Draining →
//! Terminated`, with `Faulted` reachable from the first three once the
//! restart budget is spent.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use lsp_types::{
    ClientCapabilities, DidOpenTextDocumentParams, DocumentSymbolClientCapabilities,
    DocumentSymbolParams, DocumentSymbolResponse, Location, Position, ReferenceContext,
    ReferenceParams, TextDocumentClientCapabilities, TextDocumentIdentifier, TextDocumentItem,
    TextDocumentPositionParams, Url,
};
use serde_json::Value;
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot, Mutex, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::codec;
use crate::config::ServerConfig;
use crate::error::SessionError;
use crate::protocol::{self, Incoming, IncomingKind};
use crate::transport::{self, BoxedReader, BoxedWriter, Endpoint};

/// In-flight request cap when the server allows pipelining.
const MAX_PIPELINED: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Starting,
    Initializing,
    Ready,
    Draining,
    Faulted,
    Terminated,
}

type Pending = Arc<StdMutex<HashMap<i64, oneshot::Sender<Result<Value, SessionError>>>>>;
type Handlers = Arc<StdMutex<HashMap<String, mpsc::UnboundedSender<Value>>>>;

/// Live connection state; replaced wholesale on restart.
struct Wire {
    writer: Arc<Mutex<BoxedWriter>>,
    reader_task: JoinHandle<()>,
    child: Option<Child>,
    remote_root: Option<String>,
}

/// A managed connection to one language server.
pub struct Session {
    config: ServerConfig,
    root: PathBuf,
    state: StdMutex<SessionState>,
    wire: Mutex<Option<Wire>>,
    pending: Pending,
    handlers: Handlers,
    next_id: AtomicI64,
    gate: Semaphore,
    capabilities: StdMutex<Option<Value>>,
    opened: StdMutex<HashSet<PathBuf>>,
}

impl Session {
    /// Launches the server and completes the initialize handshake.
    pub async fn open(config: ServerConfig, root: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let root = root.into();
        let root = std::fs::canonicalize(&root).unwrap_or(root);
        let permits = if config.pipeline { MAX_PIPELINED } else { 1 };
        let session = Self {
            config,
            root,
            state: StdMutex::new(SessionState::Starting),
            wire: Mutex::new(None),
            pending: Arc::new(StdMutex::new(HashMap::new())),
            handlers: Arc::new(StdMutex::new(HashMap::new())),
            next_id: AtomicI64::new(1),
            gate: Semaphore::new(permits),
            capabilities: StdMutex::new(None),
            opened: StdMutex::new(HashSet::new()),
        };
        session.connect().await?;
        Ok(session)
    }

    pub fn language(&self) -> &str {
        &self.config.language
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap()
    }

    /// Capabilities the server declared at handshake time.
    pub fn server_capabilities(&self) -> Option<Value> {
        self.capabilities.lock().unwrap().clone()
    }

    /// Routes future notifications for `method` to the returned
    /// channel; unrouted notifications are dropped.
    pub fn on_notification(&self, method: &str) -> mpsc::UnboundedReceiver<Value> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.handlers.lock().unwrap().insert(method.to_string(), tx);
        rx
    }

    fn set_state(&self, next: SessionState) {
        *self.state.lock().unwrap() = next;
    }

    async fn connect(&self) -> Result<(), SessionError> {
        self.set_state(SessionState::Starting);
        let endpoint = Endpoint::launch(&self.config, &self.root).await?;
        let remote_root = endpoint.remote_root().map(str::to_string);
        let (reader, writer, child) = endpoint.into_parts();

        let writer = Arc::new(Mutex::new(writer));
        let reader_task = tokio::spawn(read_loop(
            reader,
            self.pending.clone(),
            self.handlers.clone(),
            writer.clone(),
        ));
        *self.wire.lock().await = Some(Wire {
            writer,
            reader_task,
            child,
            remote_root,
        });
        // A fresh server has seen no didOpen notifications.
        self.opened.lock().unwrap().clear();

        self.set_state(SessionState::Initializing);
        self.initialize().await?;
        self.set_state(SessionState::Ready);
        Ok(())
    }

    #[allow(deprecated)] // root_uri is deprecated in the protocol but servers still want it
    async fn initialize(&self) -> Result<(), SessionError> {
        let remote = self.remote_root().await;
        let root_uri = match remote.as_deref() {
            Some(remote) => Url::parse(&format!("file://{remote}"))
                .map_err(|e| SessionError::Start(format!("bad workspace uri: {e}")))?,
            None => Url::from_file_path(&self.root)
                .map_err(|_| SessionError::Start("workspace root is not absolute".into()))?,
        };
        let params = lsp_types::InitializeParams {
            root_uri: Some(root_uri),
            capabilities: ClientCapabilities {
                text_document: Some(TextDocumentClientCapabilities {
                    document_symbol: Some(DocumentSymbolClientCapabilities {
                        hierarchical_document_symbol_support: Some(true),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        };

        let result = self
            .send_request(
                "initialize",
                serde_json::to_value(params)?,
                self.config.handshake_timeout(),
            )
            .await
            .map_err(|e| SessionError::Start(format!("initialize handshake failed: {e}")))?;
        *self.capabilities.lock().unwrap() = result.get("capabilities").cloned();

        self.notify("initialized", serde_json::json!({})).await?;
        debug!(language = %self.config.language, "session ready");
        Ok(())
    }

    /// Sends a request with the configured timeout, restarting the
    /// server on transient failures up to the restart budget.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, SessionError> {
        self.request_with_timeout(method, params, self.config.request_timeout())
            .await
    }

    pub async fn request_with_timeout(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, SessionError> {
        let attempts = self.config.restart_attempts.max(1);
        for attempt in 0..attempts {
            match self.state() {
                SessionState::Faulted => return Err(SessionError::Unavailable),
                SessionState::Draining | SessionState::Terminated => {
                    return Err(SessionError::Cancelled)
                }
                _ => {}
            }
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|_| SessionError::Cancelled)?;
            let outcome = self.send_request(method, params.clone(), timeout).await;
            drop(permit);

            match outcome {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => {
                    warn!(method, attempt, error = %err, "transient request failure");
                    if attempt + 1 >= attempts {
                        break;
                    }
                    let backoff = Duration::from_millis(self.config.backoff_base_ms << attempt);
                    tokio::time::sleep(backoff).await;
                    if let Err(restart_err) = self.restart().await {
                        warn!(error = %restart_err, "session restart failed");
                        break;
                    }
                }
                Err(other) => return Err(other),
            }
        }
        self.fault().await;
        Err(SessionError::Unavailable)
    }

    /// One request attempt: allocate an id, register the completion
    /// handle, write the frame, await the matched response.
    async fn send_request(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, SessionError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(id, tx);

        let frame = serde_json::to_vec(&protocol::Request::new(id, method, params))?;
        let writer = match self.writer().await {
            Some(writer) => writer,
            None => {
                self.pending.lock().unwrap().remove(&id);
                return Err(SessionError::ServerCrashed);
            }
        };
        {
            let mut writer = writer.lock().await;
            if let Err(err) = codec::write_frame(&mut *writer, &frame).await {
                self.pending.lock().unwrap().remove(&id);
                debug!(method, error = %err, "request write failed");
                return Err(SessionError::ServerCrashed);
            }
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            // The completion handle was dropped without a reply; the
            // reader task is gone.
            Ok(Err(_)) => Err(SessionError::ServerCrashed),
            Err(_) => {
                self.pending.lock().unwrap().remove(&id);
                Err(SessionError::Timeout {
                    method: method.to_string(),
                    millis: timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Sends a notification (fire and forget).
    pub async fn notify(&self, method: &str, params: Value) -> Result<(), SessionError> {
        let frame = serde_json::to_vec(&protocol::Notification::new(method, params))?;
        let writer = self.writer().await.ok_or(SessionError::ServerCrashed)?;
        let mut writer = writer.lock().await;
        codec::write_frame(&mut *writer, &frame).await
    }

    async fn writer(&self) -> Option<Arc<Mutex<BoxedWriter>>> {
        self.wire.lock().await.as_ref().map(|w| w.writer.clone())
    }

    async fn remote_root(&self) -> Option<String> {
        self.wire
            .lock()
            .await
            .as_ref()
            .and_then(|w| w.remote_root.clone())
    }

    async fn restart(&self) -> Result<(), SessionError> {
        info!(language = %self.config.language, "restarting language server session");
        self.teardown(false).await;
        self.connect().await
    }

    async fn fault(&self) {
        warn!(
            language = %self.config.language,
            "session faulted; subsequent requests fail fast"
        );
        self.set_state(SessionState::Faulted);
        self.teardown(false).await;
    }

    /// Drops the wire, reaps the child, and fails anything in flight.
    async fn teardown(&self, as_cancelled: bool) {
        if let Some(wire) = self.wire.lock().await.take() {
            wire.reader_task.abort();
            if let Some(mut child) = wire.child {
                let _ = child.start_kill();
                let _ = child.wait().await;
            }
        }
        let mut pending = self.pending.lock().unwrap();
        for (_, tx) in pending.drain() {
            let err = if as_cancelled {
                SessionError::Cancelled
            } else {
                SessionError::ServerCrashed
            };
            let _ = tx.send(Err(err));
        }
    }

    /// Shuts the session down. Idempotent; in-flight requests complete
    /// with `Cancelled` and the backing process is reaped.
    pub async fn close(&self) {
        let polite = {
            let mut state = self.state.lock().unwrap();
            if *state == SessionState::Terminated {
                return;
            }
            let polite = *state == SessionState::Ready;
            *state = SessionState::Draining;
            polite
        };
        if polite {
            let _ = self
                .send_request("shutdown", Value::Null, Duration::from_secs(2))
                .await;
            let _ = self.notify("exit", Value::Null).await;
        }
        self.teardown(true).await;
        self.set_state(SessionState::Terminated);
    }

    // ---- feature requests ------------------------------------------------

    /// Announces a file to the server. Sent once per path per
    /// connection; the set resets when the session restarts.
    pub async fn did_open(&self, rel_path: &Path) -> Result<(), SessionError> {
        if !self.opened.lock().unwrap().insert(rel_path.to_path_buf()) {
            return Ok(());
        }
        let text = tokio::fs::read_to_string(self.root.join(rel_path)).await?;
        let uri = self.uri_for(rel_path).await?;
        let params = DidOpenTextDocumentParams {
            text_document: TextDocumentItem::new(uri, self.config.language_id.clone(), 1, text),
        };
        self.notify("textDocument/didOpen", serde_json::to_value(params)?)
            .await
    }

    /// Requests the (possibly nested) symbol list for a file.
    pub async fn document_symbols(
        &self,
        rel_path: &Path,
    ) -> Result<Option<DocumentSymbolResponse>, SessionError> {
        let uri = self.uri_for(rel_path).await?;
        let params = DocumentSymbolParams {
            text_document: TextDocumentIdentifier { uri },
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
        };
        let result = self
            .request("textDocument/documentSymbol", serde_json::to_value(params)?)
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(result)?))
    }

    /// Requests reference locations for the symbol at a position,
    /// excluding the declaration itself.
    pub async fn references(
        &self,
        rel_path: &Path,
        line: u32,
        character: u32,
    ) -> Result<Vec<Location>, SessionError> {
        let uri = self.uri_for(rel_path).await?;
        let params = ReferenceParams {
            text_document_position: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier { uri },
                position: Position { line, character },
            },
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
            context: ReferenceContext {
                include_declaration: false,
            },
        };
        let result = self
            .request("textDocument/references", serde_json::to_value(params)?)
            .await?;
        if result.is_null() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(result)?)
    }

    async fn uri_for(&self, rel_path: &Path) -> Result<Url, SessionError> {
        let remote = self.remote_root().await;
        transport::server_uri(&self.root, remote.as_deref(), rel_path)
    }
}

/// Dispatches everything arriving from the server: responses to their
/// completion handles, server requests to a null reply, notifications
/// to registered handlers.
async fn read_loop(
    mut reader: BoxedReader,
    pending: Pending,
    handlers: Handlers,
    writer: Arc<Mutex<BoxedWriter>>,
) {
    loop {
        match codec::read_frame(&mut reader).await {
            Ok(Some(payload)) => {
                let msg: Incoming = match serde_json::from_slice(&payload) {
                    Ok(msg) => msg,
                    Err(err) => {
                        warn!(error = %err, "dropping unparseable server message");
                        continue;
                    }
                };
                dispatch(msg, &pending, &handlers, &writer).await;
            }
            Ok(None) => {
                debug!("server closed its output stream");
                break;
            }
            Err(err) => {
                warn!(error = %err, "protocol error on server stream");
                break;
            }
        }
    }
    let mut pending = pending.lock().unwrap();
    for (_, tx) in pending.drain() {
        let _ = tx.send(Err(SessionError::ServerCrashed));
    }
}

async fn dispatch(
    msg: Incoming,
    pending: &Pending,
    handlers: &Handlers,
    writer: &Arc<Mutex<BoxedWriter>>,
) {
    match msg.classify() {
        IncomingKind::Response { id } => {
            let handle = pending.lock().unwrap().remove(&id);
            match handle {
                Some(tx) => {
                    let outcome = match msg.error {
                        Some(err) => Err(SessionError::Server {
                            code: err.code,
                            message: err.message,
                        }),
                        None => Ok(msg.result.unwrap_or(Value::Null)),
                    };
                    let _ = tx.send(outcome);
                }
                // Protocol violation, but not fatal.
                None => warn!(id, "dropping response with unmatched id"),
            }
        }
        IncomingKind::ServerRequest { id, method } => {
            debug!(%method, "answering server request with a null result");
            if let Ok(frame) = serde_json::to_vec(&protocol::NullReply::to(id)) {
                let mut writer = writer.lock().await;
                let _ = codec::write_frame(&mut *writer, &frame).await;
            }
        }
        IncomingKind::Notification { method } => {
            let handler = handlers.lock().unwrap().get(&method).cloned();
            match handler {
                Some(tx) => {
                    let _ = tx.send(msg.params.unwrap_or(Value::Null));
                }
                None => debug!(%method, "unhandled notification"),
            }
        }
        IncomingKind::Invalid => {
            warn!("dropping message that is neither response nor notification");
        }
    }
}
