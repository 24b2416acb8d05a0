//! End-to-end scans against a canned language server.
//!
//! The fake server understands two files: `a.py` defines `alpha`,
//! `b.py` defines `beta`, and `alpha` calls `beta`. Every test drives
//! the real pipeline over a temporary project and checks what lands
//! in the store.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};

use scribe_extract::Extractor;
use scribe_graph::{DocScheduler, GraphStore};
use scribe_lsp::{codec, ServerConfig, ServerMode, ServerRegistry};

fn range(sl: u32, sc: u32, el: u32, ec: u32) -> Value {
    json!({
        "start": { "line": sl, "character": sc },
        "end": { "line": el, "character": ec },
    })
}

// 12 is the wire value for a function symbol.
fn document_symbols(uri: &str) -> Value {
    if uri.ends_with("a.py") {
        json!([{
            "name": "alpha",
            "kind": 12,
            "range": range(0, 0, 3, 12),
            "selectionRange": range(0, 4, 0, 9),
        }])
    } else if uri.ends_with("b.py") {
        json!([{
            "name": "beta",
            "kind": 12,
            "range": range(0, 0, 1, 12),
            "selectionRange": range(0, 4, 0, 8),
        }])
    } else {
        json!([])
    }
}

/// Which request the fake server answers with an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    None,
    SymbolsB,
    ReferencesB,
}

async fn handle_conn(
    stream: TcpStream,
    root: PathBuf,
    requests: Arc<AtomicUsize>,
    fault: Fault,
) {
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);
    while let Ok(Some(payload)) = codec::read_frame(&mut reader).await {
        let msg: Value = serde_json::from_slice(&payload).unwrap();
        let Some(id) = msg["id"].as_i64() else {
            continue; // notification
        };
        let method = msg["method"].as_str().unwrap_or("");
        let uri = msg["params"]["textDocument"]["uri"]
            .as_str()
            .unwrap_or("")
            .to_string();
        let result = match method {
            "initialize" => json!({
                "capabilities": { "documentSymbolProvider": true, "referencesProvider": true },
            }),
            "textDocument/documentSymbol" => {
                requests.fetch_add(1, Ordering::SeqCst);
                if fault == Fault::SymbolsB && uri.ends_with("b.py") {
                    let reply = json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "error": { "code": -32603, "message": "symbol provider exploded" },
                    });
                    codec::write_frame(&mut write, reply.to_string().as_bytes())
                        .await
                        .unwrap();
                    continue;
                }
                document_symbols(&uri)
            }
            "textDocument/references" => {
                requests.fetch_add(1, Ordering::SeqCst);
                if fault == Fault::ReferencesB && uri.ends_with("b.py") {
                    let reply = json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "error": { "code": -32603, "message": "reference provider exploded" },
                    });
                    codec::write_frame(&mut write, reply.to_string().as_bytes())
                        .await
                        .unwrap();
                    continue;
                }
                if uri.ends_with("b.py") {
                    json!([{
                        "uri": format!("file://{}/a.py", root.display()),
                        "range": range(2, 4, 2, 8),
                    }])
                } else {
                    json!([])
                }
            }
            _ => Value::Null,
        };
        let reply = json!({ "jsonrpc": "2.0", "id": id, "result": result });
        codec::write_frame(&mut write, reply.to_string().as_bytes())
            .await
            .unwrap();
    }
}

async fn spawn_fake(root: &Path, fault: Fault) -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(AtomicUsize::new(0));
    let root = root.to_path_buf();
    let counter = requests.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(handle_conn(stream, root.clone(), counter.clone(), fault));
        }
    });
    (addr, requests)
}

fn registry(addr: SocketAddr) -> ServerRegistry {
    let mut config = ServerConfig::new("python", "python", &[]);
    config.mode = ServerMode::Tcp {
        address: addr.to_string(),
    };
    let mut registry = ServerRegistry::default();
    registry.insert(config);
    registry
}

fn write_project(root: &Path) {
    fs::write(
        root.join("a.py"),
        "def alpha():\n    x = 1\n    beta()\n    return x\n",
    )
    .unwrap();
    fs::write(root.join("b.py"), "def beta():\n    return 2\n").unwrap();
}

#[tokio::test]
async fn scan_builds_the_graph_and_an_unchanged_rescan_is_free() {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    write_project(&root);
    let (addr, requests) = spawn_fake(&root, Fault::None).await;

    let extractor = Extractor::new(registry(addr));
    let mut store = GraphStore::open_in_memory().unwrap();

    let report = extractor.scan(&mut store, &root).await.unwrap();
    assert!(!report.up_to_date);
    assert_eq!(report.files_extracted, 2);
    assert!(report.files_failed.is_empty());
    assert_eq!(report.symbols, 2);
    assert_eq!(report.relations, 1);

    let counts = store.counts(report.project_id).unwrap();
    assert_eq!(counts.files, 2);
    assert_eq!(counts.symbols, 2);
    assert_eq!(counts.relationships, 1);
    assert!(store.scan_state(report.project_id).unwrap().scan_complete);

    // Leaves first: beta has no callees, alpha calls beta.
    let scheduler = DocScheduler::new(&store);
    let candidate = scheduler.next_candidate().unwrap().unwrap();
    let context = scheduler.context(candidate.symbol_id).unwrap();
    assert_eq!(context.symbol.name, "beta");
    assert_eq!(candidate.calls, 0);

    // An unchanged project makes zero protocol requests.
    let before = requests.load(Ordering::SeqCst);
    let report = extractor.scan(&mut store, &root).await.unwrap();
    assert!(report.up_to_date);
    assert_eq!(requests.load(Ordering::SeqCst), before);
    let counts_again = store.counts(report.project_id).unwrap();
    assert_eq!(counts, counts_again);
}

#[tokio::test]
async fn deleting_a_file_drops_its_symbols_and_edges() {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    write_project(&root);
    let (addr, requests) = spawn_fake(&root, Fault::None).await;

    let extractor = Extractor::new(registry(addr));
    let mut store = GraphStore::open_in_memory().unwrap();
    extractor.scan(&mut store, &root).await.unwrap();

    fs::remove_file(root.join("b.py")).unwrap();
    let before = requests.load(Ordering::SeqCst);
    let report = extractor.scan(&mut store, &root).await.unwrap();
    assert_eq!(report.files_removed, 1);
    assert_eq!(report.files_extracted, 0);
    // a.py is unchanged, so nothing talks to the server.
    assert_eq!(requests.load(Ordering::SeqCst), before);

    let counts = store.counts(report.project_id).unwrap();
    assert_eq!(counts.files, 1);
    assert_eq!(counts.symbols, 1);
    assert_eq!(counts.relationships, 0);
    assert!(store.scan_state(report.project_id).unwrap().scan_complete);
}

#[tokio::test]
async fn editing_a_callee_rebuilds_it_without_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    write_project(&root);
    let (addr, _) = spawn_fake(&root, Fault::None).await;

    let extractor = Extractor::new(registry(addr));
    let mut store = GraphStore::open_in_memory().unwrap();
    extractor.scan(&mut store, &root).await.unwrap();

    fs::write(
        root.join("b.py"),
        "def beta():\n    return 2\n# touched\n",
    )
    .unwrap();
    let report = extractor.scan(&mut store, &root).await.unwrap();
    assert_eq!(report.files_extracted, 1);
    assert_eq!(report.files_unchanged, 1);

    let counts = store.counts(report.project_id).unwrap();
    assert_eq!(counts.symbols, 2);
    assert_eq!(counts.relationships, 1);
}

#[tokio::test]
async fn editing_a_caller_keeps_its_outgoing_edges() {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    write_project(&root);
    let (addr, _) = spawn_fake(&root, Fault::None).await;

    let extractor = Extractor::new(registry(addr));
    let mut store = GraphStore::open_in_memory().unwrap();
    extractor.scan(&mut store, &root).await.unwrap();

    // Rebuilding a.py deletes alpha and its alpha -> beta edge; the
    // rescan must restore the edge even though b.py never changed.
    fs::write(
        root.join("a.py"),
        "def alpha():\n    x = 1\n    beta()\n    return x\n# touched\n",
    )
    .unwrap();
    let report = extractor.scan(&mut store, &root).await.unwrap();
    assert_eq!(report.files_extracted, 1);
    assert_eq!(report.files_unchanged, 1);
    assert_eq!(report.relations, 1);

    let counts = store.counts(report.project_id).unwrap();
    assert_eq!(counts.symbols, 2);
    assert_eq!(counts.relationships, 1);
    assert!(store.scan_state(report.project_id).unwrap().scan_complete);
}

#[tokio::test]
async fn a_failed_reference_lookup_is_retried_next_scan() {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    write_project(&root);
    let (addr, _) = spawn_fake(&root, Fault::ReferencesB).await;

    let extractor = Extractor::new(registry(addr));
    let mut store = GraphStore::open_in_memory().unwrap();

    let report = extractor.scan(&mut store, &root).await.unwrap();
    assert_eq!(report.files_extracted, 2);
    assert_eq!(report.files_failed, vec!["b.py".to_string()]);
    assert!(!store.scan_state(report.project_id).unwrap().scan_complete);

    // Nothing on disk changed, but b.py's references still need
    // answers, so it is extracted again instead of being skipped.
    let report = extractor.scan(&mut store, &root).await.unwrap();
    assert!(!report.up_to_date);
    assert_eq!(report.files_extracted, 1);
    assert_eq!(report.files_unchanged, 1);
    assert_eq!(report.files_failed, vec!["b.py".to_string()]);
}

#[tokio::test]
async fn a_failing_file_blocks_the_completed_digest() {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    write_project(&root);
    let (addr, _) = spawn_fake(&root, Fault::SymbolsB).await;

    let extractor = Extractor::new(registry(addr));
    let mut store = GraphStore::open_in_memory().unwrap();

    let report = extractor.scan(&mut store, &root).await.unwrap();
    assert_eq!(report.files_failed, vec!["b.py".to_string()]);
    assert_eq!(report.files_extracted, 1);
    assert!(!store.scan_state(report.project_id).unwrap().scan_complete);

    // The failed file is replanned; the healthy one is not.
    let report = extractor.scan(&mut store, &root).await.unwrap();
    assert!(!report.up_to_date);
    assert_eq!(report.files_extracted, 0);
    assert_eq!(report.files_unchanged, 1);
    assert_eq!(report.files_failed, vec!["b.py".to_string()]);
}
