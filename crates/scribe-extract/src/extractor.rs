//! The scan pipeline: discover, plan, extract, relate.
//!
//! One language server session per language per pass. Files are
//! upserted before extraction so a failure can be pinned to its row;
//! the completed-scan digest is only recorded when every file of
//! every language made it through.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use scribe_graph::{GraphStore, RelationKind};
use scribe_lsp::{Session, SessionError};
use tracing::{debug, info, warn};

use crate::builder::{self, SymbolResolver};
use crate::changes::{self, ScanPlan};
use crate::discover::{self, SourceFile};
use crate::error::ExtractError;

/// Progress callbacks for long scans.
#[derive(Debug)]
pub enum ScanEvent<'a> {
    Planned {
        extract: usize,
        unchanged: usize,
        removed: usize,
    },
    FileStart(&'a str),
    FileDone(&'a str),
    FileFailed(&'a str),
    ReferencePass { symbols: usize },
    SymbolReferenced(&'a str),
}

#[derive(Debug, Default)]
pub struct ScanReport {
    pub project_id: i64,
    pub up_to_date: bool,
    pub files_extracted: usize,
    pub files_unchanged: usize,
    pub files_removed: usize,
    pub files_failed: Vec<String>,
    pub symbols: usize,
    pub relations: usize,
}

pub struct Extractor {
    registry: scribe_lsp::ServerRegistry,
}

impl Extractor {
    pub fn new(registry: scribe_lsp::ServerRegistry) -> Self {
        Self { registry }
    }

    pub async fn scan(
        &self,
        store: &mut GraphStore,
        root: &Path,
    ) -> Result<ScanReport, ExtractError> {
        self.scan_with(store, root, |_| {}).await
    }

    pub async fn scan_with<F>(
        &self,
        store: &mut GraphStore,
        root: &Path,
        mut notify: F,
    ) -> Result<ScanReport, ExtractError>
    where
        F: FnMut(ScanEvent<'_>),
    {
        let root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".into());
        let project_id = store.upsert_project(&root.to_string_lossy(), &name)?;

        let discovered = discover::discover(&root)?;
        let (supported, skipped): (Vec<SourceFile>, Vec<SourceFile>) = discovered
            .into_iter()
            .partition(|f| self.registry.config_for(&f.language).is_some());
        for file in &skipped {
            debug!(path = %file.rel_path, language = %file.language, "no server configured, skipping");
        }

        let change_set = match changes::plan_scan(store, project_id, supported)? {
            ScanPlan::UpToDate { .. } => {
                info!(project_id, "graph is current, nothing to scan");
                return Ok(ScanReport {
                    project_id,
                    up_to_date: true,
                    ..ScanReport::default()
                });
            }
            ScanPlan::Dirty(set) => set,
        };
        notify(ScanEvent::Planned {
            extract: change_set.to_extract.len(),
            unchanged: change_set.unchanged.len(),
            removed: change_set.removed.len(),
        });

        store.begin_scan(project_id)?;
        let mut files_removed = 0;
        for path in &change_set.removed {
            if store.remove_file(project_id, path)? {
                files_removed += 1;
            }
        }

        let mut by_language: BTreeMap<&str, Vec<&SourceFile>> = BTreeMap::new();
        for file in &change_set.to_extract {
            by_language.entry(file.language.as_str()).or_default().push(file);
        }

        let mut failed: Vec<String> = Vec::new();
        let mut files_extracted = 0;
        let mut symbols_total = 0;
        let mut relations_total = 0;

        for (language, files) in by_language {
            // Rows first, so a server that never starts still leaves
            // its files marked failed.
            let mut rows = Vec::with_capacity(files.len());
            for file in &files {
                let folder = Path::new(&file.rel_path)
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty());
                let folder_id = match folder {
                    Some(dir) => store.ensure_folder_chain(project_id, dir)?,
                    None => None,
                };
                let file_id =
                    store.upsert_file(project_id, folder_id, &file.rel_path, language, &file.digest)?;
                rows.push((file_id, file.rel_path.clone()));
            }

            let config = self
                .registry
                .config_for(language)
                .cloned()
                .ok_or_else(|| ExtractError::NoServer(language.to_string()))?;
            let session = match Session::open(config, &root).await {
                Ok(session) => session,
                Err(err) => {
                    warn!(language, error = %err, "language server did not start");
                    for (_, rel_path) in &rows {
                        store.mark_file_failed(project_id, rel_path)?;
                        failed.push(rel_path.clone());
                        notify(ScanEvent::FileFailed(rel_path));
                    }
                    continue;
                }
            };

            let mut extracted: Vec<(String, Vec<i64>)> = Vec::new();
            // Callees in other files whose edges a rebuild deleted;
            // their reference lookups must run again to restore them.
            let mut stale_callees: Vec<(i64, String)> = Vec::new();
            let mut aborted = false;
            for (file_id, rel_path) in &rows {
                notify(ScanEvent::FileStart(rel_path));
                if aborted {
                    store.mark_file_failed(project_id, rel_path)?;
                    failed.push(rel_path.clone());
                    notify(ScanEvent::FileFailed(rel_path));
                    continue;
                }
                let callees = store.external_callees(*file_id)?;
                match extract_file(&session, store, *file_id, rel_path).await {
                    Ok(ids) => {
                        symbols_total += ids.len();
                        files_extracted += 1;
                        extracted.push((rel_path.clone(), ids));
                        stale_callees.extend(callees);
                        notify(ScanEvent::FileDone(rel_path));
                    }
                    Err(err) => {
                        warn!(path = %rel_path, error = %err, "extraction failed");
                        store.mark_file_failed(project_id, rel_path)?;
                        failed.push(rel_path.clone());
                        notify(ScanEvent::FileFailed(rel_path));
                        if matches!(err, ExtractError::Session(SessionError::Unavailable)) {
                            aborted = true;
                        }
                    }
                }
            }

            if !aborted {
                let mut seen: HashSet<i64> = HashSet::new();
                let mut targets: Vec<(String, i64)> = Vec::new();
                for (rel_path, ids) in &extracted {
                    for id in ids {
                        if seen.insert(*id) {
                            targets.push((rel_path.clone(), *id));
                        }
                    }
                }
                for (id, rel_path) in stale_callees {
                    if seen.insert(id) {
                        targets.push((rel_path, id));
                    }
                }
                notify(ScanEvent::ReferencePass {
                    symbols: targets.len(),
                });
                relations_total += self
                    .relate(store, project_id, &root, &session, &targets, &mut failed, &mut notify)
                    .await?;
            }

            session.close().await;
        }

        if failed.is_empty() {
            store.complete_scan(project_id, &change_set.aggregate)?;
            info!(
                project_id,
                files = files_extracted,
                symbols = symbols_total,
                relations = relations_total,
                "scan complete"
            );
        } else {
            warn!(
                project_id,
                failed = failed.len(),
                "scan finished with failures, digest not recorded"
            );
        }

        Ok(ScanReport {
            project_id,
            up_to_date: false,
            files_extracted,
            files_unchanged: change_set.unchanged.len(),
            files_removed,
            files_failed: failed,
            symbols: symbols_total,
            relations: relations_total,
        })
    }

    /// Second pass: ask the server who references each target symbol,
    /// resolve every usage site to its enclosing symbol, and record
    /// caller-to-callee edges. A failed lookup marks the target's file
    /// failed so the next scan replans it.
    #[allow(clippy::too_many_arguments)]
    async fn relate<F>(
        &self,
        store: &GraphStore,
        project_id: i64,
        root: &Path,
        session: &Session,
        targets: &[(String, i64)],
        failed: &mut Vec<String>,
        notify: &mut F,
    ) -> Result<usize, ExtractError>
    where
        F: FnMut(ScanEvent<'_>),
    {
        let mut resolvers: HashMap<String, SymbolResolver> = HashMap::new();
        let mut relations = 0;
        for (rel_path, id) in targets {
            // A later rebuild in the same pass may have replaced the
            // symbol; the new row is its own target.
            let Some(symbol) = store.find_symbol(*id)? else {
                continue;
            };
            let locations = match session
                .references(
                    Path::new(rel_path),
                    symbol.selection.start.line,
                    symbol.selection.start.character,
                )
                .await
            {
                Ok(locations) => locations,
                Err(err) => {
                    warn!(path = %rel_path, symbol = %symbol.name, error = %err, "reference lookup failed");
                    store.mark_file_failed(project_id, rel_path)?;
                    if !failed.contains(rel_path) {
                        failed.push(rel_path.clone());
                    }
                    if matches!(err, SessionError::Unavailable) {
                        return Ok(relations);
                    }
                    continue;
                }
            };
            for location in &locations {
                let Some(target) = scribe_lsp::project_relative(&location.uri, root) else {
                    continue; // outside the project
                };
                let target = target.to_string_lossy().into_owned();
                let position = builder::convert_position(location.range.start);
                // Hits inside the symbol's own body are its
                // definition or recursion, not a caller.
                if target == *rel_path && symbol.range.contains(position) {
                    continue;
                }
                if !resolvers.contains_key(&target) {
                    let mut resolver = SymbolResolver::default();
                    if let Some(file_id) = store.file_id(project_id, &target)? {
                        for row in store.symbols_in_file(file_id)? {
                            resolver.insert(row.range, row.id);
                        }
                    }
                    resolvers.insert(target.clone(), resolver);
                }
                let caller = resolvers.get(&target).and_then(|r| r.resolve(position));
                let Some(caller_id) = caller else {
                    continue; // usage at module top level
                };
                if caller_id == *id {
                    continue;
                }
                if store.insert_relationship(caller_id, *id, RelationKind::Calls)? {
                    relations += 1;
                }
            }
            notify(ScanEvent::SymbolReferenced(&symbol.name));
        }
        Ok(relations)
    }
}

async fn extract_file(
    session: &Session,
    store: &mut GraphStore,
    file_id: i64,
    rel_path: &str,
) -> Result<Vec<i64>, ExtractError> {
    let path = Path::new(rel_path);
    session.did_open(path).await?;
    let batch = match session.document_symbols(path).await? {
        Some(response) => builder::flatten_symbols(&response),
        None => Vec::new(),
    };
    Ok(store.replace_file_symbols(file_id, &batch)?)
}
