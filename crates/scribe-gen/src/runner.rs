//! Drives one generation pass over a project.
//!
//! The pass takes the scheduler's full visit order up front and walks
//! it once, so a symbol whose generator keeps failing is reported and
//! left behind instead of being offered again forever.

use std::path::Path;

use scribe_graph::{DocScheduler, GraphStore};
use tracing::{info, warn};

use crate::source;
use crate::{GenerationError, GenerationRequest, Generator};

#[derive(Debug, Clone, Copy)]
pub struct RunnerOptions {
    /// Generator attempts per symbol before giving up on it.
    pub max_attempts: u32,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self { max_attempts: 2 }
    }
}

#[derive(Debug)]
pub enum GenEvent<'a> {
    Planned { symbols: usize },
    SymbolDone(&'a str),
    SymbolFailed(&'a str),
}

#[derive(Debug, Default)]
pub struct GenerationReport {
    pub documented: usize,
    /// (symbol id, name, last error) per symbol that never produced a
    /// usable document.
    pub failed: Vec<(i64, String, String)>,
    /// Files whose every symbol is now documented.
    pub files_completed: usize,
}

pub async fn document_project(
    store: &GraphStore,
    root: &Path,
    generator: &dyn Generator,
    options: RunnerOptions,
) -> Result<GenerationReport, GenerationError> {
    document_project_with(store, root, generator, options, |_| {}).await
}

pub async fn document_project_with<F>(
    store: &GraphStore,
    root: &Path,
    generator: &dyn Generator,
    options: RunnerOptions,
    mut notify: F,
) -> Result<GenerationReport, GenerationError>
where
    F: FnMut(GenEvent<'_>),
{
    let scheduler = DocScheduler::new(store);
    let order = scheduler.generation_order()?;
    notify(GenEvent::Planned {
        symbols: order.len(),
    });

    let mut report = GenerationReport::default();
    for candidate in order {
        let context = scheduler.context(candidate.symbol_id)?;
        let name = context.symbol.name.clone();
        let source = match source::symbol_source(root, &context) {
            Ok(source) => source,
            Err(err) => {
                warn!(symbol = %name, error = %err, "could not read symbol source");
                report.failed.push((candidate.symbol_id, name.clone(), err.to_string()));
                notify(GenEvent::SymbolFailed(&name));
                continue;
            }
        };
        let request = GenerationRequest { context, source };

        let mut attempt = 0;
        loop {
            match generator.generate(&request).await {
                Ok(doc) => {
                    scheduler.mark_documented(candidate.symbol_id, &doc)?;
                    report.documented += 1;
                    notify(GenEvent::SymbolDone(&name));
                    break;
                }
                Err(err) if attempt + 1 < options.max_attempts => {
                    warn!(symbol = %name, attempt, error = %err, "generation attempt failed, retrying");
                    attempt += 1;
                }
                Err(err) => {
                    warn!(symbol = %name, error = %err, "generation gave up");
                    report
                        .failed
                        .push((candidate.symbol_id, name.clone(), err.to_string()));
                    notify(GenEvent::SymbolFailed(&name));
                    break;
                }
            }
        }
    }

    report.files_completed = store.rollup_file_docs()?;
    info!(
        documented = report.documented,
        failed = report.failed.len(),
        files_completed = report.files_completed,
        "generation pass finished"
    );
    Ok(report)
}
