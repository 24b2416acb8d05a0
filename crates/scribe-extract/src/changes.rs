//! Change detection between the filesystem and the stored graph.
//!
//! A scan short-circuits only when the aggregate digest matches a
//! previously *completed* pass. Anything less re-plans file by file:
//! changed and new files get extracted, files that vanished get
//! removed, files whose stored digest still matches are left alone.

use std::collections::HashSet;

use scribe_graph::{GraphStore, StoreError};
use tracing::debug;

use crate::discover::SourceFile;
use crate::fingerprint;

#[derive(Debug)]
pub enum ScanPlan {
    /// Aggregate digest matches the last completed scan.
    UpToDate { aggregate: String },
    Dirty(ChangeSet),
}

#[derive(Debug)]
pub struct ChangeSet {
    pub to_extract: Vec<SourceFile>,
    pub unchanged: Vec<SourceFile>,
    /// Stored paths no longer on disk.
    pub removed: Vec<String>,
    /// Aggregate digest of the discovered set, recorded once the scan
    /// completes cleanly.
    pub aggregate: String,
}

pub fn plan_scan(
    store: &GraphStore,
    project_id: i64,
    discovered: Vec<SourceFile>,
) -> Result<ScanPlan, StoreError> {
    let aggregate = fingerprint::project_digest(
        discovered
            .iter()
            .map(|f| (f.rel_path.as_str(), f.digest.as_str())),
    );
    let state = store.scan_state(project_id)?;
    if state.scan_complete && state.aggregate_digest.as_deref() == Some(aggregate.as_str()) {
        debug!(project_id, "aggregate digest unchanged, nothing to do");
        return Ok(ScanPlan::UpToDate { aggregate });
    }

    let known = store.file_fingerprints(project_id)?;
    let failed: HashSet<String> = store.failed_files(project_id)?.into_iter().collect();

    let mut removed: Vec<String> = {
        let discovered_paths: HashSet<&str> =
            discovered.iter().map(|f| f.rel_path.as_str()).collect();
        known
            .keys()
            .filter(|path| !discovered_paths.contains(path.as_str()))
            .cloned()
            .collect()
    };
    removed.sort();

    let mut to_extract = Vec::new();
    let mut unchanged = Vec::new();
    for file in discovered {
        match known.get(&file.rel_path) {
            Some(digest) if *digest == file.digest && !failed.contains(&file.rel_path) => {
                unchanged.push(file);
            }
            _ => to_extract.push(file),
        }
    }

    debug!(
        project_id,
        extract = to_extract.len(),
        unchanged = unchanged.len(),
        removed = removed.len(),
        "planned scan"
    );
    Ok(ScanPlan::Dirty(ChangeSet {
        to_extract,
        unchanged,
        removed,
        aggregate,
    }))
}
