//! Source file discovery.
//!
//! Walks the project tree with gitignore semantics and keeps files in
//! languages the pipeline recognizes. Results are sorted by relative
//! path so every downstream pass sees a stable order.

use std::path::Path;

use ignore::WalkBuilder;
use tracing::trace;

use crate::error::ExtractError;
use crate::fingerprint;

/// A discovered source file, addressed relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub rel_path: String,
    pub language: String,
    pub digest: String,
}

/// Language for a path, by extension.
pub fn language_for(path: &Path) -> Option<&'static str> {
    match path.extension()?.to_str()? {
        "py" | "pyi" => Some("python"),
        "ts" | "tsx" | "js" | "jsx" => Some("typescript"),
        "rs" => Some("rust"),
        "go" => Some("go"),
        "java" => Some("java"),
        _ => None,
    }
}

pub fn discover(root: &Path) -> Result<Vec<SourceFile>, ExtractError> {
    let mut files = Vec::new();
    let walk = WalkBuilder::new(root).require_git(false).build();
    for entry in walk {
        let entry = entry?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        let Some(language) = language_for(path) else {
            continue;
        };
        let rel = path.strip_prefix(root).unwrap_or(path);
        let digest = fingerprint::file_digest(path)?;
        trace!(path = %rel.display(), language, "discovered source file");
        files.push(SourceFile {
            rel_path: rel.to_string_lossy().into_owned(),
            language: language.to_string(),
            digest,
        });
    }
    files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(files)
}
