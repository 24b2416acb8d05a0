//! Content fingerprints.
//!
//! Per-file digests are sha256 over raw bytes. The project aggregate
//! hashes the sorted (path, digest) pairs, so it changes exactly when
//! the set of files or any file's content changes.

use sha2::{Digest, Sha256};

pub fn bytes_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub fn file_digest(path: &std::path::Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(bytes_digest(&bytes))
}

/// Aggregate over (relative path, digest) pairs. The caller does not
/// need to pre-sort.
pub fn project_digest<'a, I>(files: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut pairs: Vec<(&str, &str)> = files.into_iter().collect();
    pairs.sort_unstable();
    let mut hasher = Sha256::new();
    for (path, digest) in pairs {
        hasher.update(path.as_bytes());
        hasher.update(b"\0");
        hasher.update(digest.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}
