//! Small filesystem helpers shared by the object store, refs, and the
//! client's index/config files: write-to-temp-then-rename so a reader never
//! observes a partial file, and `mkdir -p`-style directory creation.

use std::fs;
use std::io::Write;

use anyhow::{Context, Result};
use camino::Utf8Path;

/// Writes `bytes` to `path` atomically: a `tempfile` in the same directory,
/// `sync_all`, then `persist` (rename) over the destination.
pub fn atomic_write(path: &Utf8Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .with_context(|| format!("{path} has no parent directory"))?;
    fs::create_dir_all(dir).with_context(|| format!("Couldn't create {dir}"))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Couldn't create temp file in {dir}"))?;
    tmp.write_all(bytes)
        .with_context(|| format!("Couldn't write temp file for {path}"))?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("Couldn't persist temp file to {path}"))?;
    Ok(())
}

/// Writes only if `path` doesn't already exist. Used for write-once objects
/// (blobs, trees, snapshots) where a second write of identical content is
/// defined to be a no-op.
pub fn atomic_write_if_absent(path: &Utf8Path, bytes: &[u8]) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    atomic_write(path, bytes)
}
