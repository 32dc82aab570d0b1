//! The repository lock (C3): an advisory whole-repository exclusive lock,
//! held by `save_snapshot` for the whole write transaction. Readers never
//! take it — they tolerate the eventual-consistency window because objects
//! are always written before the ref that points at them.
//!
//! `flock(2)`-backed via `fs2`, so the lock survives process restarts; a
//! crashed writer releases it when its file descriptor closes, same as the
//! original's `fcntl.flock` use.

use std::fs::{File, OpenOptions};

use anyhow::{Context, Result};
use camino::Utf8Path;
use fs2::FileExt;

pub struct RepoLock {
    file: File,
}

impl RepoLock {
    /// Blocks until the lock at `<repo>/repo.lock` is acquired.
    pub fn acquire(repo_root: &Utf8Path) -> Result<Self> {
        let path = repo_root.join("repo.lock");
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Couldn't open lock file {path}"))?;
        file.lock_exclusive()
            .with_context(|| format!("Couldn't acquire lock {path}"))?;
        Ok(Self { file })
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}
