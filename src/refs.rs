//! Refs: the only mutable on-disk state in a repository besides the lock
//! file and `meta.json`. A ref file holds a bare snapshot id (or is empty
//! for an unborn branch). The server has exactly one, `refs/main`; the
//! client has one per branch under `refs/heads/`, plus per-remote tracking
//! refs under `refs/remotes/<name>/main`.

use anyhow::{Context, Result};
use camino::Utf8Path;

use crate::file_util::atomic_write;

/// Reads a ref file's contents, stripped. Treats a missing file the same as
/// an empty one (unborn branch), since both mean "no commits yet".
pub fn read_ref(path: &Utf8Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(s) => {
            let s = s.trim();
            Ok(if s.is_empty() { None } else { Some(s.to_string()) })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Couldn't read ref {path}")),
    }
}

/// Atomically replaces the ref contents with `snapshot_id`, via rename, so
/// readers never observe a half-written ref.
pub fn write_ref(path: &Utf8Path, snapshot_id: &str) -> Result<()> {
    atomic_write(path, snapshot_id.as_bytes())
}

/// `HEAD` is either a pointer to a branch ref (symbolic) or a bare snapshot
/// id (detached).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    Symbolic(String),
    Detached(String),
}

const SYMBOLIC_PREFIX: &str = "ref: ";

pub fn read_head(path: &Utf8Path) -> Result<Option<Head>> {
    match std::fs::read_to_string(path) {
        Ok(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            Ok(Some(if let Some(branch) = s.strip_prefix(SYMBOLIC_PREFIX) {
                Head::Symbolic(branch.to_string())
            } else {
                Head::Detached(s.to_string())
            }))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Couldn't read HEAD {path}")),
    }
}

pub fn write_head(path: &Utf8Path, head: &Head) -> Result<()> {
    let contents = match head {
        Head::Symbolic(branch) => format!("{SYMBOLIC_PREFIX}{branch}"),
        Head::Detached(id) => id.clone(),
    };
    atomic_write(path, contents.as_bytes())
}

#[cfg(test)]
mod test {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn head_round_trips_symbolic_and_detached() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("HEAD")).unwrap();

        write_head(&path, &Head::Symbolic("refs/heads/main".to_string())).unwrap();
        assert_eq!(
            read_head(&path).unwrap(),
            Some(Head::Symbolic("refs/heads/main".to_string()))
        );

        write_head(&path, &Head::Detached("s_123".to_string())).unwrap();
        assert_eq!(
            read_head(&path).unwrap(),
            Some(Head::Detached("s_123".to_string()))
        );
    }

    #[test]
    fn missing_ref_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("refs/main")).unwrap();
        assert_eq!(read_ref(&path).unwrap(), None);
    }
}
