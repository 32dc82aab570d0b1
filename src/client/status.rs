//! Working-tree status: classify every tracked-or-present path against the
//! index.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use camino::Utf8Path;
use walkdir::WalkDir;

use crate::hashing::hash_bytes;

use super::index::Index;

const EXCLUDED_DIRS: &[&str] = &[".anchor", ".git"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    pub modified: Vec<String>,
    pub untracked: Vec<String>,
    pub deleted: Vec<String>,
}

impl Status {
    pub fn is_clean(&self) -> bool {
        self.modified.is_empty() && self.untracked.is_empty() && self.deleted.is_empty()
    }
}

fn should_skip(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| EXCLUDED_DIRS.contains(&name))
        .unwrap_or(false)
}

/// Walks `work_dir`, comparing every regular file against `index`. Files
/// present in the index but absent on disk are `deleted`; files on disk
/// with no index entry are `untracked`; files in both with a different
/// content hash are `modified`.
pub fn status(work_dir: &Utf8Path, index: &Index) -> Result<Status> {
    let mut seen = BTreeSet::new();
    let mut modified = Vec::new();
    let mut untracked = Vec::new();

    let walker = WalkDir::new(work_dir.as_std_path())
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !should_skip(e));

    for entry in walker {
        let entry = entry.with_context(|| format!("Couldn't walk {work_dir}"))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = Utf8Path::from_path(entry.path())
            .with_context(|| format!("{} is not valid UTF-8", entry.path().display()))?;
        let relative = path
            .strip_prefix(work_dir)
            .with_context(|| format!("{path} is not under {work_dir}"))?
            .to_string()
            .replace('\\', "/");

        seen.insert(relative.clone());
        let bytes = std::fs::read(path).with_context(|| format!("Couldn't read {path}"))?;
        let id = hash_bytes(&bytes);

        match index.get(&relative) {
            Some(indexed_id) if indexed_id == &id => {}
            Some(_) => modified.push(relative),
            None => untracked.push(relative),
        }
    }

    let deleted: Vec<String> = index
        .keys()
        .filter(|path| !seen.contains(*path))
        .cloned()
        .collect();

    modified.sort();
    untracked.sort();
    Ok(Status {
        modified,
        untracked,
        deleted,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn classifies_modified_untracked_and_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let work = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        std::fs::write(work.join("kept.txt"), b"same").unwrap();
        std::fs::write(work.join("changed.txt"), b"new-bytes").unwrap();
        std::fs::write(work.join("new.txt"), b"fresh").unwrap();

        let mut index = Index::new();
        index.insert("kept.txt".to_string(), hash_bytes(b"same"));
        index.insert("changed.txt".to_string(), hash_bytes(b"old-bytes"));
        index.insert("gone.txt".to_string(), hash_bytes(b"long-gone"));

        let st = status(&work, &index).unwrap();
        assert_eq!(st.modified, vec!["changed.txt".to_string()]);
        assert_eq!(st.untracked, vec!["new.txt".to_string()]);
        assert_eq!(st.deleted, vec!["gone.txt".to_string()]);
    }

    #[test]
    fn clean_tree_reports_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let work = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        std::fs::write(work.join("a.txt"), b"hi").unwrap();

        let mut index = Index::new();
        index.insert("a.txt".to_string(), hash_bytes(b"hi"));

        assert!(status(&work, &index).unwrap().is_clean());
    }
}
