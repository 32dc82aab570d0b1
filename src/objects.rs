//! The three object kinds a repository is built from: blobs (raw bytes,
//! addressed by the caller), trees and snapshots (structured, addressed by
//! their own canonical-JSON encoding).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One entry in a tree: always a blob today (the tree is flat — there are no
/// nested tree objects, per the data model).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

impl TreeEntry {
    pub fn blob(id: impl Into<String>) -> Self {
        Self {
            kind: "blob".to_string(),
            id: id.into(),
        }
    }
}

/// A flat mapping from relative-path-string to blob entry. `BTreeMap` keeps
/// this sorted by construction, which is what canonical-JSON encoding needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    pub entries: BTreeMap<String, TreeEntry>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, blob_id: impl Into<String>) {
        self.entries.insert(path.into(), TreeEntry::blob(blob_id));
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub snapshot_id: String,
    pub root_tree: String,
    pub parent: Option<String>,
    pub message: String,
    pub timestamp: String,
}

/// Result of comparing two root trees by path.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreeDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<String>,
}

impl TreeDiff {
    pub fn between(from: &Tree, to: &Tree) -> Self {
        let mut added = Vec::new();
        let mut removed = Vec::new();
        let mut modified = Vec::new();

        for (path, to_entry) in &to.entries {
            match from.entries.get(path) {
                None => added.push(path.clone()),
                Some(from_entry) if from_entry.id != to_entry.id => modified.push(path.clone()),
                Some(_) => {}
            }
        }
        for path in from.entries.keys() {
            if !to.entries.contains_key(path) {
                removed.push(path.clone());
            }
        }

        added.sort();
        removed.sort();
        modified.sort();
        Self {
            added,
            removed,
            modified,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn diff_is_symmetric() {
        let mut a = Tree::new();
        a.insert("keep.txt", "id-keep");
        a.insert("gone.txt", "id-gone");
        a.insert("changed.txt", "id-a");

        let mut b = Tree::new();
        b.insert("keep.txt", "id-keep");
        b.insert("new.txt", "id-new");
        b.insert("changed.txt", "id-b");

        let forward = TreeDiff::between(&a, &b);
        let backward = TreeDiff::between(&b, &a);

        assert_eq!(forward.added, backward.removed);
        assert_eq!(forward.removed, backward.added);
        assert_eq!(forward.modified, backward.modified);
        assert_eq!(forward.added, vec!["new.txt".to_string()]);
        assert_eq!(forward.removed, vec!["gone.txt".to_string()]);
        assert_eq!(forward.modified, vec!["changed.txt".to_string()]);
    }
}
