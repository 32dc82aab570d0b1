//! The object store (C1): blob/tree/snapshot files on disk, addressed by
//! content hash. Shared verbatim between the server (one store per
//! repository under `<SVCS_ROOT>/<repo>`) and the client replica (one store
//! per `.anchor` directory) — that sharing is what gives the client
//! server-identical snapshot ids.

use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};

use crate::canonical_json;
use crate::file_util::atomic_write_if_absent;
use crate::hashing::hash_bytes;
use crate::objects::{Snapshot, Tree};

#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: Utf8PathBuf,
}

impl ObjectStore {
    /// `root` is a repository root (contains, or will contain, `objects/`).
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn blobs_dir(&self) -> Utf8PathBuf {
        self.root.join("objects").join("blobs")
    }

    /// `objects/blobs/<id[0:2]>/<id[2:4]>/<id>.blob` — two-level sharding so
    /// directory listings stay bounded as the store grows.
    pub fn blob_path(&self, id: &str) -> Utf8PathBuf {
        self.blobs_dir().join(&id[0..2]).join(&id[2..4]).join(format!("{id}.blob"))
    }

    fn tree_path(&self, id: &str) -> Utf8PathBuf {
        self.root.join("objects").join("trees").join(format!("{id}.json"))
    }

    fn snapshot_path(&self, id: &str) -> Utf8PathBuf {
        self.root.join("objects").join("snapshots").join(format!("{id}.json"))
    }

    /// `id = sha256(bytes)`; writes atomically if the destination is absent.
    /// Idempotent: writing the same bytes twice leaves a byte-identical file.
    pub fn put_blob(&self, bytes: &[u8]) -> Result<String> {
        let id = hash_bytes(bytes);
        let path = self.blob_path(&id);
        atomic_write_if_absent(&path, bytes)
            .with_context(|| format!("Couldn't write blob {id}"))?;
        Ok(id)
    }

    pub fn get_blob(&self, id: &str) -> Result<Vec<u8>> {
        let path = self.blob_path(id);
        std::fs::read(&path).with_context(|| format!("Couldn't read blob {id} at {path}"))
    }

    pub fn has_blob(&self, id: &str) -> bool {
        self.blob_path(id).exists()
    }

    /// Serializes as canonical JSON with sorted keys; `id = sha256(bytes)`.
    pub fn put_tree(&self, tree: &Tree) -> Result<String> {
        let bytes = canonical_json::to_canonical_bytes(tree)?;
        let id = hash_bytes(&bytes);
        let path = self.tree_path(&id);
        atomic_write_if_absent(&path, &bytes)
            .with_context(|| format!("Couldn't write tree {id}"))?;
        Ok(id)
    }

    pub fn get_tree(&self, id: &str) -> Result<Tree> {
        let path = self.tree_path(id);
        let bytes =
            std::fs::read(&path).with_context(|| format!("Couldn't read tree {id} at {path}"))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn has_tree(&self, id: &str) -> bool {
        self.tree_path(id).exists()
    }

    /// Writes under the snapshot's own `snapshot_id` — the caller computed
    /// that id, this just persists the object.
    pub fn put_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        if snapshot.snapshot_id.is_empty() {
            bail!("refusing to store a snapshot with an empty id");
        }
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let path = self.snapshot_path(&snapshot.snapshot_id);
        atomic_write_if_absent(&path, &bytes)
            .with_context(|| format!("Couldn't write snapshot {}", snapshot.snapshot_id))
    }

    pub fn get_snapshot(&self, id: &str) -> Result<Snapshot> {
        let path = self.snapshot_path(id);
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Couldn't read snapshot {id} at {path}"))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn has_snapshot(&self, id: &str) -> bool {
        self.snapshot_path(id).exists()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn blob_write_is_idempotent_and_content_addressed() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap());

        let id = store.put_blob(b"hi\n").unwrap();
        assert_eq!(id, hash_bytes(b"hi\n"));

        let path = store.blob_path(&id);
        let before = std::fs::read(&path).unwrap();
        store.put_blob(b"hi\n").unwrap();
        let after = std::fs::read(&path).unwrap();
        assert_eq!(before, after);

        assert_eq!(store.get_blob(&id).unwrap(), b"hi\n");
    }

    #[test]
    fn tree_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap());

        let mut tree = Tree::new();
        tree.insert("hello.txt", "deadbeef");
        let id = store.put_tree(&tree).unwrap();
        let loaded = store.get_tree(&id).unwrap();
        assert_eq!(tree, loaded);
    }
}
