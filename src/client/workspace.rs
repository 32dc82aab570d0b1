//! The `.anchor` working-tree replica (C7): a local object store plus the
//! index, refs, HEAD and config files that make offline commit/log/diff/
//! branch/show/blame possible.

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};

use crate::file_util::atomic_write;
use crate::refs::Head;
use crate::store::ObjectStore;

use super::index::{self, Index};

pub const ANCHOR_DIR: &str = ".anchor";

/// Walks up from `start` looking for a `.anchor` directory. Mirrors how the
/// server locates `meta.json` — the first marker file found wins.
pub fn find_root(start: &Utf8Path) -> Option<Utf8PathBuf> {
    let mut dir = Some(start.to_path_buf());
    while let Some(d) = dir {
        if d.join(ANCHOR_DIR).is_dir() {
            return Some(d);
        }
        dir = d.parent().map(|p| p.to_path_buf());
    }
    None
}

pub struct Workspace {
    pub root: Utf8PathBuf,
    pub anchor_dir: Utf8PathBuf,
    pub store: ObjectStore,
}

impl Workspace {
    pub fn open(start: &Utf8Path) -> Result<Self> {
        let root = find_root(start)
            .with_context(|| format!("not an anchor working tree (or any parent): {start}"))?;
        Ok(Self::at(root))
    }

    fn at(root: Utf8PathBuf) -> Self {
        let anchor_dir = root.join(ANCHOR_DIR);
        let store = ObjectStore::new(anchor_dir.clone());
        Self {
            root,
            anchor_dir,
            store,
        }
    }

    /// Creates the `.anchor` skeleton under `root`. Errors if one already
    /// exists, for the same reason `engine::init_repo` does on the server.
    pub fn init(root: &Utf8Path) -> Result<Self> {
        let anchor_dir = root.join(ANCHOR_DIR);
        if anchor_dir.exists() {
            bail!("{anchor_dir} already exists");
        }
        std::fs::create_dir_all(anchor_dir.join("objects").join("blobs"))?;
        std::fs::create_dir_all(anchor_dir.join("objects").join("trees"))?;
        std::fs::create_dir_all(anchor_dir.join("objects").join("snapshots"))?;
        std::fs::create_dir_all(anchor_dir.join("refs").join("heads"))?;
        std::fs::create_dir_all(anchor_dir.join("refs").join("remotes"))?;
        std::fs::create_dir_all(anchor_dir.join("logs"))?;

        atomic_write(&anchor_dir.join("refs").join("heads").join("main"), b"")?;
        crate::refs::write_head(
            &anchor_dir.join("HEAD"),
            &Head::Symbolic("refs/heads/main".to_string()),
        )?;
        index::save(&anchor_dir.join("index"), &Index::new())?;
        atomic_write(&anchor_dir.join("config"), b"")?;
        atomic_write(&anchor_dir.join("logs").join("HEAD"), b"")?;

        Ok(Self::at(root.to_path_buf()))
    }

    pub fn index_path(&self) -> Utf8PathBuf {
        self.anchor_dir.join("index")
    }

    pub fn load_index(&self) -> Result<Index> {
        index::load(&self.index_path())
    }

    pub fn save_index(&self, idx: &Index) -> Result<()> {
        index::save(&self.index_path(), idx)
    }

    pub fn head_path(&self) -> Utf8PathBuf {
        self.anchor_dir.join("HEAD")
    }

    pub fn head(&self) -> Result<Head> {
        crate::refs::read_head(&self.head_path())?
            .ok_or_else(|| anyhow::anyhow!("HEAD is missing or empty"))
    }

    pub fn set_head(&self, head: &Head) -> Result<()> {
        crate::refs::write_head(&self.head_path(), head)
    }

    pub fn branch_ref_path(&self, branch: &str) -> Utf8PathBuf {
        self.anchor_dir.join("refs").join("heads").join(branch)
    }

    pub fn remote_ref_path(&self, remote: &str) -> Utf8PathBuf {
        self.anchor_dir
            .join("refs")
            .join("remotes")
            .join(remote)
            .join("main")
    }

    pub fn reflog_path(&self) -> Utf8PathBuf {
        self.anchor_dir.join("logs").join("HEAD")
    }

    /// Resolves `HEAD` to a snapshot id, or `None` for an unborn branch.
    pub fn head_snapshot(&self) -> Result<Option<String>> {
        match self.head()? {
            Head::Symbolic(branch) => crate::refs::read_ref(&self.anchor_dir.join(&branch)),
            Head::Detached(id) => Ok(Some(id)),
        }
    }

    /// The ref path `HEAD` points at, if `HEAD` is symbolic. Detached HEAD
    /// has no branch ref to advance — callers must check first.
    pub fn current_branch_ref(&self) -> Result<Option<Utf8PathBuf>> {
        match self.head()? {
            Head::Symbolic(branch) => Ok(Some(self.anchor_dir.join(branch))),
            Head::Detached(_) => Ok(None),
        }
    }

    pub fn current_branch_name(&self) -> Result<Option<String>> {
        match self.head()? {
            Head::Symbolic(branch) => Ok(branch.strip_prefix("refs/heads/").map(str::to_string)),
            Head::Detached(_) => Ok(None),
        }
    }

    // -- config: a flat `key = value` text file, one entry per line, in the
    // style of a minimal git-config. Keys may contain dots, e.g.
    // `remote.origin.url`. --

    pub fn config_path(&self) -> Utf8PathBuf {
        self.anchor_dir.join("config")
    }

    pub fn load_config(&self) -> Result<BTreeMap<String, String>> {
        let text = match std::fs::read_to_string(self.config_path()) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e).context("Couldn't read config"),
        };
        let mut map = BTreeMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                map.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        Ok(map)
    }

    pub fn save_config(&self, config: &BTreeMap<String, String>) -> Result<()> {
        let mut text = String::new();
        for (key, value) in config {
            text.push_str(key);
            text.push_str(" = ");
            text.push_str(value);
            text.push('\n');
        }
        atomic_write(&self.config_path(), text.as_bytes())
    }

    pub fn config_get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load_config()?.get(key).cloned())
    }

    pub fn config_set(&self, key: &str, value: &str) -> Result<()> {
        let mut config = self.load_config()?;
        config.insert(key.to_string(), value.to_string());
        self.save_config(&config)
    }

    pub fn remote_url(&self, remote: &str) -> Result<Option<String>> {
        self.config_get(&format!("remote.{remote}.url"))
    }

    /// The server-side repository name for `remote`: an explicit
    /// `remote.<name>.repo` entry (set by `clone`), falling back to the
    /// working tree's own directory name.
    pub fn remote_repo(&self, remote: &str) -> Result<String> {
        if let Some(repo) = self.config_get(&format!("remote.{remote}.repo"))? {
            return Ok(repo);
        }
        Ok(self
            .root
            .file_name()
            .unwrap_or("repository")
            .to_string())
    }

    /// Resolves `path` (absolute, or relative to the process's current
    /// directory) to a `root`-relative index key using forward slashes.
    pub fn relative_path(&self, path: &Utf8Path) -> Result<String> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            let cwd = Utf8PathBuf::from_path_buf(std::env::current_dir()?)
                .map_err(|_| anyhow::anyhow!("current directory isn't valid UTF-8"))?;
            cwd.join(path)
        };
        let relative = absolute
            .strip_prefix(&self.root)
            .with_context(|| format!("{absolute} is outside the working tree at {}", self.root))?;
        Ok(relative.as_str().replace('\\', "/"))
    }

    pub fn work_path(&self, relative: &str) -> Utf8PathBuf {
        self.root.join(relative)
    }

    pub fn build_tree_from_index(&self, index: &Index) -> crate::objects::Tree {
        let mut tree = crate::objects::Tree::new();
        for (path, id) in index {
            tree.insert(path.clone(), id.clone());
        }
        tree
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn init_then_open_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();

        let ws = Workspace::init(&root).unwrap();
        assert_eq!(ws.head().unwrap(), Head::Symbolic("refs/heads/main".to_string()));
        assert!(ws.load_index().unwrap().is_empty());

        let reopened = Workspace::open(&root).unwrap();
        assert_eq!(reopened.root, root);
    }

    #[test]
    fn init_rejects_existing() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        Workspace::init(&root).unwrap();
        assert!(Workspace::init(&root).is_err());
    }

    #[test]
    fn find_root_walks_up_from_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        Workspace::init(&root).unwrap();

        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_root(&nested), Some(root));
    }

    #[test]
    fn config_set_and_get_round_trip_dotted_keys() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        let ws = Workspace::init(&root).unwrap();

        ws.config_set("remote.origin.url", "http://localhost:8787").unwrap();
        assert_eq!(
            ws.remote_url("origin").unwrap(),
            Some("http://localhost:8787".to_string())
        );
    }
}
