//! The snapshot engine (C2): build a tree from a working directory, write a
//! snapshot, advance a ref, traverse history, compute diffs, export an
//! archive. Identical logic drives both the server's repository store and
//! the client's `.anchor` replica — that's what gives the two matching
//! snapshot ids for the same `(tree_id, parent)` pair.

use std::io::Read;

use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use walkdir::WalkDir;

use crate::hashing::compute_snapshot_id;
use crate::lock::RepoLock;
use crate::meta::RepoMeta;
use crate::objects::{Snapshot, Tree, TreeDiff};
use crate::store::ObjectStore;

/// Directories never walked into when building a tree from a working copy.
const EXCLUDED_DIRS: &[&str] = &[".anchor", ".git"];

fn should_skip(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| EXCLUDED_DIRS.contains(&name))
        .unwrap_or(false)
}

/// Walks `work_dir` depth-first, hashing every regular file into `store` and
/// recording `relative/path -> blob-id` in a single flat tree.
pub fn build_tree(store: &ObjectStore, work_dir: &Utf8Path) -> Result<Tree> {
    let mut tree = Tree::new();

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

        let mut fh = std::fs::File::open(path).with_context(|| format!("Couldn't open {path}"))?;
        let mut bytes = Vec::new();
        fh.read_to_end(&mut bytes)?;
        let id = store.put_blob(&bytes)?;
        tree.insert(relative, id);
    }

    Ok(tree)
}

/// Acquires the repo lock, builds a tree from `work_dir`, writes it and a
/// snapshot object, and advances the ref at `ref_path`. Returns the new
/// snapshot id.
pub fn save_snapshot(
    store: &ObjectStore,
    lock_root: &Utf8Path,
    ref_path: &Utf8Path,
    message: &str,
    work_dir: &Utf8Path,
) -> Result<String> {
    let _lock = RepoLock::acquire(lock_root)?;

    let parent = crate::refs::read_ref(ref_path)?;
    let parent_for_id = parent.clone().unwrap_or_default();

    let tree = build_tree(store, work_dir)?;
    let tree_id = store.put_tree(&tree)?;

    let snapshot_id = compute_snapshot_id(&tree_id, &parent_for_id);

    let snapshot = Snapshot {
        snapshot_id: snapshot_id.clone(),
        root_tree: tree_id,
        parent,
        message: message.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    store.put_snapshot(&snapshot)?;
    crate::refs::write_ref(ref_path, &snapshot_id)?;

    Ok(snapshot_id)
}

/// Follows `parent` from `start` until null or a missing object. Returns
/// newest-to-oldest.
pub fn get_history(store: &ObjectStore, start: &str) -> Result<Vec<Snapshot>> {
    let mut history = Vec::new();
    let mut current = Some(start.to_string());

    while let Some(id) = current {
        let Ok(snapshot) = store.get_snapshot(&id) else {
            break;
        };
        current = snapshot.parent.clone();
        history.push(snapshot);
    }

    Ok(history)
}

pub fn get_diff(store: &ObjectStore, from_id: &str, to_id: &str) -> Result<TreeDiff> {
    let from_tree = snapshot_tree(store, from_id)?;
    let to_tree = snapshot_tree(store, to_id)?;
    Ok(TreeDiff::between(&from_tree, &to_tree))
}

fn snapshot_tree(store: &ObjectStore, snapshot_id: &str) -> Result<Tree> {
    let snapshot = store.get_snapshot(snapshot_id)?;
    store.get_tree(&snapshot.root_tree)
}

/// Reconstructs a working tree from a snapshot's root tree into a fresh
/// temp directory, zips it with deflate, and returns the zip's path. The
/// caller is responsible for removing the zip after streaming it.
pub fn create_archive(store: &ObjectStore, snapshot_id: &str) -> Result<Utf8PathBuf> {
    let tree = snapshot_tree(store, snapshot_id)?;
    let work_dir = tempfile::tempdir().context("Couldn't create temp dir for archive")?;
    let work_path = Utf8Path::from_path(work_dir.path()).context("temp dir isn't UTF-8")?;

    for (path, entry) in &tree.entries {
        let dest = work_path.join(path);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = store.get_blob(&entry.id)?;
        std::fs::write(&dest, bytes).with_context(|| format!("Couldn't write {dest}"))?;
    }

    let zip_file = tempfile::Builder::new()
        .suffix(".zip")
        .tempfile()
        .context("Couldn't create temp zip file")?;
    let zip_path = zip_file
        .path()
        .to_owned()
        .into_os_string()
        .into_string()
        .map_err(|_| anyhow::anyhow!("temp zip path isn't UTF-8"))?;

    {
        let file = zip_file.reopen().context("Couldn't reopen temp zip file")?;
        let mut writer = zip::ZipWriter::new(file);
        let options =
            zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for entry in WalkDir::new(work_dir.path()) {
            let entry = entry?;
            let rel = entry
                .path()
                .strip_prefix(work_dir.path())
                .expect("walked under work_dir");
            if rel.as_os_str().is_empty() {
                continue;
            }
            let name = rel.to_string_lossy().replace('\\', "/");
            if entry.file_type().is_dir() {
                writer.add_directory(format!("{name}/"), options)?;
            } else {
                writer.start_file(name, options)?;
                let mut bytes = Vec::new();
                std::fs::File::open(entry.path())?.read_to_end(&mut bytes)?;
                std::io::Write::write_all(&mut writer, &bytes)?;
            }
        }
        writer.finish()?;
    }

    let zip_path = Utf8PathBuf::from(zip_path);
    zip_file.keep().context("Couldn't persist temp zip file")?;
    Ok(zip_path)
}

/// Extracts the archive at `zip_path` into a fresh temp directory, then
/// `save_snapshot`s it. The temp directory is removed on every exit path
/// since it's an RAII `TempDir`.
pub fn unzip_and_save_snapshot(
    store: &ObjectStore,
    lock_root: &Utf8Path,
    ref_path: &Utf8Path,
    message: &str,
    zip_path: &Utf8Path,
) -> Result<String> {
    let work_dir = tempfile::tempdir().context("Couldn't create temp dir for upload")?;
    let work_path = Utf8Path::from_path(work_dir.path()).context("temp dir isn't UTF-8")?;

    let file = std::fs::File::open(zip_path).with_context(|| format!("Couldn't open {zip_path}"))?;
    let mut archive = zip::ZipArchive::new(file).context("Not a valid zip archive")?;
    archive
        .extract(work_path)
        .with_context(|| format!("Couldn't extract {zip_path}"))?;

    save_snapshot(store, lock_root, ref_path, message, work_path)
}

/// Creates the repo directory, writes `meta.json`, creates an empty
/// `refs/main`. Errors if the repo directory already exists.
pub fn init_repo(svcs_root: &Utf8Path, name: &str) -> Result<Utf8PathBuf> {
    let repo_root = svcs_root.join(name);
    if repo_root.exists() {
        bail!("repository {name} already exists");
    }
    std::fs::create_dir_all(repo_root.join("objects").join("blobs"))?;
    std::fs::create_dir_all(repo_root.join("objects").join("trees"))?;
    std::fs::create_dir_all(repo_root.join("objects").join("snapshots"))?;
    std::fs::create_dir_all(repo_root.join("refs"))?;

    RepoMeta::new(name).save(&repo_root.join("meta.json"))?;
    crate::file_util::atomic_write(&repo_root.join("refs").join("main"), b"")?;

    Ok(repo_root)
}

#[cfg(test)]
mod test {
    use super::*;

    fn new_store() -> (tempfile::TempDir, ObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap());
        (dir, store)
    }

    #[test]
    fn save_snapshot_is_deterministic_on_repeat() {
        let (dir, store) = new_store();
        let repo_root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        let ref_path = repo_root.join("refs").join("main");
        std::fs::create_dir_all(repo_root.join("refs")).unwrap();

        let work = tempfile::tempdir().unwrap();
        let work_path = Utf8PathBuf::from_path_buf(work.path().to_owned()).unwrap();
        std::fs::write(work_path.join("hello.txt"), b"hi\n").unwrap();

        let first = save_snapshot(&store, &repo_root, &ref_path, "first", &work_path).unwrap();
        let second = save_snapshot(&store, &repo_root, &ref_path, "first", &work_path).unwrap();
        assert_eq!(first, second);

        let on_disk = crate::refs::read_ref(&ref_path).unwrap();
        assert_eq!(on_disk, Some(first));
    }

    #[test]
    fn history_follows_parents_newest_first() {
        let (dir, store) = new_store();
        let repo_root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        let ref_path = repo_root.join("refs").join("main");
        std::fs::create_dir_all(repo_root.join("refs")).unwrap();

        let work = tempfile::tempdir().unwrap();
        let work_path = Utf8PathBuf::from_path_buf(work.path().to_owned()).unwrap();

        std::fs::write(work_path.join("a.txt"), b"one").unwrap();
        let first = save_snapshot(&store, &repo_root, &ref_path, "first", &work_path).unwrap();
        std::fs::write(work_path.join("a.txt"), b"two").unwrap();
        let second = save_snapshot(&store, &repo_root, &ref_path, "second", &work_path).unwrap();

        let history = get_history(&store, &second).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].snapshot_id, second);
        assert_eq!(history[1].snapshot_id, first);
    }

    #[test]
    fn diff_between_snapshots() {
        let (dir, store) = new_store();
        let repo_root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        let ref_path = repo_root.join("refs").join("main");
        std::fs::create_dir_all(repo_root.join("refs")).unwrap();

        let work = tempfile::tempdir().unwrap();
        let work_path = Utf8PathBuf::from_path_buf(work.path().to_owned()).unwrap();
        std::fs::write(work_path.join("hello.txt"), b"hi\n").unwrap();
        let s1 = save_snapshot(&store, &repo_root, &ref_path, "first", &work_path).unwrap();

        std::fs::write(work_path.join("world.txt"), b"w").unwrap();
        let s2 = save_snapshot(&store, &repo_root, &ref_path, "second", &work_path).unwrap();

        let diff = get_diff(&store, &s1, &s2).unwrap();
        assert_eq!(diff.added, vec!["world.txt".to_string()]);
        assert!(diff.removed.is_empty());
        assert!(diff.modified.is_empty());
    }

    #[test]
    fn init_repo_rejects_existing() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        init_repo(&root, "demo").unwrap();
        assert!(init_repo(&root, "demo").is_err());
    }

    #[test]
    fn archive_round_trips_tree() {
        let (dir, store) = new_store();
        let repo_root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        let ref_path = repo_root.join("refs").join("main");
        std::fs::create_dir_all(repo_root.join("refs")).unwrap();

        let work = tempfile::tempdir().unwrap();
        let work_path = Utf8PathBuf::from_path_buf(work.path().to_owned()).unwrap();
        std::fs::write(work_path.join("hello.txt"), b"hi\n").unwrap();
        let snap = save_snapshot(&store, &repo_root, &ref_path, "first", &work_path).unwrap();

        let zip_path = create_archive(&store, &snap).unwrap();

        let reextracted = tempfile::tempdir().unwrap();
        let reextracted_path = Utf8PathBuf::from_path_buf(reextracted.path().to_owned()).unwrap();
        let file = std::fs::File::open(&zip_path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        archive.extract(&reextracted_path).unwrap();

        let rebuilt = build_tree(&store, &reextracted_path).unwrap();
        let original_tree = store.get_tree(&store.get_snapshot(&snap).unwrap().root_tree).unwrap();
        assert_eq!(rebuilt, original_tree);

        std::fs::remove_file(&zip_path).unwrap();
    }
}
