//! `anchor commit -m <msg> [-a]`

use anyhow::Result;
use clap::Parser;

use crate::client::workspace::Workspace;
use crate::hashing::compute_snapshot_id;
use crate::objects::Snapshot;

#[derive(Debug, Parser)]
pub struct Args {
    #[clap(short = 'm', long)]
    message: String,

    /// Re-hash already-tracked files and drop deleted ones before
    /// committing, instead of requiring an explicit `add`.
    #[clap(short = 'a', long)]
    all: bool,
}

pub fn run(ws: &Workspace, args: Args) -> Result<()> {
    let branch_ref = ws
        .current_branch_ref()?
        .ok_or_else(|| anyhow::anyhow!("HEAD is detached; checkout a branch before committing"))?;

    let mut index = ws.load_index()?;
    if args.all {
        let mut dropped = Vec::new();
        for (path, id) in index.iter_mut() {
            let absolute = ws.work_path(path);
            match std::fs::read(&absolute) {
                Ok(bytes) => *id = ws.store.put_blob(&bytes)?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => dropped.push(path.clone()),
                Err(e) => return Err(e.into()),
            }
        }
        for path in dropped {
            index.remove(&path);
        }
        ws.save_index(&index)?;
    }

    let parent = crate::refs::read_ref(&branch_ref)?;
    let parent_for_id = parent.clone().unwrap_or_default();

    let tree = ws.build_tree_from_index(&index);
    let tree_id = ws.store.put_tree(&tree)?;
    let snapshot_id = compute_snapshot_id(&tree_id, &parent_for_id);

    // Idempotent: an unchanged working tree reproduces the same snapshot id.
    // `put_snapshot`/`write_ref` are both no-ops-on-repeat, so re-running a
    // no-op commit is safe and simply re-affirms the current state, same as
    // `engine::save_snapshot`.
    let snapshot = Snapshot {
        snapshot_id: snapshot_id.clone(),
        root_tree: tree_id,
        parent: parent.clone(),
        message: args.message,
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    ws.store.put_snapshot(&snapshot)?;
    crate::refs::write_ref(&branch_ref, &snapshot_id)?;
    crate::reflog::append(
        &ws.reflog_path(),
        parent.as_deref().unwrap_or(""),
        &snapshot_id,
        &format!("commit: {}", snapshot.message),
    )?;

    let branch = ws.current_branch_name()?.unwrap_or_else(|| "HEAD".to_string());
    println!("[{branch} {snapshot_id}] {}", snapshot.message);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hashing::hash_bytes;
    use camino::Utf8PathBuf;

    #[test]
    fn commits_staged_file_and_advances_branch() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        let ws = Workspace::init(&root).unwrap();

        std::fs::write(root.join("hello.txt"), b"hi\n").unwrap();
        let mut index = ws.load_index().unwrap();
        index.insert("hello.txt".to_string(), ws.store.put_blob(b"hi\n").unwrap());
        ws.save_index(&index).unwrap();

        run(
            &ws,
            Args {
                message: "first".to_string(),
                all: false,
            },
        )
        .unwrap();
        let head_id = ws.head_snapshot().unwrap().unwrap();
        assert!(head_id.starts_with("s_"));
        assert_eq!(
            ws.store.get_tree(&ws.store.get_snapshot(&head_id).unwrap().root_tree).unwrap().entries["hello.txt"].id,
            hash_bytes(b"hi\n")
        );
    }

    #[test]
    fn second_identical_commit_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        let ws = Workspace::init(&root).unwrap();

        let mut index = ws.load_index().unwrap();
        index.insert("a.txt".to_string(), ws.store.put_blob(b"a").unwrap());
        ws.save_index(&index).unwrap();

        run(&ws, Args { message: "one".to_string(), all: false }).unwrap();
        let first = ws.head_snapshot().unwrap().unwrap();

        run(&ws, Args { message: "two".to_string(), all: false }).unwrap();
        let second = ws.head_snapshot().unwrap().unwrap();

        assert_eq!(first, second);
    }
}
