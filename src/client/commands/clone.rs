//! `anchor clone <remote> <name> [dest]`

use anyhow::Result;
use camino::Utf8PathBuf;
use clap::Parser;

use crate::client::remote::RemoteClient;
use crate::client::workspace::Workspace;
use crate::engine::build_tree;
use crate::refs::Head;

#[derive(Debug, Parser)]
pub struct Args {
    /// Base URL of the server hosting the repository.
    remote: String,

    /// Repository name on the server.
    name: String,

    /// Destination directory; defaults to `name`.
    dest: Option<Utf8PathBuf>,
}

pub fn run(args: Args) -> Result<()> {
    let dest = args.dest.clone().unwrap_or_else(|| Utf8PathBuf::from(&args.name));
    std::fs::create_dir_all(&dest)?;
    let root = dest.canonicalize_utf8()?;

    let client = RemoteClient::new(&args.remote)?;

    // The archive gives us the working tree at the remote's current HEAD.
    let zip_path = root.join(".anchor-clone.zip");
    client.archive(&args.name, None, &zip_path)?;
    let file = std::fs::File::open(&zip_path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    archive.extract(root.as_std_path())?;
    std::fs::remove_file(&zip_path)?;

    let ws = Workspace::init(&root)?;

    // Populate the local object store with the full snapshot history, so
    // offline `log`/`diff`/`show`/`blame` work past the one checked-out
    // commit.
    let history = client.history(&args.name)?;
    for snapshot in &history {
        let tree = client.tree(&args.name, &snapshot.snapshot_id)?;
        for (path, entry) in &tree.entries {
            if !ws.store.has_blob(&entry.id) {
                let bytes = client.file(&args.name, &snapshot.snapshot_id, path)?;
                ws.store.put_blob(&bytes)?;
            }
        }
        ws.store.put_tree(&tree)?;
        ws.store.put_snapshot(snapshot)?;
    }

    if let Some(head) = history.first() {
        crate::refs::write_ref(&ws.branch_ref_path("main"), &head.snapshot_id)?;
        crate::refs::write_ref(&ws.remote_ref_path("origin"), &head.snapshot_id)?;
    }
    ws.set_head(&Head::Symbolic("refs/heads/main".to_string()))?;
    ws.config_set("remote.origin.url", &args.remote)?;
    ws.config_set("remote.origin.repo", &args.name)?;

    // Index the working copy we just extracted. `build_tree` both hashes
    // each file into the store and returns the flat path->id map we want.
    let working_tree = build_tree(&ws.store, &root)?;
    let mut index = crate::client::index::Index::new();
    for (path, entry) in working_tree.entries {
        index.insert(path, entry.id);
    }
    ws.save_index(&index)?;

    println!("Cloned {} into {root}", args.name);
    Ok(())
}
