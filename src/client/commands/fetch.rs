//! `anchor fetch [remote]`

use anyhow::{Context, Result};
use clap::Parser;

use crate::client::remote::RemoteClient;
use crate::client::workspace::Workspace;

#[derive(Debug, Parser)]
pub struct Args {
    #[clap(default_value = "origin")]
    remote: String,
}

pub fn run(ws: &Workspace, args: Args) -> Result<()> {
    let url = ws
        .remote_url(&args.remote)?
        .with_context(|| format!("no URL configured for remote {}", args.remote))?;
    let repo = ws.remote_repo(&args.remote)?;
    let client = RemoteClient::new(url)?;

    let before = crate::refs::read_ref(&ws.remote_ref_path(&args.remote))?.unwrap_or_default();
    let history = client.history(&repo)?;

    let mut fetched = 0;
    for snapshot in &history {
        if ws.store.has_snapshot(&snapshot.snapshot_id) {
            continue;
        }
        let tree = client.tree(&repo, &snapshot.snapshot_id)?;
        for (path, entry) in &tree.entries {
            if !ws.store.has_blob(&entry.id) {
                let bytes = client.file(&repo, &snapshot.snapshot_id, path)?;
                ws.store.put_blob(&bytes)?;
            }
        }
        ws.store.put_tree(&tree)?;
        ws.store.put_snapshot(snapshot)?;
        fetched += 1;
    }

    if let Some(head) = history.first() {
        crate::refs::write_ref(&ws.remote_ref_path(&args.remote), &head.snapshot_id)?;
        crate::reflog::append(
            &ws.reflog_path(),
            &before,
            &head.snapshot_id,
            &format!("fetch: {} ({fetched} new)", args.remote),
        )?;
    }

    println!("Fetched {fetched} new snapshot(s) from {}", args.remote);
    Ok(())
}
