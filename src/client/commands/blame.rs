//! `anchor blame <path>`

use anyhow::{Result, bail};
use clap::Parser;

use crate::client::workspace::Workspace;
use crate::engine::get_history;

#[derive(Debug, Parser)]
pub struct Args {
    path: String,
}

pub fn run(ws: &Workspace, args: Args) -> Result<()> {
    let Some(head) = ws.head_snapshot()? else {
        bail!("no commits yet");
    };
    let history = get_history(&ws.store, &head)?;

    for snapshot in &history {
        let tree = ws.store.get_tree(&snapshot.root_tree)?;
        let current_id = tree.entries.get(&args.path).map(|e| e.id.as_str());

        let parent_id = match &snapshot.parent {
            Some(parent) => {
                let parent_tree = ws.store.get_tree(&ws.store.get_snapshot(parent)?.root_tree)?;
                parent_tree.entries.get(&args.path).map(|e| e.id.clone())
            }
            None => None,
        };

        if current_id.is_some() && current_id != parent_id.as_deref() {
            println!("{} {}", snapshot.snapshot_id, args.path);
            return Ok(());
        }
    }

    bail!("{} was never committed", args.path);
}
