//! `anchor show [object]`

use anyhow::Result;
use clap::Parser;

use crate::client::diffrender::unified;
use crate::client::workspace::Workspace;
use crate::objects::{Tree, TreeDiff};

#[derive(Debug, Parser)]
pub struct Args {
    object: Option<String>,
}

pub fn run(ws: &Workspace, args: Args) -> Result<()> {
    let id = match args.object {
        Some(id) => id,
        None => ws
            .head_snapshot()?
            .ok_or_else(|| anyhow::anyhow!("HEAD has no commits yet"))?,
    };
    let snapshot = ws.store.get_snapshot(&id)?;
    let tree = ws.store.get_tree(&snapshot.root_tree)?;

    println!("snapshot {}", snapshot.snapshot_id);
    println!("Date:   {}", snapshot.timestamp);
    println!();
    for line in snapshot.message.lines() {
        println!("    {line}");
    }
    println!();

    let parent_tree = match &snapshot.parent {
        Some(parent_id) => ws.store.get_tree(&ws.store.get_snapshot(parent_id)?.root_tree)?,
        None => Tree::new(),
    };
    let diff = TreeDiff::between(&parent_tree, &tree);

    for path in &diff.added {
        let bytes = ws.store.get_blob(&tree.entries[path].id)?;
        print!("{}", unified(path, b"", &bytes));
    }
    for path in &diff.removed {
        let bytes = ws.store.get_blob(&parent_tree.entries[path].id)?;
        print!("{}", unified(path, &bytes, b""));
    }
    for path in &diff.modified {
        let old = ws.store.get_blob(&parent_tree.entries[path].id)?;
        let new = ws.store.get_blob(&tree.entries[path].id)?;
        print!("{}", unified(path, &old, &new));
    }
    Ok(())
}
