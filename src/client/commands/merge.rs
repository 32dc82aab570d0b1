//! `anchor merge <branch>` — fast-forward only.

use anyhow::{Result, bail};
use clap::Parser;

use crate::client::workspace::Workspace;

const MAX_ANCESTOR_WALK: usize = 1000;

#[derive(Debug, Parser)]
pub struct Args {
    branch: String,
}

pub fn run(ws: &Workspace, args: Args) -> Result<()> {
    let current_ref = ws
        .current_branch_ref()?
        .ok_or_else(|| anyhow::anyhow!("HEAD is detached; checkout a branch before merging"))?;
    let current = crate::refs::read_ref(&current_ref)?;

    let target_ref = ws.branch_ref_path(&args.branch);
    let target = crate::refs::read_ref(&target_ref)?
        .ok_or_else(|| anyhow::anyhow!("branch {} has no commits yet", args.branch))?;

    let Some(current) = current else {
        // Unborn branch: any merge is trivially a fast-forward.
        return fast_forward(ws, &current_ref, &target);
    };
    if current == target {
        println!("Already up to date.");
        return Ok(());
    }

    let mut cursor = Some(target.clone());
    let mut hops = 0;
    while let Some(id) = cursor {
        if id == current {
            return fast_forward(ws, &current_ref, &target);
        }
        hops += 1;
        if hops > MAX_ANCESTOR_WALK {
            break;
        }
        cursor = ws.store.get_snapshot(&id).ok().and_then(|s| s.parent);
    }

    bail!("not supported: {} is not a fast-forward of the current branch", args.branch);
}

fn fast_forward(ws: &Workspace, current_ref: &camino::Utf8Path, target: &str) -> Result<()> {
    crate::refs::write_ref(current_ref, target)?;

    let tree = ws.store.get_tree(&ws.store.get_snapshot(target)?.root_tree)?;
    let mut index = crate::client::index::Index::new();
    for (path, entry) in &tree.entries {
        let dest = ws.work_path(path);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&dest, ws.store.get_blob(&entry.id)?)?;
        index.insert(path.clone(), entry.id.clone());
    }
    ws.save_index(&index)
}
