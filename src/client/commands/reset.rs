//! `anchor reset [--hard|--soft] [ref] [path]`

use anyhow::{Context, Result};
use clap::Parser;

use crate::client::workspace::Workspace;
use crate::engine::get_history;
use crate::refs::Head;

#[derive(Debug, Parser)]
pub struct Args {
    #[clap(long)]
    hard: bool,

    #[clap(long, conflicts_with = "hard")]
    soft: bool,

    /// `HEAD`, `HEAD~N`, a branch name, or a bare snapshot id (any of those
    /// with a `~N` suffix to walk back N parents).
    #[clap(default_value = "HEAD")]
    target: String,

    /// If given, only this path's index entry is restored from the target
    /// tree; `HEAD`/the index/the working tree are otherwise untouched.
    path: Option<String>,
}

/// Resolves a reset target string to a snapshot id by walking `~N` parents.
fn resolve(ws: &Workspace, spec: &str) -> Result<String> {
    let (base, hops) = match spec.split_once('~') {
        Some((base, n)) => (base, n.parse::<usize>().context("invalid ~N suffix")?),
        None => (spec, 0),
    };

    let start = if base == "HEAD" {
        ws.head_snapshot()?
            .ok_or_else(|| anyhow::anyhow!("HEAD has no commits yet"))?
    } else if ws.branch_ref_path(base).exists() {
        crate::refs::read_ref(&ws.branch_ref_path(base))?
            .ok_or_else(|| anyhow::anyhow!("branch {base} has no commits yet"))?
    } else {
        base.to_string()
    };

    if hops == 0 {
        return Ok(start);
    }
    let history = get_history(&ws.store, &start)?;
    history
        .get(hops)
        .map(|s| s.snapshot_id.clone())
        .ok_or_else(|| anyhow::anyhow!("{spec} walks back further than the available history"))
}

pub fn run(ws: &Workspace, args: Args) -> Result<()> {
    let target_id = resolve(ws, &args.target)?;
    let tree = ws.store.get_tree(&ws.store.get_snapshot(&target_id)?.root_tree)?;

    if let Some(path) = &args.path {
        let mut index = ws.load_index()?;
        match tree.entries.get(path) {
            Some(entry) => {
                index.insert(path.clone(), entry.id.clone());
            }
            None => {
                index.remove(path);
            }
        }
        return ws.save_index(&index);
    }

    let branch_ref = ws.current_branch_ref()?;
    if let Some(branch_ref) = &branch_ref {
        crate::refs::write_ref(branch_ref, &target_id)?;
    } else {
        ws.set_head(&Head::Detached(target_id.clone()))?;
    }

    if args.soft {
        return Ok(());
    }

    let mut index = crate::client::index::Index::new();
    for (path, entry) in &tree.entries {
        index.insert(path.clone(), entry.id.clone());
    }
    ws.save_index(&index)?;

    if !args.hard {
        return Ok(());
    }

    for (path, entry) in &tree.entries {
        let dest = ws.work_path(path);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = ws.store.get_blob(&entry.id)?;
        std::fs::write(&dest, bytes)?;
    }
    Ok(())
}

