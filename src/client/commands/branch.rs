//! `anchor branch [name] [-d]`

use anyhow::{Result, bail};
use clap::Parser;

use crate::client::workspace::Workspace;

#[derive(Debug, Parser)]
pub struct Args {
    name: Option<String>,

    #[clap(short = 'd', long)]
    delete: bool,
}

pub fn run(ws: &Workspace, args: Args) -> Result<()> {
    let heads_dir = ws.anchor_dir.join("refs").join("heads");

    let Some(name) = args.name else {
        let current = ws.current_branch_name()?;
        let mut names: Vec<String> = std::fs::read_dir(&heads_dir)?
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        names.sort();
        for n in names {
            let marker = if Some(&n) == current.as_ref() { "*" } else { " " };
            println!("{marker} {n}");
        }
        return Ok(());
    };

    if args.delete {
        if ws.current_branch_name()?.as_deref() == Some(name.as_str()) {
            bail!("cannot delete the currently checked-out branch");
        }
        std::fs::remove_file(heads_dir.join(&name))?;
        return Ok(());
    }

    let target = ws
        .head_snapshot()?
        .ok_or_else(|| anyhow::anyhow!("HEAD has no commits yet; nothing to branch from"))?;
    let new_ref = heads_dir.join(&name);
    if new_ref.exists() {
        bail!("branch {name} already exists");
    }
    crate::refs::write_ref(&new_ref, &target)?;
    Ok(())
}
