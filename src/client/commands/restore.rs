//! `anchor restore <path>` — overwrite a working-tree file with the
//! content recorded for it in the index.

use anyhow::{Result, bail};
use clap::Parser;

use crate::client::workspace::Workspace;

#[derive(Debug, Parser)]
pub struct Args {
    path: String,
}

pub fn run(ws: &Workspace, args: Args) -> Result<()> {
    let index = ws.load_index()?;
    let Some(id) = index.get(&args.path) else {
        bail!("{} is not in the index", args.path);
    };
    let bytes = ws.store.get_blob(id)?;
    let dest = ws.work_path(&args.path);
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&dest, bytes)?;
    Ok(())
}
