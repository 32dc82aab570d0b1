//! `anchor clean [-n]`

use anyhow::Result;
use clap::Parser;

use crate::client::status::status;
use crate::client::workspace::Workspace;

#[derive(Debug, Parser)]
pub struct Args {
    /// Dry run: print what would be removed without removing it.
    #[clap(short = 'n', long)]
    dry_run: bool,
}

pub fn run(ws: &Workspace, args: Args) -> Result<()> {
    let index = ws.load_index()?;
    let st = status(&ws.root, &index)?;

    for path in &st.untracked {
        if args.dry_run {
            println!("Would remove {path}");
        } else {
            std::fs::remove_file(ws.work_path(path))?;
            println!("Removed {path}");
        }
    }
    Ok(())
}
