//! `anchor checkout [-b] <arg>`
//!
//! Moves `HEAD` only. The working tree and index are left untouched on a
//! branch switch — a documented limitation, not an oversight: reconciling
//! the working tree with the target branch's files is `merge`'s job when
//! the switch is a fast-forward, and there is no general-purpose
//! non-fast-forward checkout in this tool.

use anyhow::{Result, bail};
use clap::Parser;

use crate::client::workspace::Workspace;
use crate::refs::Head;

#[derive(Debug, Parser)]
pub struct Args {
    /// Create `arg` as a new branch at the current HEAD before switching.
    #[clap(short = 'b', long = "branch")]
    create: bool,

    arg: String,
}

pub fn run(ws: &Workspace, args: Args) -> Result<()> {
    let heads_dir = ws.anchor_dir.join("refs").join("heads");
    let branch_ref = heads_dir.join(&args.arg);

    if args.create {
        if branch_ref.exists() {
            bail!("branch {} already exists", args.arg);
        }
        let target = ws.head_snapshot()?.unwrap_or_default();
        crate::refs::write_ref(&branch_ref, &target)?;
        ws.set_head(&Head::Symbolic(format!("refs/heads/{}", args.arg)))?;
        return Ok(());
    }

    if branch_ref.exists() {
        ws.set_head(&Head::Symbolic(format!("refs/heads/{}", args.arg)))?;
    } else if ws.store.has_snapshot(&args.arg) {
        ws.set_head(&Head::Detached(args.arg))?;
    } else {
        bail!("{} is neither a known branch nor a snapshot id", args.arg);
    }
    Ok(())
}
