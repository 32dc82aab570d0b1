//! `anchor reflog`

use anyhow::Result;
use clap::Parser;

use crate::client::workspace::Workspace;

#[derive(Debug, Parser)]
pub struct Args {}

pub fn run(ws: &Workspace, _args: Args) -> Result<()> {
    for entry in crate::reflog::read_reversed(&ws.reflog_path())? {
        let short_old = &entry.old[..entry.old.len().min(12)];
        let short_new = &entry.new[..entry.new.len().min(12)];
        println!("{short_old}..{short_new} {}", entry.message);
    }
    Ok(())
}
