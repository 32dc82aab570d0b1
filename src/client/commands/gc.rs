//! `anchor gc` — a stub. Garbage collection of unreferenced objects is
//! unspecified; objects are write-once and tolerated if orphaned, so there
//! is nothing this command can safely reclaim today.

use anyhow::Result;
use clap::Parser;

use crate::client::workspace::Workspace;

#[derive(Debug, Parser)]
pub struct Args {}

pub fn run(_ws: &Workspace, _args: Args) -> Result<()> {
    println!("nothing to collect");
    Ok(())
}
