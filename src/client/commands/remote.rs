//! `anchor remote [add <name> <url>|list] [-v]`

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::client::workspace::Workspace;

#[derive(Debug, Parser)]
pub struct Args {
    #[clap(subcommand)]
    action: Option<Action>,

    /// With `list` (or no subcommand), also print each remote's URL.
    #[clap(short = 'v', long)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Action {
    Add { name: String, url: String },
    List,
}

pub fn run(ws: &Workspace, args: Args) -> Result<()> {
    match args.action {
        Some(Action::Add { name, url }) => ws.config_set(&format!("remote.{name}.url"), &url),
        Some(Action::List) | None => list(ws, args.verbose),
    }
}

fn list(ws: &Workspace, verbose: bool) -> Result<()> {
    let config = ws.load_config()?;
    for (key, value) in &config {
        let Some(name) = key.strip_prefix("remote.").and_then(|k| k.strip_suffix(".url")) else {
            continue;
        };
        if verbose {
            println!("{name}\t{value}");
        } else {
            println!("{name}");
        }
    }
    Ok(())
}
