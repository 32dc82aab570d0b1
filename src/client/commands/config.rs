//! `anchor config [--list] [key [value]]`

use anyhow::{Result, bail};
use clap::Parser;

use crate::client::workspace::Workspace;

#[derive(Debug, Parser)]
pub struct Args {
    #[clap(long)]
    list: bool,

    key: Option<String>,
    value: Option<String>,
}

pub fn run(ws: &Workspace, args: Args) -> Result<()> {
    if args.list {
        for (key, value) in ws.load_config()? {
            println!("{key}={value}");
        }
        return Ok(());
    }

    let Some(key) = args.key else {
        bail!("usage: anchor config [--list] [key [value]]");
    };

    match args.value {
        Some(value) => ws.config_set(&key, &value),
        None => {
            if let Some(value) = ws.config_get(&key)? {
                println!("{value}");
            }
            Ok(())
        }
    }
}
