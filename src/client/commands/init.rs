//! `anchor init`

use anyhow::Result;
use camino::Utf8PathBuf;
use clap::Parser;

use crate::client::workspace::Workspace;

#[derive(Debug, Parser)]
pub struct Args {
    /// Directory to initialize (defaults to the current directory).
    #[clap(default_value = ".")]
    path: Utf8PathBuf,
}

pub fn run(args: Args) -> Result<()> {
    std::fs::create_dir_all(&args.path)?;
    let root = args.path.canonicalize_utf8()?;
    Workspace::init(&root)?;
    println!("Initialized empty Anchor repository in {}", root.join(".anchor"));
    Ok(())
}
