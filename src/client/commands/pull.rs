//! `anchor pull`

use anyhow::{Context, Result};
use clap::Parser;

use crate::client::remote::RemoteClient;
use crate::client::workspace::Workspace;
use crate::engine::build_tree;

#[derive(Debug, Parser)]
pub struct Args {
    #[clap(default_value = "origin")]
    remote: String,
}

pub fn run(ws: &Workspace, args: Args) -> Result<()> {
    let url = ws
        .remote_url(&args.remote)?
        .with_context(|| format!("no URL configured for remote {}", args.remote))?;
    let repo = ws.remote_repo(&args.remote)?;
    let client = RemoteClient::new(url)?;

    let zip_path = ws.root.join(".anchor-pull.zip");
    client.archive(&repo, None, &zip_path)?;
    let file = std::fs::File::open(&zip_path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    archive.extract(ws.root.as_std_path())?;
    std::fs::remove_file(&zip_path)?;

    let working_tree = build_tree(&ws.store, &ws.root)?;
    let mut index = crate::client::index::Index::new();
    for (path, entry) in working_tree.entries {
        index.insert(path, entry.id);
    }
    ws.save_index(&index)?;

    println!("Pulled {repo} into {}", ws.root);
    Ok(())
}
