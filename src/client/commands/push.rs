//! `anchor push`

use anyhow::{Context, Result};
use clap::Parser;
use walkdir::WalkDir;

use crate::client::remote::RemoteClient;
use crate::client::workspace::Workspace;

const EXCLUDED_DIRS: &[&str] = &[".anchor", ".git"];

#[derive(Debug, Parser)]
pub struct Args {
    #[clap(default_value = "origin")]
    remote: String,

    #[clap(short = 'm', long, default_value = "push")]
    message: String,
}

fn should_skip(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| EXCLUDED_DIRS.contains(&name))
        .unwrap_or(false)
}

pub fn run(ws: &Workspace, args: Args) -> Result<()> {
    let url = ws
        .remote_url(&args.remote)?
        .with_context(|| format!("no URL configured for remote {}", args.remote))?;
    let repo = ws.remote_repo(&args.remote)?;
    let client = RemoteClient::new(url)?;

    let zip_file = tempfile::Builder::new().suffix(".zip").tempfile()?;
    {
        let mut writer = zip::ZipWriter::new(zip_file.reopen()?);
        let options = zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for entry in WalkDir::new(ws.root.as_std_path())
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !should_skip(e))
        {
            let entry = entry?;
            let rel = entry.path().strip_prefix(ws.root.as_std_path())?;
            if rel.as_os_str().is_empty() {
                continue;
            }
            let name = rel.to_string_lossy().replace('\\', "/");
            if entry.file_type().is_dir() {
                writer.add_directory(format!("{name}/"), options)?;
            } else {
                writer.start_file(name, options)?;
                std::io::Write::write_all(&mut writer, &std::fs::read(entry.path())?)?;
            }
        }
        writer.finish()?;
    }
    let zip_path = camino::Utf8Path::from_path(zip_file.path()).context("temp zip path isn't UTF-8")?;

    let snapshot_id = client.upload(&repo, zip_path, &args.message)?;
    crate::refs::write_ref(&ws.remote_ref_path(&args.remote), &snapshot_id)?;
    println!("{snapshot_id}");
    Ok(())
}
