//! `anchor add <paths...>`

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use walkdir::WalkDir;

use crate::client::workspace::Workspace;

const EXCLUDED_DIRS: &[&str] = &[".anchor", ".git"];

#[derive(Debug, Parser)]
pub struct Args {
    /// Files or directories to stage.
    #[clap(required = true)]
    paths: Vec<Utf8PathBuf>,
}

fn should_skip(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| EXCLUDED_DIRS.contains(&name))
        .unwrap_or(false)
}

pub fn run(ws: &Workspace, args: Args) -> Result<()> {
    let mut index = ws.load_index()?;

    for path in &args.paths {
        let absolute = if path.is_absolute() {
            path.clone()
        } else {
            Utf8PathBuf::from_path_buf(std::env::current_dir()?)
                .map_err(|_| anyhow::anyhow!("current directory isn't valid UTF-8"))?
                .join(path)
        };

        if absolute.is_dir() {
            for entry in WalkDir::new(absolute.as_std_path())
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !should_skip(e))
            {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let file_path = Utf8Path::from_path(entry.path())
                    .with_context(|| format!("{} is not valid UTF-8", entry.path().display()))?;
                stage_file(ws, file_path, &mut index)?;
            }
        } else {
            stage_file(ws, &absolute, &mut index)?;
        }
    }

    ws.save_index(&index)
}

fn stage_file(ws: &Workspace, absolute: &Utf8Path, index: &mut crate::client::index::Index) -> Result<()> {
    let relative = ws.relative_path(absolute)?;
    let bytes = std::fs::read(absolute).with_context(|| format!("Couldn't read {absolute}"))?;
    let id = ws.store.put_blob(&bytes)?;
    index.insert(relative, id);
    Ok(())
}
