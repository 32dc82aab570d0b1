//! `anchor diff [--staged]`

use anyhow::Result;
use clap::Parser;

use crate::client::diffrender::unified;
use crate::client::workspace::Workspace;
use crate::objects::Tree;

#[derive(Debug, Parser)]
pub struct Args {
    /// Diff the index against HEAD instead of the working tree against the
    /// index.
    #[clap(long)]
    staged: bool,
}

fn blob_or_empty(ws: &Workspace, id: &str) -> Vec<u8> {
    ws.store.get_blob(id).unwrap_or_default()
}

pub fn run(ws: &Workspace, args: Args) -> Result<()> {
    let index = ws.load_index()?;

    if args.staged {
        let head_tree = match ws.head_snapshot()? {
            Some(id) => ws.store.get_tree(&ws.store.get_snapshot(&id)?.root_tree)?,
            None => Tree::new(),
        };
        let mut paths: Vec<&String> = head_tree.entries.keys().chain(index.keys()).collect();
        paths.sort();
        paths.dedup();
        for path in paths {
            let old_id = head_tree.entries.get(path).map(|e| e.id.as_str()).unwrap_or("");
            let new_id = index.get(path).map(String::as_str).unwrap_or("");
            if old_id == new_id {
                continue;
            }
            let old = if old_id.is_empty() { Vec::new() } else { blob_or_empty(ws, old_id) };
            let new = if new_id.is_empty() { Vec::new() } else { blob_or_empty(ws, new_id) };
            print!("{}", unified(path, &old, &new));
        }
        return Ok(());
    }

    let st = crate::client::status::status(&ws.root, &index)?;
    for path in st.modified.iter().chain(st.deleted.iter()) {
        let old = index.get(path).map(|id| blob_or_empty(ws, id)).unwrap_or_default();
        let new = std::fs::read(ws.work_path(path)).unwrap_or_default();
        print!("{}", unified(path, &old, &new));
    }
    Ok(())
}
