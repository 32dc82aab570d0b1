//! `anchor status`

use anyhow::Result;
use clap::Parser;

use crate::client::status::status;
use crate::client::workspace::Workspace;

#[derive(Debug, Parser)]
pub struct Args {}

pub fn run(ws: &Workspace, _args: Args) -> Result<()> {
    let branch = ws.current_branch_name()?.unwrap_or_else(|| "HEAD (detached)".to_string());
    println!("On branch {branch}");

    let index = ws.load_index()?;
    let st = status(&ws.root, &index)?;

    if st.is_clean() {
        println!("nothing to commit, working tree clean");
        return Ok(());
    }
    if !st.modified.is_empty() {
        println!("Changes not staged for commit:");
        for path in &st.modified {
            println!("    modified: {path}");
        }
    }
    if !st.deleted.is_empty() {
        println!("Deleted:");
        for path in &st.deleted {
            println!("    deleted:  {path}");
        }
    }
    if !st.untracked.is_empty() {
        println!("Untracked files:");
        for path in &st.untracked {
            println!("    {path}");
        }
    }
    Ok(())
}
