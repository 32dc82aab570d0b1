//! `anchor log [--oneline]`

use anyhow::Result;
use clap::Parser;

use crate::client::workspace::Workspace;
use crate::engine::get_history;

#[derive(Debug, Parser)]
pub struct Args {
    #[clap(long)]
    oneline: bool,
}

pub fn run(ws: &Workspace, args: Args) -> Result<()> {
    let Some(head) = ws.head_snapshot()? else {
        println!("no commits yet");
        return Ok(());
    };

    for snapshot in get_history(&ws.store, &head)? {
        if args.oneline {
            let first_line = snapshot.message.lines().next().unwrap_or("");
            println!("{} {}", &snapshot.snapshot_id, first_line);
        } else {
            println!("snapshot {}", snapshot.snapshot_id);
            println!("Date:   {}", snapshot.timestamp);
            println!();
            for line in snapshot.message.lines() {
                println!("    {line}");
            }
            println!();
        }
    }
    Ok(())
}
