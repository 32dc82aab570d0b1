//! `anchor list`, `anchor sys`, `anchor create`, `anchor favorite` — the
//! server-admin surface that doesn't need a local working tree.

use anyhow::Result;
use clap::Parser;

use crate::client::remote::RemoteClient;

fn default_server() -> String {
    "http://127.0.0.1:8787".to_string()
}

#[derive(Debug, Parser)]
pub struct ListArgs {
    #[clap(long, default_value_t = default_server())]
    server: String,
}

pub fn list(args: ListArgs) -> Result<()> {
    let client = RemoteClient::new(&args.server)?;
    for name in client.list_repos()? {
        println!("{name}");
    }
    Ok(())
}

#[derive(Debug, Parser)]
pub struct SysArgs {
    #[clap(long, default_value_t = default_server())]
    server: String,
}

pub fn sys(args: SysArgs) -> Result<()> {
    let client = RemoteClient::new(&args.server)?;
    println!("{}", client.sys()?);
    Ok(())
}

#[derive(Debug, Parser)]
pub struct CreateArgs {
    #[clap(long, default_value_t = default_server())]
    server: String,

    name: String,
}

pub fn create(args: CreateArgs) -> Result<()> {
    let client = RemoteClient::new(&args.server)?;
    client.create_repo(&args.name)?;
    println!("Created repository {}", args.name);
    Ok(())
}

#[derive(Debug, Parser)]
pub struct FavoriteArgs {
    #[clap(long, default_value_t = default_server())]
    server: String,

    name: String,

    #[clap(long, default_value_t = true)]
    on: bool,
}

pub fn favorite(args: FavoriteArgs) -> Result<()> {
    let client = RemoteClient::new(&args.server)?;
    let meta = client.favorite(&args.name, args.on)?;
    println!("{} favorite={:?}", meta.name, meta.is_favorite);
    Ok(())
}
