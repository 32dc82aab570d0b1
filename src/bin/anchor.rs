//! The `anchor` CLI: the client replica's command surface. Every subcommand
//! prints a one-line error to stderr and exits non-zero on failure; no
//! panic is allowed to reach the top level.

use anyhow::Result;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use anchor::client::commands::*;
use anchor::client::workspace::Workspace;

#[derive(Parser)]
#[command(name = "anchor", about = "A small, self-hosted version control client")]
struct Cli {
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Login(login::Args),
    SshLogin(login::SshArgs),
    List(repo_admin::ListArgs),
    Sys(repo_admin::SysArgs),
    Create(repo_admin::CreateArgs),
    Favorite(repo_admin::FavoriteArgs),

    Init(init::Args),
    Clone(clone::Args),

    Status(status::Args),
    Add(add::Args),
    Commit(commit::Args),
    Push(push::Args),
    Pull(pull::Args),
    Fetch(fetch::Args),
    Log(log::Args),
    Reset(reset::Args),
    Remote(remote::Args),
    Config(config::Args),
    Diff(diff::Args),
    Checkout(checkout::Args),
    Branch(branch::Args),
    Clean(clean::Args),
    Show(show::Args),
    Merge(merge::Args),
    Restore(restore::Args),
    Gc(gc::Args),
    Blame(blame::Args),
    Reflog(reflog::Args),
}

fn open_workspace() -> Result<Workspace> {
    let cwd = Utf8PathBuf::from_path_buf(std::env::current_dir()?)
        .map_err(|_| anyhow::anyhow!("current directory isn't valid UTF-8"))?;
    Workspace::open(&cwd)
}

fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Login(args) => login::run(args),
        Command::SshLogin(args) => login::run_ssh(args),
        Command::List(args) => repo_admin::list(args),
        Command::Sys(args) => repo_admin::sys(args),
        Command::Create(args) => repo_admin::create(args),
        Command::Favorite(args) => repo_admin::favorite(args),

        Command::Init(args) => init::run(args),
        Command::Clone(args) => clone::run(args),

        Command::Status(args) => status::run(&open_workspace()?, args),
        Command::Add(args) => add::run(&open_workspace()?, args),
        Command::Commit(args) => commit::run(&open_workspace()?, args),
        Command::Push(args) => push::run(&open_workspace()?, args),
        Command::Pull(args) => pull::run(&open_workspace()?, args),
        Command::Fetch(args) => fetch::run(&open_workspace()?, args),
        Command::Log(args) => log::run(&open_workspace()?, args),
        Command::Reset(args) => reset::run(&open_workspace()?, args),
        Command::Remote(args) => remote::run(&open_workspace()?, args),
        Command::Config(args) => config::run(&open_workspace()?, args),
        Command::Diff(args) => diff::run(&open_workspace()?, args),
        Command::Checkout(args) => checkout::run(&open_workspace()?, args),
        Command::Branch(args) => branch::run(&open_workspace()?, args),
        Command::Clean(args) => clean::run(&open_workspace()?, args),
        Command::Show(args) => show::run(&open_workspace()?, args),
        Command::Merge(args) => merge::run(&open_workspace()?, args),
        Command::Restore(args) => restore::run(&open_workspace()?, args),
        Command::Gc(args) => gc::run(&open_workspace()?, args),
        Command::Blame(args) => blame::run(&open_workspace()?, args),
        Command::Reflog(args) => reflog::run(&open_workspace()?, args),
    }
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(level).unwrap())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = dispatch(cli.command) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
