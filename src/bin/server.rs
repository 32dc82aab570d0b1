//! The Anchor server binary: loads configuration, builds shared state, and
//! serves the HTTP surface.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use anchor::config;
use anchor::server::{routes, state::AppState};

#[derive(Parser)]
#[command(name = "anchor-server", about = "Serve an Anchor repository store over HTTP")]
struct Args {
    /// Override the configured bind address (host:port).
    #[arg(long)]
    bind: Option<String>,

    /// Override the configured repository root.
    #[arg(long)]
    svcs_root: Option<camino::Utf8PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(level).unwrap())
        .init();

    let mut cfg = config::load().context("Couldn't load server configuration")?;
    if let Some(bind) = args.bind {
        cfg.bind = bind;
    }
    if let Some(root) = args.svcs_root {
        cfg.svcs_root = root;
    }

    let addr: SocketAddr = cfg.bind.parse().context("Couldn't parse bind address")?;
    let state = Arc::new(AppState::new(&cfg)?);
    let app = routes::build(state);

    tracing::info!(%addr, "anchor-server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
