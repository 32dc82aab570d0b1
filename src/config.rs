//! Server-side configuration: `toml` + `serde`, loaded from
//! `~/.config/anchor-server.toml` with sane defaults when the file is
//! absent, same pattern the client config loader uses.

use std::{fs, io};

use anyhow::{Context, Result, anyhow};
use camino::Utf8PathBuf;
use serde::Deserialize;

fn default_bind() -> String {
    "127.0.0.1:8787".to_string()
}

fn default_svcs_root() -> Utf8PathBuf {
    Utf8PathBuf::from("/svcs-data")
}

fn default_secret() -> String {
    "supersecretkey".to_string()
}

fn default_admin_username() -> String {
    "admin".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Root directory holding one subdirectory per repository.
    #[serde(default = "default_svcs_root")]
    pub svcs_root: Utf8PathBuf,
    /// HMAC-SHA256 signing key for access and refresh tokens. The encrypted
    /// vault this would normally live behind is an out-of-scope collaborator;
    /// a plain config value is the seam stand-in.
    #[serde(default = "default_secret")]
    pub secret: String,
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
    /// Plaintext admin password, re-hashed into `users/<admin>/password.hash`
    /// at startup if set. The encrypted vault this would live behind in
    /// production is an out-of-scope collaborator; a plain config value is
    /// the seam stand-in for it here.
    #[serde(default)]
    pub admin_password: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            svcs_root: default_svcs_root(),
            secret: default_secret(),
            admin_username: default_admin_username(),
            admin_password: None,
        }
    }
}

pub fn load() -> Result<ServerConfig> {
    let mut path: Utf8PathBuf = home::home_dir()
        .ok_or_else(|| anyhow!("Can't find home directory"))?
        .try_into()
        .context("Home directory isn't UTF-8")?;
    path.extend([".config", "anchor-server.toml"]);

    let s = match fs::read_to_string(&path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ServerConfig::default()),
        found => found,
    }
    .with_context(|| format!("Couldn't open {path}"))?;

    toml::from_str(&s).with_context(|| format!("Couldn't parse {path}"))
}
