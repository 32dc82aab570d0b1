//! Per-remote session cache: the access token and refresh token a prior
//! `login` obtained, persisted across CLI invocations since each one is a
//! fresh process. Lives outside any working tree, alongside other
//! user-global state (`home::home_dir()`, the teacher's pattern in
//! `config.rs`).

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::file_util::atomic_write;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteCredentials {
    pub access_token: String,
    pub refresh_token: String,
}

pub type CredentialMap = BTreeMap<String, RemoteCredentials>;

fn path() -> Result<Utf8PathBuf> {
    let home = home::home_dir().context("Couldn't determine home directory")?;
    let dir = Utf8PathBuf::from_path_buf(home)
        .map_err(|_| anyhow::anyhow!("home directory isn't valid UTF-8"))?
        .join(".config")
        .join("anchor");
    Ok(dir.join("credentials.json"))
}

pub fn load() -> Result<CredentialMap> {
    let path = path()?;
    match std::fs::read(&path) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CredentialMap::new()),
        Err(e) => Err(e).with_context(|| format!("Couldn't read {path}")),
    }
}

pub fn save(map: &CredentialMap) -> Result<()> {
    let path = path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    atomic_write(&path, &serde_json::to_vec_pretty(map)?)
}

pub fn get(remote: &str) -> Result<Option<RemoteCredentials>> {
    Ok(load()?.get(remote).cloned())
}

pub fn set(remote: &str, creds: RemoteCredentials) -> Result<()> {
    let mut map = load()?;
    map.insert(remote.to_string(), creds);
    save(&map)
}

pub fn clear(remote: &str) -> Result<()> {
    let mut map = load()?;
    map.remove(remote);
    save(&map)
}
