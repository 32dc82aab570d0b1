//! The staging area: a flat `relative-path -> blob-id` map, persisted as
//! JSON at `.anchor/index`.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use camino::Utf8Path;

use crate::file_util::atomic_write;

pub type Index = BTreeMap<String, String>;

pub fn load(path: &Utf8Path) -> Result<Index> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Index::new()),
        Err(e) => Err(e).with_context(|| format!("Couldn't read {path}")),
    }
}

pub fn save(path: &Utf8Path, index: &Index) -> Result<()> {
    atomic_write(path, &serde_json::to_vec_pretty(index)?)
}
