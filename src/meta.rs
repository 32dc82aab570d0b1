//! `meta.json`: repository metadata. The only other mutable file besides
//! refs and the lock.

use anyhow::{Context, Result};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::file_util::atomic_write;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoMeta {
    pub name: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

impl RepoMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: chrono::Utc::now().to_rfc3339(),
            is_public: None,
            is_favorite: Some(false),
        }
    }

    pub fn load(path: &Utf8Path) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("Couldn't read {path}"))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(self)?;
        atomic_write(path, &bytes)
    }
}
