//! Refresh tokens (C4): a rotating family with replay detection. Tokens are
//! opaque 32-byte URL-safe random strings; the persistent map is keyed by
//! `sha256(token)`, never the plaintext. Writes are serialized by an
//! in-process mutex around load/mutate/save, as the concurrency model
//! requires.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use camino::{Utf8Path, Utf8PathBuf};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRecord {
    pub username: String,
    pub fingerprint: String,
    pub created_at: i64,
    pub expires_at: i64,
    pub used: bool,
    pub rotated_to: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RefreshError {
    #[error("unknown refresh token")]
    NotFound,
    #[error("refresh token expired")]
    Expired,
    #[error("refresh token replayed")]
    Replay,
    #[error("device fingerprint mismatch")]
    FingerprintMismatch,
}

pub struct RefreshStore {
    path: Utf8PathBuf,
    records: Mutex<BTreeMap<String, RefreshRecord>>,
}

fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

impl RefreshStore {
    /// Loads the JSON file at `path`, pruning already-expired records.
    pub fn load(path: impl Into<Utf8PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut records: BTreeMap<String, RefreshRecord> = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("Couldn't parse {path}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e).with_context(|| format!("Couldn't read {path}")),
        };

        let now = chrono::Utc::now().timestamp();
        records.retain(|_, r| r.expires_at > now);

        let store = Self {
            path,
            records: Mutex::new(records),
        };
        store.persist()?;
        Ok(store)
    }

    fn persist(&self) -> Result<()> {
        let records = self.records.lock().unwrap();
        let bytes = serde_json::to_vec_pretty(&*records)?;
        crate::file_util::atomic_write(&self.path, &bytes)
    }

    pub fn issue(&self, username: &str, fingerprint: &str) -> Result<String> {
        let token = generate_token();
        let hash = hash_token(&token);
        let now = chrono::Utc::now().timestamp();

        let record = RefreshRecord {
            username: username.to_string(),
            fingerprint: fingerprint.to_string(),
            created_at: now,
            expires_at: now + REFRESH_TOKEN_TTL_DAYS * 86_400,
            used: false,
            rotated_to: None,
        };
        self.records.lock().unwrap().insert(hash, record);
        self.persist()?;
        Ok(token)
    }

    /// Follows `rotated_to` in both directions from `start` until fixpoint,
    /// then removes every record in the closure. This is a strictly wider
    /// closure than "just walk forward from the compromised token" — a
    /// record that once rotated *into* the compromised one is part of the
    /// same family and must go too.
    fn invalidate_family(records: &mut BTreeMap<String, RefreshRecord>, start: &str) {
        let mut family: HashSet<String> = HashSet::new();
        family.insert(start.to_string());

        loop {
            let mut grew = false;

            let backward: Vec<String> = records
                .iter()
                .filter(|(hash, record)| {
                    !family.contains(*hash)
                        && record
                            .rotated_to
                            .as_ref()
                            .is_some_and(|rt| family.contains(rt))
                })
                .map(|(hash, _)| hash.clone())
                .collect();
            for hash in backward {
                family.insert(hash);
                grew = true;
            }

            let forward: Vec<String> = family
                .iter()
                .filter_map(|hash| records.get(hash).and_then(|r| r.rotated_to.clone()))
                .filter(|rt| !family.contains(rt))
                .collect();
            for hash in forward {
                family.insert(hash);
                grew = true;
            }

            if !grew {
                break;
            }
        }

        for hash in family {
            records.remove(&hash);
        }
    }

    /// Looks up by hash, checks used/expired/fingerprint, and on success
    /// rotates to a fresh token. On replay or fingerprint mismatch, the
    /// entire token family is invalidated before returning the error.
    pub fn validate_and_rotate(
        &self,
        token: &str,
        fingerprint: &str,
    ) -> Result<(String, String), RefreshError> {
        let hash = hash_token(token);
        let mut records = self.records.lock().unwrap();

        let Some(record) = records.get(&hash).cloned() else {
            return Err(RefreshError::NotFound);
        };

        if record.used {
            Self::invalidate_family(&mut records, &hash);
            drop(records);
            let _ = self.persist();
            return Err(RefreshError::Replay);
        }

        let now = chrono::Utc::now().timestamp();
        if record.expires_at <= now {
            records.remove(&hash);
            drop(records);
            let _ = self.persist();
            return Err(RefreshError::Expired);
        }

        if !record.fingerprint.is_empty() && !fingerprint.is_empty() && record.fingerprint != fingerprint {
            Self::invalidate_family(&mut records, &hash);
            drop(records);
            let _ = self.persist();
            return Err(RefreshError::FingerprintMismatch);
        }

        let new_token = generate_token();
        let new_hash = hash_token(&new_token);

        let mut updated = record.clone();
        updated.used = true;
        updated.rotated_to = Some(new_hash.clone());
        records.insert(hash, updated);

        records.insert(
            new_hash,
            RefreshRecord {
                username: record.username.clone(),
                fingerprint: fingerprint.to_string(),
                created_at: now,
                expires_at: now + REFRESH_TOKEN_TTL_DAYS * 86_400,
                used: false,
                rotated_to: None,
            },
        );
        drop(records);
        self.persist().map_err(|_| RefreshError::NotFound)?;

        Ok((record.username, new_token))
    }

    /// Used for logout and for sensitive changes (password rotation): locate
    /// by hash and invalidate the family even though the token itself was
    /// never replayed.
    pub fn revoke(&self, token: &str) -> Result<()> {
        let hash = hash_token(token);
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&hash) {
            Self::invalidate_family(&mut records, &hash);
        }
        drop(records);
        self.persist()
    }

    pub fn revoke_all_for_user(&self, username: &str) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        records.retain(|_, r| r.username != username);
        drop(records);
        self.persist()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn new_store() -> (tempfile::TempDir, RefreshStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("refresh_tokens.json")).unwrap();
        let store = RefreshStore::load(path).unwrap();
        (dir, store)
    }

    #[test]
    fn validates_exactly_once() {
        let (_dir, store) = new_store();
        let token = store.issue("alice", "fpt-a").unwrap();

        let (username, rotated) = store.validate_and_rotate(&token, "fpt-a").unwrap();
        assert_eq!(username, "alice");
        assert_ne!(rotated, token);

        let err = store.validate_and_rotate(&token, "fpt-a").unwrap_err();
        assert_eq!(err, RefreshError::Replay);

        // Replay invalidates the whole family, so the rotated token is dead too.
        let err = store.validate_and_rotate(&rotated, "fpt-a").unwrap_err();
        assert_eq!(err, RefreshError::NotFound);
    }

    #[test]
    fn fingerprint_mismatch_invalidates_family() {
        let (_dir, store) = new_store();
        let token = store.issue("alice", "fpt-a").unwrap();
        let err = store.validate_and_rotate(&token, "fpt-b").unwrap_err();
        assert_eq!(err, RefreshError::FingerprintMismatch);

        let err = store.validate_and_rotate(&token, "fpt-a").unwrap_err();
        assert_eq!(err, RefreshError::NotFound);
    }

    #[test]
    fn revoke_all_for_user_drops_every_token() {
        let (_dir, store) = new_store();
        let a = store.issue("alice", "fpt-a").unwrap();
        let b = store.issue("alice", "fpt-b").unwrap();
        store.revoke_all_for_user("alice").unwrap();

        assert_eq!(store.validate_and_rotate(&a, "fpt-a").unwrap_err(), RefreshError::NotFound);
        assert_eq!(store.validate_and_rotate(&b, "fpt-b").unwrap_err(), RefreshError::NotFound);
    }
}
