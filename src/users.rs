//! User-scoped data: `users/<name>/{profile.json, keys.json, auth_2fa.json,
//! password.hash}`. Pure file-on-disk persistence, same shape as the object
//! store's write-once files but these are mutable (a user can change their
//! password, add a key, enable 2FA).

use anyhow::{Context, Result, bail};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::file_util::atomic_write;

pub struct UserStore {
    root: Utf8PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshKey {
    pub id: String,
    pub title: String,
    pub key: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TwoFactor {
    pub enabled: bool,
    #[serde(default)]
    pub secret: Option<String>,
}

impl UserStore {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn user_dir(&self, username: &str) -> Utf8PathBuf {
        self.root.join("users").join(username)
    }

    pub fn user_exists(&self, username: &str) -> bool {
        self.user_dir(username).is_dir()
    }

    pub fn get_profile(&self, username: &str) -> Result<Profile> {
        let path = self.user_dir(username).join("profile.json");
        match std::fs::read(&path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Profile::default()),
            Err(e) => Err(e).with_context(|| format!("Couldn't read {path}")),
        }
    }

    pub fn update_profile(&self, username: &str, profile: &Profile) -> Result<()> {
        let path = self.user_dir(username).join("profile.json");
        atomic_write(&path, &serde_json::to_vec_pretty(profile)?)
    }

    pub fn get_keys(&self, username: &str) -> Result<Vec<SshKey>> {
        let path = self.user_dir(username).join("keys.json");
        match std::fs::read(&path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e).with_context(|| format!("Couldn't read {path}")),
        }
    }

    fn save_keys(&self, username: &str, keys: &[SshKey]) -> Result<()> {
        let path = self.user_dir(username).join("keys.json");
        atomic_write(&path, &serde_json::to_vec_pretty(keys)?)
    }

    pub fn add_key(&self, username: &str, title: &str, key: &str) -> Result<SshKey> {
        let mut keys = self.get_keys(username)?;
        let id = hex8(Sha256::digest(key.as_bytes()).as_slice());
        let entry = SshKey {
            id,
            title: title.to_string(),
            key: key.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        keys.push(entry.clone());
        self.save_keys(username, &keys)?;
        Ok(entry)
    }

    pub fn delete_key(&self, username: &str, key_id: &str) -> Result<()> {
        let mut keys = self.get_keys(username)?;
        let before = keys.len();
        keys.retain(|k| k.id != key_id);
        if keys.len() == before {
            bail!("no such key {key_id}");
        }
        self.save_keys(username, &keys)
    }

    pub fn get_2fa(&self, username: &str) -> Result<TwoFactor> {
        let path = self.user_dir(username).join("auth_2fa.json");
        match std::fs::read(&path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TwoFactor::default()),
            Err(e) => Err(e).with_context(|| format!("Couldn't read {path}")),
        }
    }

    pub fn update_2fa(&self, username: &str, state: &TwoFactor) -> Result<()> {
        let path = self.user_dir(username).join("auth_2fa.json");
        atomic_write(&path, &serde_json::to_vec_pretty(state)?)
    }

    pub fn get_password_hash(&self, username: &str) -> Result<Option<String>> {
        let path = self.user_dir(username).join("password.hash");
        match std::fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Couldn't read {path}")),
        }
    }

    pub fn update_password(&self, username: &str, hash: &str) -> Result<()> {
        let path = self.user_dir(username).join("password.hash");
        atomic_write(&path, hash.as_bytes())
    }

    /// Renames a user's on-disk directory. Fails if the target already
    /// exists (mirrors the original's `ValueError` on name collision).
    pub fn rename_user(&self, from: &str, to: &str) -> Result<()> {
        let from_dir = self.user_dir(from);
        let to_dir = self.user_dir(to);
        if to_dir.exists() {
            bail!("user {to} already exists");
        }
        std::fs::create_dir_all(self.root.join("users"))?;
        std::fs::rename(&from_dir, &to_dir)
            .with_context(|| format!("Couldn't rename {from_dir} to {to_dir}"))
    }

    pub fn ensure_user_dir(&self, username: &str) -> Result<Utf8PathBuf> {
        let dir = self.user_dir(username);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

fn hex8(digest: &[u8]) -> String {
    digest.iter().take(4).map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn add_and_delete_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::new(Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap());
        store.ensure_user_dir("alice").unwrap();

        let key = store.add_key("alice", "laptop", "ssh-ed25519 AAAA...").unwrap();
        assert_eq!(key.id.len(), 8);

        let keys = store.get_keys("alice").unwrap();
        assert_eq!(keys.len(), 1);

        store.delete_key("alice", &key.id).unwrap();
        assert!(store.get_keys("alice").unwrap().is_empty());
    }

    #[test]
    fn rename_fails_on_collision() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::new(Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap());
        store.ensure_user_dir("alice").unwrap();
        store.ensure_user_dir("bob").unwrap();
        assert!(store.rename_user("alice", "bob").is_err());
    }
}
