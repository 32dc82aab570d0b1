//! Shared server state: the `SVCS_ROOT` path, the signing secret, the
//! refresh-token store, and the SSH challenge map. Handed to every handler
//! via axum's `State` extractor instead of living behind a global
//! singleton — tests inject a fresh temp directory per run.

use camino::Utf8PathBuf;

use crate::auth::refresh::RefreshStore;
use crate::auth::ssh::ChallengeMap;
use crate::config::ServerConfig;
use crate::users::UserStore;

pub struct AppState {
    pub svcs_root: Utf8PathBuf,
    pub secret: String,
    pub admin_username: String,
    pub users: UserStore,
    pub refresh_store: RefreshStore,
    pub challenges: ChallengeMap,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.svcs_root)?;
        let users = UserStore::new(config.svcs_root.clone());

        if let Some(password) = &config.admin_password {
            users.ensure_user_dir(&config.admin_username)?;
            let hash = crate::auth::password::hash(password)?;
            users.update_password(&config.admin_username, &hash)?;
        }

        let refresh_store =
            RefreshStore::load(config.svcs_root.join("refresh_tokens.json"))?;

        Ok(Self {
            svcs_root: config.svcs_root.clone(),
            secret: config.secret.clone(),
            admin_username: config.admin_username.clone(),
            users,
            refresh_store,
            challenges: ChallengeMap::new(),
        })
    }

    pub fn repo_root(&self, name: &str) -> Utf8PathBuf {
        self.svcs_root.join(name)
    }

    pub fn repo_exists(&self, name: &str) -> bool {
        self.repo_root(name).join("meta.json").is_file()
    }
}
