//! HTTP calls from the CLI to an Anchor server: login/session plumbing plus
//! the repo read/write surface `push`/`pull`/`fetch`/`list`/`sys`/`create`/
//! `favorite` drive.

use anyhow::{Context, Result, anyhow, bail};
use camino::Utf8Path;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::meta::RepoMeta;
use crate::objects::{Snapshot, Tree, TreeDiff};

use super::credentials::{self, RemoteCredentials};

/// Outcome of `/auth/login`: either a session, or a marker that 2FA must
/// follow via `RemoteClient::login_2fa`.
pub enum LoginOutcome {
    LoggedIn,
    TwoFactorRequired { username: String },
}

pub struct RemoteClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

fn extract_set_cookie_value(response: &reqwest::blocking::Response, name: &str) -> Option<String> {
    for header in response.headers().get_all(reqwest::header::SET_COOKIE) {
        let raw = header.to_str().ok()?;
        let first = raw.split(';').next()?;
        if let Some(value) = first.trim().strip_prefix(&format!("{name}=")) {
            return Some(value.to_string());
        }
    }
    None
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::blocking::Client::builder()
            .build()
            .context("Couldn't build HTTP client")?;
        Ok(Self { base_url, http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn creds(&self) -> Result<RemoteCredentials> {
        credentials::get(&self.base_url)?
            .ok_or_else(|| anyhow!("not logged in to {}; run `anchor login` first", self.base_url))
    }

    fn store_session(&self, access_token: String, refresh_token: Option<String>) -> Result<()> {
        let refresh_token = match refresh_token {
            Some(t) => t,
            None => credentials::get(&self.base_url)?
                .map(|c| c.refresh_token)
                .unwrap_or_default(),
        };
        credentials::set(
            &self.base_url,
            RemoteCredentials {
                access_token,
                refresh_token,
            },
        )
    }

    pub fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .context("login request failed")?;
        if !response.status().is_success() {
            bail!("login failed: {}", response.status());
        }
        let refresh = extract_set_cookie_value(&response, "refresh_token");
        let body: Value = response.json().context("malformed login response")?;
        if body.get("status").and_then(Value::as_str) == Some("2fa_required") {
            let username = body
                .get("username")
                .and_then(Value::as_str)
                .unwrap_or(username)
                .to_string();
            return Ok(LoginOutcome::TwoFactorRequired { username });
        }
        let access_token = body
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("login response missing access_token"))?
            .to_string();
        self.store_session(access_token, refresh)?;
        Ok(LoginOutcome::LoggedIn)
    }

    pub fn login_2fa(&self, username: &str, password: &str, code: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url("/auth/login/2fa"))
            .json(&json!({ "username": username, "password": password, "code": code }))
            .send()
            .context("2fa login request failed")?;
        if !response.status().is_success() {
            bail!("2fa login failed: {}", response.status());
        }
        let refresh = extract_set_cookie_value(&response, "refresh_token");
        #[derive(Deserialize)]
        struct Resp {
            access_token: String,
        }
        let body: Resp = response.json().context("malformed 2fa login response")?;
        self.store_session(body.access_token, refresh)
    }

    pub fn ssh_challenge(&self, username: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct Resp {
            nonce: String,
        }
        let resp: Resp = self
            .http
            .get(self.url("/auth/ssh-challenge"))
            .query(&[("username", username)])
            .send()
            .context("ssh-challenge request failed")?
            .error_for_status()
            .context("ssh-challenge rejected")?
            .json()
            .context("malformed ssh-challenge response")?;
        Ok(resp.nonce)
    }

    pub fn ssh_login(&self, username: &str, signature: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url("/auth/ssh-login"))
            .json(&json!({ "username": username, "signature": signature }))
            .send()
            .context("ssh-login request failed")?;
        if !response.status().is_success() {
            bail!("ssh-login failed: {}", response.status());
        }
        let refresh = extract_set_cookie_value(&response, "refresh_token");
        #[derive(Deserialize)]
        struct Resp {
            access_token: String,
        }
        let body: Resp = response.json().context("malformed ssh-login response")?;
        self.store_session(body.access_token, refresh)
    }

    pub fn logout(&self) -> Result<()> {
        let creds = self.creds()?;
        let _ = self
            .http
            .post(self.url("/auth/logout"))
            .bearer_auth(&creds.access_token)
            .header(reqwest::header::COOKIE, format!("refresh_token={}", creds.refresh_token))
            .send();
        credentials::clear(&self.base_url)
    }

    fn refresh_session(&self) -> Result<RemoteCredentials> {
        let creds = self.creds()?;
        let response = self
            .http
            .post(self.url("/auth/refresh"))
            .header(reqwest::header::COOKIE, format!("refresh_token={}", creds.refresh_token))
            .send()
            .context("refresh request failed")?;
        if !response.status().is_success() {
            bail!("session expired; run `anchor login` again");
        }
        let new_refresh = extract_set_cookie_value(&response, "refresh_token").unwrap_or(creds.refresh_token);
        #[derive(Deserialize)]
        struct Resp {
            access_token: String,
        }
        let body: Resp = response.json().context("malformed refresh response")?;
        let creds = RemoteCredentials {
            access_token: body.access_token,
            refresh_token: new_refresh,
        };
        credentials::set(&self.base_url, creds.clone())?;
        Ok(creds)
    }

    /// Runs `build` (which attaches a bearer token) once; on 401, refreshes
    /// the session and retries exactly once.
    fn authorized<F>(&self, build: F) -> Result<reqwest::blocking::Response>
    where
        F: Fn(&str) -> reqwest::blocking::RequestBuilder,
    {
        let creds = self.creds()?;
        let response = build(&creds.access_token).send().context("request failed")?;
        if response.status() != reqwest::StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        let refreshed = self.refresh_session()?;
        build(&refreshed.access_token).send().context("retried request failed")
    }

    pub fn list_repos(&self) -> Result<Vec<String>> {
        let response = self.authorized(|token| self.http.get(self.url("/repos/")).bearer_auth(token))?;
        response.error_for_status_ref().context("list failed")?;
        Ok(response.json()?)
    }

    pub fn sys(&self) -> Result<Value> {
        Ok(self.http.get(self.url("/sys")).send()?.json()?)
    }

    pub fn create_repo(&self, name: &str) -> Result<()> {
        let response = self.authorized(|token| {
            self.http
                .post(self.url("/repos/"))
                .bearer_auth(token)
                .json(&json!({ "name": name }))
        })?;
        if !response.status().is_success() {
            bail!("create repo failed: {}", response.status());
        }
        Ok(())
    }

    pub fn favorite(&self, name: &str, is_favorite: bool) -> Result<RepoMeta> {
        let response = self.authorized(|token| {
            self.http
                .patch(self.url(&format!("/repos/{name}/favorite")))
                .bearer_auth(token)
                .query(&[("is_favorite", is_favorite.to_string())])
        })?;
        response.error_for_status_ref().context("favorite failed")?;
        Ok(response.json()?)
    }

    pub fn history(&self, name: &str) -> Result<Vec<Snapshot>> {
        let response = self.authorized(|token| {
            self.http
                .get(self.url(&format!("/repos/{name}/history")))
                .bearer_auth(token)
        })?;
        response.error_for_status_ref().context("history failed")?;
        Ok(response.json()?)
    }

    pub fn diff(&self, name: &str, from: &str, to: &str) -> Result<TreeDiff> {
        let response = self.authorized(|token| {
            self.http
                .get(self.url(&format!("/repos/{name}/diff")))
                .bearer_auth(token)
                .query(&[("from", from), ("to", to)])
        })?;
        response.error_for_status_ref().context("diff failed")?;
        Ok(response.json()?)
    }

    pub fn tree(&self, name: &str, snapshot_id: &str) -> Result<Tree> {
        let response = self.authorized(|token| {
            self.http
                .get(self.url(&format!("/repos/{name}/tree/{snapshot_id}")))
                .bearer_auth(token)
        })?;
        response.error_for_status_ref().context("tree fetch failed")?;
        Ok(response.json()?)
    }

    pub fn file(&self, name: &str, snapshot_id: &str, path: &str) -> Result<Vec<u8>> {
        let response = self.authorized(|token| {
            self.http
                .get(self.url(&format!("/repos/{name}/file/{snapshot_id}/{path}")))
                .bearer_auth(token)
        })?;
        response.error_for_status_ref().context("file fetch failed")?;
        Ok(response.bytes()?.to_vec())
    }

    /// Downloads a repository archive to `dest`. `reference` defaults to the
    /// remote's main ref when `None`.
    pub fn archive(&self, name: &str, reference: Option<&str>, dest: &Utf8Path) -> Result<()> {
        let response = self.authorized(|token| {
            let mut req = self
                .http
                .get(self.url(&format!("/repos/{name}/archive")))
                .bearer_auth(token);
            if let Some(r) = reference {
                req = req.query(&[("ref", r)]);
            }
            req
        })?;
        response.error_for_status_ref().context("archive download failed")?;
        let bytes = response.bytes()?;
        std::fs::write(dest, bytes).with_context(|| format!("Couldn't write {dest}"))
    }

    /// Uploads `zip_path` as a new snapshot with `message`, returning the
    /// new snapshot id.
    pub fn upload(&self, name: &str, zip_path: &Utf8Path, message: &str) -> Result<String> {
        let response = self.authorized(|token| {
            let bytes = std::fs::read(zip_path).unwrap_or_default();
            let part = reqwest::blocking::multipart::Part::bytes(bytes).file_name("snapshot.zip");
            let form = reqwest::blocking::multipart::Form::new()
                .text("message", message.to_string())
                .part("file", part);
            self.http
                .post(self.url(&format!("/repos/{name}/upload")))
                .bearer_auth(token)
                .multipart(form)
        })?;
        response.error_for_status_ref().context("upload failed")?;
        let body: Value = response.json()?;
        body.get("snapshot_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("upload response missing snapshot_id"))
    }
}
