#[cfg(test)]
pub(crate) mod memory;
mod query;

pub(crate) use query::{Filter, Table, TableQuery};

use crate::models::{AuthUser, Session};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    Network,
    Http,
    Parse,
}

#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    pub(crate) fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn unauthorized(message: Option<String>) -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            message: message.unwrap_or_else(|| "Unauthorized".to_string()),
        }
    }

    pub(crate) fn http(status: u16, body: &str, ctx: &str) -> Self {
        let detail = service_message(body).unwrap_or_else(|| body.trim().to_string());
        Self {
            kind: ApiErrorKind::Http,
            message: if detail.is_empty() {
                format!("{ctx} ({status})")
            } else {
                format!("{ctx} ({status}): {detail}")
            },
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// Pull the human-readable message out of a service error body.
///
/// The REST, auth and storage layers each use a different key.
fn service_message(body: &str) -> Option<String> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|k| v.get(*k).and_then(|m| m.as_str()))
        .map(|s| s.to_string())
}

pub(crate) const PROFILE_PHOTO_BUCKET: &str = "profile-photos";

const DEFAULT_URL: &str = "http://localhost:54321";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct EnvConfig {
    pub url: String,
    pub key: String,
    pub default_profile_photo: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        Self::resolve(read_window_env)
    }

    /// Build from a key lookup.
    ///
    /// Upper-case keys are preferred, lower-case keys are accepted as a fallback.
    pub(crate) fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |upper: &str, lower: &str| {
            lookup(upper)
                .or_else(|| lookup(lower))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let url = get("SUPABASE_URL", "url")
            .unwrap_or_else(|| DEFAULT_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let key = get("SUPABASE_ANON_KEY", "key").unwrap_or_default();
        let default_profile_photo = get("DEFAULT_PROFILE_PHOTO", "default_profile_photo")
            .unwrap_or_else(|| public_url(&url, PROFILE_PHOTO_BUCKET, "default_profile.webp"));

        Self {
            url,
            key,
            default_profile_photo,
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn read_window_env(key: &str) -> Option<String> {
    let window = web_sys::window()?;
    let env = window.get("ENV")?;
    if env.is_undefined() || !env.is_object() {
        return None;
    }
    js_sys::Reflect::get(&env, &key.into())
        .ok()
        .and_then(|v| v.as_string())
}

pub(crate) fn public_url(base_url: &str, bucket: &str, path: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{}/{}",
        base_url.trim_end_matches('/'),
        bucket,
        path.trim_start_matches('/')
    )
}

#[derive(Serialize, Clone, Debug)]
struct PasswordCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize, Clone, Debug)]
struct PasswordUpdate<'a> {
    password: &'a str,
}

/// Everything the fetchers and form actions need from the hosted service.
///
/// `BackendClient` is the real implementation; tests substitute an in-memory one.
#[allow(async_fn_in_trait)]
pub(crate) trait Backend {
    fn session(&self) -> Option<&Session>;
    fn set_session(&mut self, session: Option<Session>);

    async fn select_rows(&self, query: &TableQuery) -> ApiResult<Vec<serde_json::Value>>;
    async fn insert_rows(&self, table: Table, rows: serde_json::Value) -> ApiResult<()>;
    async fn update_rows(
        &self,
        table: Table,
        filter: &Filter,
        patch: serde_json::Value,
    ) -> ApiResult<()>;

    async fn sign_in(&self, email: &str, password: &str) -> ApiResult<Session>;
    async fn sign_up(&self, email: &str, password: &str) -> ApiResult<()>;
    async fn sign_out(&self) -> ApiResult<()>;
    async fn current_user(&self) -> ApiResult<Option<AuthUser>>;
    async fn update_password(&self, new_password: &str) -> ApiResult<()>;

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> ApiResult<()>;
    fn public_url(&self, bucket: &str, path: &str) -> String;

    async fn select<T: DeserializeOwned>(&self, query: &TableQuery) -> ApiResult<Vec<T>> {
        self.select_rows(query)
            .await?
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(ApiError::parse))
            .collect()
    }

    async fn insert<T: Serialize>(&self, table: Table, rows: &[T]) -> ApiResult<()> {
        let rows = serde_json::to_value(rows).map_err(ApiError::parse)?;
        self.insert_rows(table, rows).await
    }

    async fn update<T: Serialize>(&self, table: Table, filter: &Filter, patch: &T) -> ApiResult<()> {
        let patch = serde_json::to_value(patch).map_err(ApiError::parse)?;
        self.update_rows(table, filter, patch).await
    }
}

/// Handle to the hosted data/auth/storage service.
///
/// Plain data: a `reqwest::Client` is built per request so the handle can live in a signal.
#[derive(Clone, Debug)]
pub(crate) struct BackendClient {
    pub(crate) base_url: String,
    pub(crate) api_key: String,
    pub(crate) session: Option<Session>,
}

impl BackendClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            session: None,
        }
    }

    pub fn from_config(config: &EnvConfig) -> Self {
        Self::new(config.url.clone(), config.key.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Session token when signed in, otherwise the anonymous key.
    fn bearer(&self) -> String {
        let token = self
            .session
            .as_ref()
            .map(|s| s.access_token.as_str())
            .unwrap_or(self.api_key.as_str());
        format!("Bearer {token}")
    }

    fn with_auth_headers(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key)
            .header("Authorization", self.bearer())
    }

    fn rest_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.as_ref())
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    async fn send(&self, req: reqwest::RequestBuilder, ctx: &str) -> ApiResult<reqwest::Response> {
        let res = self
            .with_auth_headers(req)
            .send()
            .await
            .map_err(ApiError::network)?;

        if res.status().is_success() {
            return Ok(res);
        }

        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        if status == 401 {
            Err(ApiError::unauthorized(service_message(&body)))
        } else {
            Err(ApiError::http(status, &body, ctx))
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
        ctx: &str,
    ) -> ApiResult<T> {
        self.send(req, ctx).await?.json().await.map_err(ApiError::parse)
    }
}

impl Backend for BackendClient {
    fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn set_session(&mut self, session: Option<Session>) {
        self.session = session;
    }

    async fn select_rows(&self, query: &TableQuery) -> ApiResult<Vec<serde_json::Value>> {
        let req = reqwest::Client::new()
            .get(self.rest_url(query.table))
            .query(&query.to_params());
        self.send_json(req, "Query failed").await
    }

    async fn insert_rows(&self, table: Table, rows: serde_json::Value) -> ApiResult<()> {
        let req = reqwest::Client::new()
            .post(self.rest_url(table))
            .header("Prefer", "return=minimal")
            .json(&rows);
        self.send(req, "Insert failed").await.map(|_| ())
    }

    async fn update_rows(
        &self,
        table: Table,
        filter: &Filter,
        patch: serde_json::Value,
    ) -> ApiResult<()> {
        let params: Vec<(String, String)> = TableQuery::new(table)
            .filter(filter.clone())
            .to_params()
            .into_iter()
            .filter(|(k, _)| k != "select")
            .collect();
        let req = reqwest::Client::new()
            .patch(self.rest_url(table))
            .query(&params)
            .header("Prefer", "return=minimal")
            .json(&patch);
        self.send(req, "Update failed").await.map(|_| ())
    }

    async fn sign_in(&self, email: &str, password: &str) -> ApiResult<Session> {
        let req = reqwest::Client::new()
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .json(&PasswordCredentials { email, password });
        self.send_json(req, "Sign in failed").await
    }

    async fn sign_up(&self, email: &str, password: &str) -> ApiResult<()> {
        let req = reqwest::Client::new()
            .post(self.auth_url("signup"))
            .json(&PasswordCredentials { email, password });
        self.send(req, "Sign up failed").await.map(|_| ())
    }

    async fn sign_out(&self) -> ApiResult<()> {
        if self.session.is_none() {
            return Ok(());
        }
        let req = reqwest::Client::new().post(self.auth_url("logout"));
        self.send(req, "Sign out failed").await.map(|_| ())
    }

    async fn current_user(&self) -> ApiResult<Option<AuthUser>> {
        if self.session.is_none() {
            return Ok(None);
        }
        let req = reqwest::Client::new().get(self.auth_url("user"));
        match self.send_json::<AuthUser>(req, "Get user failed").await {
            Ok(user) => Ok(Some(user)),
            Err(e) if e.kind == ApiErrorKind::Unauthorized => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn update_password(&self, new_password: &str) -> ApiResult<()> {
        if self.session.is_none() {
            return Err(ApiError::unauthorized(None));
        }
        let req = reqwest::Client::new()
            .put(self.auth_url("user"))
            .json(&PasswordUpdate {
                password: new_password,
            });
        self.send(req, "Password update failed").await.map(|_| ())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> ApiResult<()> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            bucket,
            path.trim_start_matches('/')
        );
        let req = reqwest::Client::new()
            .post(url)
            .header("Content-Type", content_type)
            .header("x-upsert", if upsert { "true" } else { "false" })
            .body(bytes);
        self.send(req, "Upload failed").await.map(|_| ())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        public_url(&self.base_url, bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn session(token: &str) -> Session {
        Session {
            access_token: token.to_string(),
            refresh_token: None,
            token_type: Some("bearer".to_string()),
            expires_in: None,
            expires_at: None,
            user: AuthUser {
                id: "u-1".to_string(),
                email: Some("u@example.com".to_string()),
            },
        }
    }

    #[test]
    fn test_backend_client_new_trims_trailing_slash() {
        let client = BackendClient::new("https://x.supabase.co/".to_string(), "anon".to_string());
        assert_eq!(client.base_url, "https://x.supabase.co");
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_bearer_uses_anon_key_without_session() {
        let client = BackendClient::new("https://x".to_string(), "anon".to_string());
        assert_eq!(client.bearer(), "Bearer anon");
    }

    #[test]
    fn test_bearer_uses_session_token() {
        let mut client = BackendClient::new("https://x".to_string(), "anon".to_string());
        client.set_session(Some(session("jwt")));
        assert!(client.is_authenticated());
        assert_eq!(client.bearer(), "Bearer jwt");
    }

    #[test]
    fn test_endpoint_urls() {
        let client = BackendClient::new("https://x".to_string(), "anon".to_string());
        assert_eq!(client.rest_url(Table::Articles), "https://x/rest/v1/articles");
        assert_eq!(client.auth_url("token"), "https://x/auth/v1/token");
        assert_eq!(
            client.public_url(PROFILE_PHOTO_BUCKET, "profile_photos/profile_ann.png"),
            "https://x/storage/v1/object/public/profile-photos/profile_photos/profile_ann.png"
        );
    }

    #[test]
    fn test_env_config_prefers_upper_case_keys() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SUPABASE_URL", "https://a.supabase.co/"),
            ("url", "https://ignored"),
            ("key", "anon-lower"),
        ]);
        let cfg = EnvConfig::resolve(|k| env.get(k).map(|s| s.to_string()));
        assert_eq!(cfg.url, "https://a.supabase.co");
        assert_eq!(cfg.key, "anon-lower");
        assert_eq!(
            cfg.default_profile_photo,
            "https://a.supabase.co/storage/v1/object/public/profile-photos/default_profile.webp"
        );
    }

    #[test]
    fn test_env_config_defaults_when_missing() {
        let cfg = EnvConfig::resolve(|_| None);
        assert_eq!(cfg.url, DEFAULT_URL);
        assert_eq!(cfg.key, "");
    }

    #[test]
    fn test_env_config_explicit_photo() {
        let cfg = EnvConfig::resolve(|k| {
            (k == "DEFAULT_PROFILE_PHOTO").then(|| "https://cdn/p.webp".to_string())
        });
        assert_eq!(cfg.default_profile_photo, "https://cdn/p.webp");
    }

    #[test]
    fn test_http_error_uses_service_message() {
        let e = ApiError::http(400, r#"{"error_description":"Invalid login credentials"}"#, "Sign in failed");
        assert_eq!(e.kind, ApiErrorKind::Http);
        assert_eq!(e.to_string(), "Sign in failed (400): Invalid login credentials");

        let e = ApiError::http(500, "", "Query failed");
        assert_eq!(e.to_string(), "Query failed (500)");
    }
}
