//! HTTP client for the Blueprint Studio API.
//!
//! Reads are `GET {endpoint}?action=...`, mutations are `POST {endpoint}`
//! with a JSON body carrying `action`. Every request sends a bearer token;
//! a `401` triggers one credential refresh and one retry.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::remote::types::{
    DirectoryListing, FileContent, FileName, ListedItem, MoveResponse, SearchMatch,
};

/// The logical operations the explorer needs from the backend.
///
/// Implemented by [`HttpBackend`] and by the in-memory backend used in tests.
pub trait Backend: Send + Sync + 'static {
    /// Direct children of one directory (not recursive).
    fn list_directory(
        &self,
        path: &str,
        show_hidden: bool,
    ) -> impl Future<Output = Result<DirectoryListing, ApiError>> + Send;

    /// Every file and folder in the workspace, flat.
    fn list_all(
        &self,
        show_hidden: bool,
        force: bool,
    ) -> impl Future<Output = Result<Vec<ListedItem>, ApiError>> + Send;

    /// Every file name in the workspace, for filename search.
    fn list_files(
        &self,
        show_hidden: bool,
    ) -> impl Future<Output = Result<Vec<FileName>, ApiError>> + Send;

    /// Search file contents.
    fn global_search(
        &self,
        query: &str,
        case_sensitive: bool,
        use_regex: bool,
    ) -> impl Future<Output = Result<Vec<SearchMatch>, ApiError>> + Send;

    /// Move or rename a single item to an explicit destination path.
    fn rename(
        &self,
        source: &str,
        destination: &str,
    ) -> impl Future<Output = Result<MoveResponse, ApiError>> + Send;

    /// Move several items into one destination folder.
    fn move_multi(
        &self,
        paths: &[String],
        destination: &str,
    ) -> impl Future<Output = Result<MoveResponse, ApiError>> + Send;

    /// Read a file for opening in a tab.
    fn read_file(&self, path: &str) -> impl Future<Output = Result<FileContent, ApiError>> + Send;
}

/// Where the bearer token comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// No token; requests go out unauthenticated.
    None,
    /// A fixed long-lived token.
    Static(String),
    /// A file holding the token, re-read on refresh.
    File(PathBuf),
}

/// Bearer credential with one-shot refresh.
#[derive(Debug)]
pub struct Credentials {
    source: TokenSource,
    current: Mutex<Option<String>>,
}

impl Credentials {
    pub fn new(source: TokenSource) -> Self {
        let initial = match &source {
            TokenSource::None => None,
            TokenSource::Static(token) => Some(token.clone()),
            TokenSource::File(path) => read_token_file(path),
        };
        Self {
            source,
            current: Mutex::new(initial),
        }
    }

    /// The token to attach right now.
    pub fn token(&self) -> Option<String> {
        self.current.lock().ok().and_then(|guard| guard.clone())
    }

    /// Re-acquire the token. Returns whether a (possibly new) token is available.
    pub fn refresh(&self) -> bool {
        let fresh = match &self.source {
            TokenSource::None => None,
            TokenSource::Static(token) => Some(token.clone()),
            TokenSource::File(path) => read_token_file(path),
        };
        let available = fresh.is_some();
        if let Ok(mut guard) = self.current.lock() {
            *guard = fresh;
        }
        available
    }
}

fn read_token_file(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(raw) => {
            let token = raw.trim().to_string();
            (!token.is_empty()).then_some(token)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read token file");
            None
        }
    }
}

/// [`Backend`] over HTTP.
pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: String,
    credentials: Credentials,
}

impl HttpBackend {
    /// Build a client for `base_url` + `endpoint` (e.g. `/api/blueprint_studio`).
    pub fn new(
        base_url: &str,
        endpoint: &str,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/{}",
                base_url.trim_end_matches('/'),
                endpoint.trim_start_matches('/')
            ),
            credentials,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get<T: DeserializeOwned>(&self, query: &[(&str, String)]) -> Result<T, ApiError> {
        self.call(Method::GET, Some(query), None).await
    }

    async fn post<T: DeserializeOwned>(&self, body: Value) -> Result<T, ApiError> {
        self.call(Method::POST, None, Some(&body)).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        query: Option<&[(&str, String)]>,
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        let mut response = self.send(method.clone(), query, body).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::info!("backend returned 401, refreshing credential");
            if !self.credentials.refresh() {
                return Err(ApiError::Unauthorized);
            }
            response = self.send(method, query, body).await?;
            if response.status() == StatusCode::UNAUTHORIZED {
                return Err(ApiError::Unauthorized);
            }
        }

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(status, &bytes),
            });
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send(
        &self,
        method: Method,
        query: Option<&[(&str, String)]>,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut request = self.client.request(method, &self.endpoint);
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = self.credentials.token() {
            request = request.bearer_auth(token);
        }
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::Transport(e)
            }
        })
    }
}

/// Prefer the backend's JSON `message`, fall back to `HTTP <status>`.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

fn flag(value: bool) -> String {
    value.to_string()
}

impl Backend for HttpBackend {
    async fn list_directory(
        &self,
        path: &str,
        show_hidden: bool,
    ) -> Result<DirectoryListing, ApiError> {
        self.get(&[
            ("action", "list_directory".to_string()),
            ("path", path.to_string()),
            ("show_hidden", flag(show_hidden)),
        ])
        .await
    }

    async fn list_all(&self, show_hidden: bool, force: bool) -> Result<Vec<ListedItem>, ApiError> {
        self.get(&[
            ("action", "list_all".to_string()),
            ("show_hidden", flag(show_hidden)),
            ("force", flag(force)),
        ])
        .await
    }

    async fn list_files(&self, show_hidden: bool) -> Result<Vec<FileName>, ApiError> {
        self.get(&[
            ("action", "list_files".to_string()),
            ("show_hidden", flag(show_hidden)),
        ])
        .await
    }

    async fn global_search(
        &self,
        query: &str,
        case_sensitive: bool,
        use_regex: bool,
    ) -> Result<Vec<SearchMatch>, ApiError> {
        self.post(json!({
            "action": "global_search",
            "query": query,
            "case_sensitive": case_sensitive,
            "use_regex": use_regex,
        }))
        .await
    }

    async fn rename(&self, source: &str, destination: &str) -> Result<MoveResponse, ApiError> {
        self.post(json!({
            "action": "rename",
            "source": source,
            "destination": destination,
        }))
        .await
    }

    async fn move_multi(
        &self,
        paths: &[String],
        destination: &str,
    ) -> Result<MoveResponse, ApiError> {
        self.post(json!({
            "action": "move_multi",
            "paths": paths,
            "destination": destination,
        }))
        .await
    }

    async fn read_file(&self, path: &str) -> Result<FileContent, ApiError> {
        self.get(&[("action", "read_file".to_string()), ("path", path.to_string())])
            .await
    }
}
