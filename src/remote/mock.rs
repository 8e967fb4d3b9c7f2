//! In-memory [`Backend`] for tests: canned responses, optional latency,
//! injectable failures and a call log.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::ApiError;
use crate::remote::api::Backend;
use crate::remote::types::{
    DirectoryListing, FileContent, FileEntry, FileName, FolderEntry, ItemKind, ListedItem,
    MoveResponse, SearchMatch,
};

#[derive(Default)]
struct MockState {
    directories: HashMap<String, DirectoryListing>,
    files: Vec<FileName>,
    all_items: Vec<ListedItem>,
    search_hits: HashMap<String, Vec<String>>,
    contents: HashMap<String, String>,
    latency: HashMap<String, Duration>,
    failing: HashSet<String>,
    move_response: Option<MoveResponse>,
    calls: Vec<String>,
}

#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
}

pub fn folder(path: &str) -> FolderEntry {
    FolderEntry {
        path: path.to_string(),
        name: path.rsplit('/').next().unwrap_or(path).to_string(),
        child_count: 0,
        is_symlink: false,
        symlink_target: None,
    }
}

pub fn file(path: &str, size: u64) -> FileEntry {
    FileEntry {
        path: path.to_string(),
        name: path.rsplit('/').next().unwrap_or(path).to_string(),
        size,
        is_symlink: false,
        symlink_target: None,
        mtime: None,
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root has `docs/` and `src/`; `src/` holds `main.yaml`.
    pub fn workspace() -> Self {
        let backend = Self::new();
        backend.set_dir("", vec![folder("docs"), folder("src")], vec![]);
        backend.set_dir("docs", vec![], vec![file("docs/readme.md", 120)]);
        backend.set_dir("src", vec![], vec![file("src/main.yaml", 2048)]);
        backend.set_files(vec![
            ("main.yaml", "src/main.yaml"),
            ("other.txt", "x/other.txt"),
        ]);
        backend
    }

    fn with<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut guard = self.state.lock().unwrap();
        f(&mut guard)
    }

    pub fn set_dir(&self, path: &str, folders: Vec<FolderEntry>, files: Vec<FileEntry>) {
        self.with(|s| {
            s.directories.insert(
                path.to_string(),
                DirectoryListing {
                    folders,
                    files,
                    error: None,
                },
            )
        });
    }

    pub fn set_files(&self, files: Vec<(&str, &str)>) {
        self.with(|s| {
            s.files = files
                .into_iter()
                .map(|(name, path)| FileName {
                    name: name.to_string(),
                    path: path.to_string(),
                })
                .collect()
        });
    }

    pub fn set_all_items(&self, items: Vec<(&str, ItemKind, u64)>) {
        self.with(|s| {
            s.all_items = items
                .into_iter()
                .map(|(path, kind, size)| ListedItem {
                    path: path.to_string(),
                    kind,
                    size: Some(size),
                })
                .collect()
        });
    }

    pub fn set_search_hits(&self, query: &str, paths: Vec<&str>) {
        self.with(|s| {
            s.search_hits.insert(
                query.to_string(),
                paths.into_iter().map(str::to_string).collect(),
            )
        });
    }

    pub fn set_content(&self, path: &str, content: &str) {
        self.with(|s| s.contents.insert(path.to_string(), content.to_string()));
    }

    /// Delay responses for a directory path, search query or `list_files`.
    pub fn set_latency(&self, key: &str, latency: Duration) {
        self.with(|s| s.latency.insert(key.to_string(), latency));
    }

    /// Make requests for `key` (directory path, query or action) fail.
    pub fn fail(&self, key: &str) {
        self.with(|s| s.failing.insert(key.to_string()));
    }

    pub fn recover(&self, key: &str) {
        self.with(|s| s.failing.remove(key));
    }

    pub fn set_move_response(&self, success: bool, message: Option<&str>) {
        self.with(|s| {
            s.move_response = Some(MoveResponse {
                success,
                message: message.map(str::to_string),
            })
        });
    }

    pub fn calls(&self) -> Vec<String> {
        self.with(|s| s.calls.clone())
    }

    pub fn count(&self, call: &str) -> usize {
        self.with(|s| s.calls.iter().filter(|c| c.as_str() == call).count())
    }

    fn record(&self, call: String, key: &str) -> (Duration, bool) {
        self.with(|s| {
            s.calls.push(call);
            (
                s.latency.get(key).copied().unwrap_or_default(),
                s.failing.contains(key),
            )
        })
    }

    async fn respond<T>(
        &self,
        latency: Duration,
        failing: bool,
        value: impl FnOnce(&MockState) -> T,
    ) -> Result<T, ApiError> {
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if failing {
            return Err(ApiError::Status {
                status: 500,
                message: "HTTP 500".to_string(),
            });
        }
        Ok(self.with(|s| value(s)))
    }
}

impl Backend for MockBackend {
    async fn list_directory(
        &self,
        path: &str,
        _show_hidden: bool,
    ) -> Result<DirectoryListing, ApiError> {
        let (latency, failing) = self.record(format!("list_directory:{}", path), path);
        self.respond(latency, failing, |s| {
            s.directories
                .get(path)
                .cloned()
                .unwrap_or_else(|| DirectoryListing {
                    error: Some("Folder not found".to_string()),
                    ..Default::default()
                })
        })
        .await
    }

    async fn list_all(&self, _show_hidden: bool, _force: bool) -> Result<Vec<ListedItem>, ApiError> {
        let (latency, failing) = self.record("list_all".to_string(), "list_all");
        self.respond(latency, failing, |s| s.all_items.clone()).await
    }

    async fn list_files(&self, _show_hidden: bool) -> Result<Vec<FileName>, ApiError> {
        let (latency, failing) = self.record("list_files".to_string(), "list_files");
        self.respond(latency, failing, |s| s.files.clone()).await
    }

    async fn global_search(
        &self,
        query: &str,
        _case_sensitive: bool,
        _use_regex: bool,
    ) -> Result<Vec<SearchMatch>, ApiError> {
        let (latency, failing) = self.record(format!("global_search:{}", query), query);
        self.respond(latency, failing, |s| {
            s.search_hits
                .get(query)
                .map(|paths| {
                    paths
                        .iter()
                        .map(|p| SearchMatch {
                            path: p.clone(),
                            line: Some(1),
                            content: None,
                        })
                        .collect()
                })
                .unwrap_or_default()
        })
        .await
    }

    async fn rename(&self, source: &str, destination: &str) -> Result<MoveResponse, ApiError> {
        let (latency, failing) =
            self.record(format!("rename:{}->{}", source, destination), "rename");
        self.respond(latency, failing, |s| {
            s.move_response.clone().unwrap_or(MoveResponse {
                success: true,
                message: None,
            })
        })
        .await
    }

    async fn move_multi(
        &self,
        paths: &[String],
        destination: &str,
    ) -> Result<MoveResponse, ApiError> {
        let (latency, failing) = self.record(
            format!("move_multi:{}->{}", paths.join(","), destination),
            "move_multi",
        );
        self.respond(latency, failing, |s| {
            s.move_response.clone().unwrap_or(MoveResponse {
                success: true,
                message: None,
            })
        })
        .await
    }

    async fn read_file(&self, path: &str) -> Result<FileContent, ApiError> {
        let (latency, failing) = self.record(format!("read_file:{}", path), path);
        self.respond(latency, failing, |s| FileContent {
            content: s.contents.get(path).cloned().unwrap_or_default(),
            is_base64: false,
            mtime: Some(1.0),
        })
        .await
    }
}
