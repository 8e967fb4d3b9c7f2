//! Wire types for the Blueprint Studio API and the cached directory model.

use serde::{Deserialize, Serialize};

use crate::tree::path;

/// A file inside a directory listing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub path: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub is_symlink: bool,
    #[serde(default)]
    pub symlink_target: Option<String>,
    #[serde(default)]
    pub mtime: Option<f64>,
}

/// A folder inside a directory listing. Its children are not implied.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderEntry {
    pub path: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub child_count: u64,
    #[serde(default)]
    pub is_symlink: bool,
    #[serde(default)]
    pub symlink_target: Option<String>,
}

/// The known contents of one directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectorySnapshot {
    pub folders: Vec<FolderEntry>,
    pub files: Vec<FileEntry>,
}

impl DirectorySnapshot {
    pub fn file(&self, path: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Fill in names and normalize paths the backend may have left loose.
    fn normalized(mut self) -> Self {
        for folder in &mut self.folders {
            folder.path = path::normalize(&folder.path);
            if folder.name.is_empty() {
                folder.name = path::file_name(&folder.path).to_string();
            }
        }
        for file in &mut self.files {
            file.path = path::normalize(&file.path);
            if file.name.is_empty() {
                file.name = path::file_name(&file.path).to_string();
            }
        }
        self
    }
}

/// Response of `list_directory`: either contents or an inline error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryListing {
    #[serde(default)]
    pub folders: Vec<FolderEntry>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
    #[serde(default)]
    pub error: Option<String>,
}

impl DirectoryListing {
    pub fn into_snapshot(self) -> Result<DirectorySnapshot, String> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(DirectorySnapshot {
            folders: self.folders,
            files: self.files,
        }
        .normalized())
    }
}

/// Kind of an entry in the recursive `list_all` listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Folder,
}

/// One entry of `list_all`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ListedItem {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default)]
    pub size: Option<u64>,
}

/// One entry of `list_files`, used by filename search.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FileName {
    pub name: String,
    pub path: String,
}

/// One hit of `global_search`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchMatch {
    pub path: String,
    #[serde(default)]
    pub line: Option<u64>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Reply of `rename` and `move_multi`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MoveResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Reply of `read_file`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FileContent {
    pub content: String,
    #[serde(default)]
    pub is_base64: bool,
    #[serde(default)]
    pub mtime: Option<f64>,
}
