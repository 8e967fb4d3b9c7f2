//! Derives the visible rows of the explorer from the current state.
//!
//! Nothing here touches the network: folders that are not cached show up
//! as a `Loading` row and it is up to the caller to fetch them.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::remote::api::Backend;
use crate::remote::types::{DirectorySnapshot, FileEntry, FolderEntry};
use crate::tabs::Tabs;
use crate::tree::cache::TreeCache;
use crate::tree::nav::Navigation;
use crate::tree::path;
use crate::tree::search::SearchState;

/// Read-only view of cached directories.
pub trait SnapshotSource {
    fn snapshot(&self, path: &str) -> Option<Arc<DirectorySnapshot>>;
}

impl<B: Backend> SnapshotSource for TreeCache<B> {
    fn snapshot(&self, path: &str) -> Option<Arc<DirectorySnapshot>> {
        self.get(path)
    }
}

impl SnapshotSource for HashMap<String, Arc<DirectorySnapshot>> {
    fn snapshot(&self, path: &str) -> Option<Arc<DirectorySnapshot>> {
        self.get(path).cloned()
    }
}

/// How folders are presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeMode {
    /// One folder at a time with a breadcrumb trail.
    #[default]
    Navigation,
    /// Nested tree from the root with expandable folders.
    #[serde(alias = "tree")]
    Collapsible,
}

impl TreeMode {
    pub fn toggled(self) -> Self {
        match self {
            TreeMode::Navigation => TreeMode::Collapsible,
            TreeMode::Collapsible => TreeMode::Navigation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symlink {
    Valid(String),
    Broken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Folder { expanded: bool },
    File,
    /// Placeholder for a folder whose contents are being fetched.
    Loading,
    /// "No results".
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub kind: RowKind,
    pub path: String,
    pub name: String,
    pub depth: usize,
    pub size: Option<u64>,
    pub symlink: Option<Symlink>,
    pub pinned: bool,
    pub modified: bool,
    pub active: bool,
}

impl DisplayRow {
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, RowKind::Folder { .. })
    }

    pub fn is_file(&self) -> bool {
        self.kind == RowKind::File
    }

    fn placeholder(kind: RowKind, path: &str, depth: usize) -> Self {
        let name = match kind {
            RowKind::Empty => "No results",
            _ => "Loading...",
        };
        Self {
            kind,
            path: path.to_string(),
            name: name.to_string(),
            depth,
            size: None,
            symlink: None,
            pinned: false,
            modified: false,
            active: false,
        }
    }
}

/// Everything the row derivation reads.
pub struct RenderContext<'a> {
    pub nav: &'a Navigation,
    pub source: &'a dyn SnapshotSource,
    pub search: &'a SearchState,
    pub expanded: &'a HashSet<String>,
    pub mode: TreeMode,
    pub tabs: &'a Tabs,
    pub favorites: &'a BTreeSet<String>,
}

impl RenderContext<'_> {
    fn folder_row(&self, folder: &FolderEntry, depth: usize, expanded: bool) -> DisplayRow {
        DisplayRow {
            kind: RowKind::Folder { expanded },
            path: folder.path.clone(),
            name: folder.name.clone(),
            depth,
            size: None,
            symlink: symlink_badge(folder.is_symlink, folder.symlink_target.as_deref()),
            pinned: self.favorites.contains(&folder.path),
            modified: false,
            active: false,
        }
    }

    fn file_row(&self, file_path: &str, entry: Option<&FileEntry>, depth: usize) -> DisplayRow {
        DisplayRow {
            kind: RowKind::File,
            path: file_path.to_string(),
            name: entry
                .map(|f| f.name.clone())
                .unwrap_or_else(|| path::file_name(file_path).to_string()),
            depth,
            size: entry.map(|f| f.size),
            symlink: entry.and_then(|f| symlink_badge(f.is_symlink, f.symlink_target.as_deref())),
            pinned: self.favorites.contains(file_path),
            modified: self.tabs.is_modified(file_path),
            active: self.tabs.active_path() == Some(file_path),
        }
    }
}

fn symlink_badge(is_symlink: bool, target: Option<&str>) -> Option<Symlink> {
    if !is_symlink {
        return None;
    }
    Some(match target {
        Some(target) if !target.is_empty() => Symlink::Valid(target.to_string()),
        _ => Symlink::Broken,
    })
}

fn by_name(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn sorted_folders(snapshot: &DirectorySnapshot) -> Vec<&FolderEntry> {
    let mut folders: Vec<_> = snapshot.folders.iter().collect();
    folders.sort_by(|a, b| by_name(&a.name, &b.name));
    folders
}

fn sorted_files(snapshot: &DirectorySnapshot) -> Vec<&FileEntry> {
    let mut files: Vec<_> = snapshot.files.iter().collect();
    files.sort_by(|a, b| by_name(&a.name, &b.name));
    files
}

fn name_matches(name: &str, filter: Option<&str>) -> bool {
    filter.map_or(true, |q| name.to_lowercase().contains(q))
}

/// Whether anything already loaded below `dir` matches `filter`.
fn subtree_matches(source: &dyn SnapshotSource, dir: &str, filter: &str) -> bool {
    let Some(snapshot) = source.snapshot(dir) else {
        return false;
    };
    snapshot.files.iter().any(|f| name_matches(&f.name, Some(filter)))
        || snapshot.folders.iter().any(|f| {
            name_matches(&f.name, Some(filter)) || subtree_matches(source, &f.path, filter)
        })
}

/// Rows to draw, top to bottom.
pub fn render_rows(ctx: &RenderContext<'_>) -> Vec<DisplayRow> {
    if let Some(overlay) = ctx.search.overlay().filter(|set| !set.is_empty()) {
        return overlay_rows(ctx, overlay);
    }

    let filter = ctx
        .search
        .is_active()
        .then(|| ctx.search.query().trim().to_lowercase());
    let filter = filter.as_deref();

    let mut rows = Vec::new();
    match ctx.mode {
        TreeMode::Collapsible => push_tree(ctx, "", 0, filter, &mut rows),
        TreeMode::Navigation => push_folder(ctx, ctx.nav.current(), filter, &mut rows),
    }

    if rows.is_empty() && ctx.search.overlay().is_some() {
        rows.push(DisplayRow::placeholder(RowKind::Empty, "", 0));
    }
    rows
}

fn overlay_rows(ctx: &RenderContext<'_>, overlay: &BTreeSet<String>) -> Vec<DisplayRow> {
    overlay
        .iter()
        .map(|file_path| {
            let parent = ctx.source.snapshot(path::parent(file_path));
            let entry = parent.as_ref().and_then(|s| s.file(file_path));
            ctx.file_row(file_path, entry, 0)
        })
        .collect()
}

fn push_folder(
    ctx: &RenderContext<'_>,
    dir: &str,
    filter: Option<&str>,
    rows: &mut Vec<DisplayRow>,
) {
    let Some(snapshot) = ctx.source.snapshot(dir) else {
        rows.push(DisplayRow::placeholder(RowKind::Loading, dir, 0));
        return;
    };
    for folder in sorted_folders(&snapshot) {
        if name_matches(&folder.name, filter) {
            rows.push(ctx.folder_row(folder, 0, false));
        }
    }
    for file in sorted_files(&snapshot) {
        if name_matches(&file.name, filter) {
            rows.push(ctx.file_row(&file.path, Some(file), 0));
        }
    }
}

fn push_tree(
    ctx: &RenderContext<'_>,
    dir: &str,
    depth: usize,
    filter: Option<&str>,
    rows: &mut Vec<DisplayRow>,
) {
    let Some(snapshot) = ctx.source.snapshot(dir) else {
        if filter.is_none() {
            rows.push(DisplayRow::placeholder(RowKind::Loading, dir, depth));
        }
        return;
    };

    for folder in sorted_folders(&snapshot) {
        let open = match filter {
            None => ctx.expanded.contains(&folder.path),
            Some(q) => {
                let below = subtree_matches(ctx.source, &folder.path, q);
                if !below && !name_matches(&folder.name, filter) {
                    continue;
                }
                below
            }
        };
        rows.push(ctx.folder_row(folder, depth, open));
        if open {
            push_tree(ctx, &folder.path, depth + 1, filter, rows);
        }
    }
    for file in sorted_files(&snapshot) {
        if name_matches(&file.name, filter) {
            rows.push(ctx.file_row(&file.path, Some(file), depth));
        }
    }
}

/// Human readable size with binary prefixes: `0 Bytes`, `1.5 KB`, `2 MB`.
pub fn format_bytes(bytes: u64, decimals: usize) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let mut number = format!("{:.*}", decimals, value);
    if number.contains('.') {
        number = number.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    format!("{} {}", number, UNITS[unit])
}
