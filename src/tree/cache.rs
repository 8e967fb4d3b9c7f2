//! Per-directory snapshot cache with lazy loading.
//!
//! A path is either absent (unknown, must fetch) or holds the snapshot from
//! its last successful fetch. Concurrent loads of the same path share one
//! backend request through a `watch` channel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;

use crate::error::{ApiError, LoadError};
use crate::remote::api::Backend;
use crate::remote::types::{DirectorySnapshot, FileEntry, FolderEntry, ItemKind, ListedItem};
use crate::tree::path;

type LoadResult = Result<Arc<DirectorySnapshot>, LoadError>;

struct InFlight {
    id: u64,
    rx: watch::Receiver<Option<LoadResult>>,
}

#[derive(Default)]
struct CacheState {
    snapshots: HashMap<String, Arc<DirectorySnapshot>>,
    in_flight: HashMap<String, InFlight>,
    next_id: u64,
    show_hidden: bool,
    /// Bumped whenever every snapshot is dropped.
    epoch: u64,
    /// Bumped per path on `invalidate`.
    generations: HashMap<String, u64>,
}

impl CacheState {
    fn stamp(&self, path: &str) -> (u64, u64) {
        (self.epoch, self.generations.get(path).copied().unwrap_or(0))
    }

    /// Replace the snapshot for `path` wholesale, with no diffing.
    fn merge(&mut self, path: &str, snapshot: Arc<DirectorySnapshot>) {
        self.snapshots.insert(path.to_string(), snapshot);
    }
}

enum Lookup {
    Cached(Arc<DirectorySnapshot>),
    Waiting(watch::Receiver<Option<LoadResult>>),
    Leader {
        id: u64,
        tx: watch::Sender<Option<LoadResult>>,
        show_hidden: bool,
    },
}

/// Removes the leader's in-flight marker if its future is dropped mid-fetch.
struct InFlightGuard<'a> {
    state: &'a Mutex<CacheState>,
    path: String,
    id: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.in_flight.get(&self.path).is_some_and(|f| f.id == self.id) {
            state.in_flight.remove(&self.path);
        }
    }
}

pub struct TreeCache<B> {
    backend: Arc<B>,
    timeout: Duration,
    state: Mutex<CacheState>,
}

impl<B: Backend> TreeCache<B> {
    pub fn new(backend: Arc<B>, show_hidden: bool, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            state: Mutex::new(CacheState {
                show_hidden,
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached snapshot for `path`, if any. Never touches the network.
    pub fn get(&self, path: &str) -> Option<Arc<DirectorySnapshot>> {
        self.state().snapshots.get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.state().snapshots.contains_key(path)
    }

    pub fn is_loading(&self, path: &str) -> bool {
        self.state().in_flight.contains_key(path)
    }

    pub fn show_hidden(&self) -> bool {
        self.state().show_hidden
    }

    /// Return the snapshot for `path`, fetching it once if it is unknown.
    pub async fn load(&self, path: &str) -> LoadResult {
        let path = path::normalize(path);
        let lookup = {
            let mut state = self.state();
            if let Some(snapshot) = state.snapshots.get(&path) {
                Lookup::Cached(Arc::clone(snapshot))
            } else if let Some(flight) = state.in_flight.get(&path) {
                Lookup::Waiting(flight.rx.clone())
            } else {
                let id = state.next_id;
                state.next_id += 1;
                let (tx, rx) = watch::channel(None);
                state.in_flight.insert(path.clone(), InFlight { id, rx });
                Lookup::Leader {
                    id,
                    tx,
                    show_hidden: state.show_hidden,
                }
            }
        };

        match lookup {
            Lookup::Cached(snapshot) => Ok(snapshot),
            Lookup::Waiting(mut rx) => {
                tracing::debug!(path = %path, "joining in-flight load");
                let shared = rx.wait_for(Option::is_some).await.map(|v| (*v).clone());
                match shared {
                    Ok(Some(result)) => result,
                    _ => Err(LoadError::new(path, "load was cancelled")),
                }
            }
            Lookup::Leader {
                id,
                tx,
                show_hidden,
            } => {
                let _guard = InFlightGuard {
                    state: &self.state,
                    path: path.clone(),
                    id,
                };
                let result = self.fetch(&path, show_hidden).await;
                {
                    let mut state = self.state();
                    // Only store if nobody invalidated or cleared us meanwhile.
                    if state.in_flight.get(&path).is_some_and(|f| f.id == id) {
                        state.in_flight.remove(&path);
                        if let Ok(snapshot) = &result {
                            state.snapshots.insert(path.clone(), Arc::clone(snapshot));
                        }
                    }
                }
                if let Err(e) = &result {
                    tracing::warn!(path = %path, error = %e.cause, "directory load failed");
                }
                let _ = tx.send(Some(result.clone()));
                result
            }
        }
    }

    /// Fetch `path` even if cached and replace its snapshot on success.
    /// A failed refresh keeps whatever was cached before.
    /// A result that raced an invalidation or hidden-files toggle is dropped.
    pub async fn refresh(&self, path: &str) -> LoadResult {
        let path = path::normalize(path);
        let (show_hidden, stamp) = {
            let state = self.state();
            (state.show_hidden, state.stamp(&path))
        };
        let result = self.fetch(&path, show_hidden).await;
        match &result {
            Ok(snapshot) => {
                let mut state = self.state();
                if state.stamp(&path) == stamp {
                    state.merge(&path, Arc::clone(snapshot));
                } else {
                    tracing::debug!(path = %path, "discarding stale refresh");
                }
            }
            Err(e) => tracing::warn!(path = %path, error = %e.cause, "directory refresh failed"),
        }
        result
    }

    #[cfg(test)]
    pub fn merge(&self, path: &str, snapshot: Arc<DirectorySnapshot>) {
        self.state().merge(path, snapshot);
    }

    /// Forget `path`. A fetch still running for it will not be stored.
    pub fn invalidate(&self, path: &str) {
        let mut state = self.state();
        state.snapshots.remove(path);
        state.in_flight.remove(path);
        *state.generations.entry(path.to_string()).or_default() += 1;
    }

    /// Listings depend on the hidden-files flag, so changing it starts over.
    pub fn set_show_hidden(&self, show_hidden: bool) {
        let mut state = self.state();
        if state.show_hidden != show_hidden {
            state.show_hidden = show_hidden;
            state.epoch += 1;
            state.snapshots.clear();
            state.in_flight.clear();
        }
    }

    /// Seed the root and every folder from one flat `list_all` call.
    /// Returns the number of directories seeded.
    /// Folders invalidated while the call was running keep their absence.
    pub async fn prefetch_all(&self, force: bool) -> Result<usize, LoadError> {
        let (show_hidden, epoch, generations) = {
            let state = self.state();
            (state.show_hidden, state.epoch, state.generations.clone())
        };
        let items = match tokio::time::timeout(
            self.timeout,
            self.backend.list_all(show_hidden, force),
        )
        .await
        {
            Ok(Ok(items)) => items,
            Ok(Err(e)) => return Err(LoadError::new("", e)),
            Err(_) => return Err(LoadError::new("", ApiError::Timeout)),
        };

        let snapshots = snapshots_from_flat(&items);
        let mut state = self.state();
        if state.epoch != epoch {
            tracing::debug!("discarding stale prefetch");
            return Ok(0);
        }
        let mut count = 0;
        for (dir, snapshot) in snapshots {
            if state.generations.get(&dir) != generations.get(&dir) {
                continue;
            }
            state.merge(&dir, Arc::new(snapshot));
            count += 1;
        }
        tracing::info!(directories = count, items = items.len(), "prefetched tree");
        Ok(count)
    }

    async fn fetch(&self, path: &str, show_hidden: bool) -> LoadResult {
        tracing::debug!(path = %path, show_hidden, "fetching directory");
        let listing =
            match tokio::time::timeout(self.timeout, self.backend.list_directory(path, show_hidden))
                .await
            {
                Ok(Ok(listing)) => listing,
                Ok(Err(e)) => return Err(LoadError::new(path, e)),
                Err(_) => return Err(LoadError::new(path, ApiError::Timeout)),
            };
        listing
            .into_snapshot()
            .map(Arc::new)
            .map_err(|cause| LoadError::new(path, cause))
    }
}

/// Group a flat listing into one snapshot per directory (root included).
fn snapshots_from_flat(items: &[ListedItem]) -> HashMap<String, DirectorySnapshot> {
    let mut dirs: HashMap<String, DirectorySnapshot> = HashMap::new();
    dirs.insert(String::new(), DirectorySnapshot::default());

    for item in items {
        let item_path = path::normalize(&item.path);
        if item_path.is_empty() {
            continue;
        }
        if item.kind == ItemKind::Folder {
            dirs.entry(item_path.clone()).or_default();
        }
        let parent = path::parent(&item_path).to_string();
        let name = path::file_name(&item_path).to_string();
        let dir = dirs.entry(parent).or_default();
        match item.kind {
            ItemKind::Folder => dir.folders.push(FolderEntry {
                path: item_path,
                name,
                child_count: 0,
                is_symlink: false,
                symlink_target: None,
            }),
            ItemKind::File => dir.files.push(FileEntry {
                path: item_path,
                name,
                size: item.size.unwrap_or(0),
                is_symlink: false,
                symlink_target: None,
                mtime: None,
            }),
        }
    }

    let counts: HashMap<String, u64> = dirs
        .iter()
        .map(|(dir, s)| (dir.clone(), (s.folders.len() + s.files.len()) as u64))
        .collect();
    for snapshot in dirs.values_mut() {
        for folder in &mut snapshot.folders {
            folder.child_count = counts.get(&folder.path).copied().unwrap_or(0);
        }
    }
    dirs
}
