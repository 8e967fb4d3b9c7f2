//! Validation and execution of moves between folders.
//!
//! Marking items is the start of a drag; moving onto a folder is the drop.
//! Every validation happens before any request is sent.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::MoveError;
use crate::remote::api::Backend;
use crate::tree::path;

/// Workspace-root entries that can never be dragged. Nested copies move freely.
const PROTECTED: &[&str] = &[".git", ".gitignore"];

/// A validated move, ready to confirm and send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovePlan {
    Rename { source: String, destination: String },
    MoveMulti { paths: Vec<String>, destination: String },
}

impl MovePlan {
    pub fn sources(&self) -> Vec<&str> {
        match self {
            MovePlan::Rename { source, .. } => vec![source.as_str()],
            MovePlan::MoveMulti { paths, .. } => paths.iter().map(String::as_str).collect(),
        }
    }

    /// Folder the items end up in.
    pub fn target_dir(&self) -> &str {
        match self {
            MovePlan::Rename { destination, .. } => path::parent(destination),
            MovePlan::MoveMulti { destination, .. } => destination,
        }
    }

    /// Directories whose listings change: every old parent and the new one.
    pub fn affected_dirs(&self) -> BTreeSet<String> {
        let mut dirs: BTreeSet<String> = self
            .sources()
            .into_iter()
            .map(|s| path::parent(s).to_string())
            .collect();
        dirs.insert(self.target_dir().to_string());
        dirs
    }
}

impl fmt::Display for MovePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match self.target_dir() {
            "" => "/",
            dir => dir,
        };
        match self {
            MovePlan::Rename { source, .. } => {
                write!(f, "Move '{}' to '{}'?", path::file_name(source), target)
            }
            MovePlan::MoveMulti { paths, .. } => {
                write!(f, "Move {} items to '{}'?", paths.len(), target)
            }
        }
    }
}

/// Why a move was not planned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveRejection {
    /// Already in the target folder. Not worth a message.
    AlreadyThere,
    IntoItself,
    Protected(String),
}

impl MoveRejection {
    /// Text for the status bar, or `None` for a silent no-op.
    pub fn warning(&self) -> Option<String> {
        match self {
            MoveRejection::AlreadyThere => None,
            MoveRejection::IntoItself => Some("Cannot move a folder into itself".to_string()),
            MoveRejection::Protected(name) => Some(format!("'{}' cannot be moved", name)),
        }
    }
}

fn check_source(source: &str, target: &str) -> Result<(), MoveRejection> {
    if source == target || path::is_strict_descendant(target, source) {
        return Err(MoveRejection::IntoItself);
    }
    if PROTECTED.contains(&source) {
        return Err(MoveRejection::Protected(source.to_string()));
    }
    Ok(())
}

/// Plan moving `source` into the folder `target`.
pub fn plan_move(source: &str, target: &str) -> Result<MovePlan, MoveRejection> {
    let source = path::normalize(source);
    let target = path::normalize(target);
    check_source(&source, &target)?;
    if path::parent(&source) == target {
        return Err(MoveRejection::AlreadyThere);
    }
    Ok(MovePlan::Rename {
        destination: path::join(&target, path::file_name(&source)),
        source,
    })
}

/// Plan moving several items into `target`. Items already there are
/// skipped; any item that would move into itself rejects the whole move.
pub fn plan_move_multi(sources: &[String], target: &str) -> Result<MovePlan, MoveRejection> {
    if let [single] = sources {
        return plan_move(single, target);
    }
    let target = path::normalize(target);
    let mut paths = Vec::new();
    for source in sources {
        let source = path::normalize(source);
        check_source(&source, &target)?;
        if path::parent(&source) != target && !paths.contains(&source) {
            paths.push(source);
        }
    }
    if paths.is_empty() {
        return Err(MoveRejection::AlreadyThere);
    }
    Ok(MovePlan::MoveMulti {
        paths,
        destination: target,
    })
}

/// Send the single request for a confirmed plan.
pub async fn execute_move<B: Backend>(backend: &B, plan: &MovePlan) -> Result<(), MoveError> {
    tracing::info!(plan = ?plan, "moving items");
    let response = match plan {
        MovePlan::Rename {
            source,
            destination,
        } => backend.rename(source, destination).await?,
        MovePlan::MoveMulti { paths, destination } => {
            backend.move_multi(paths, destination).await?
        }
    };
    if response.success {
        Ok(())
    } else {
        Err(MoveError::Rejected {
            message: response
                .message
                .unwrap_or_else(|| "backend refused the move".to_string()),
        })
    }
}

/// Items marked for moving, in marking order.
#[derive(Debug, Clone, Default)]
pub struct Marks {
    paths: Vec<String>,
}

impl Marks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark or unmark `path`. Returns whether it is now marked.
    pub fn toggle(&mut self, path: &str) -> bool {
        if let Some(idx) = self.paths.iter().position(|p| p == path) {
            self.paths.remove(idx);
            false
        } else {
            self.paths.push(path.to_string());
            true
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }
}
