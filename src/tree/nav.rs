//! Folder navigation with a back stack and breadcrumb trail.

use crate::tree::path;

/// One clickable element of the breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub label: String,
    /// Target path; `""` for Home.
    pub path: String,
    pub is_current: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigation {
    current: String,
    history: Vec<String>,
}

impl Navigation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty()
    }

    /// Enter `folder`, remembering where we came from. Re-entering the
    /// current folder leaves history alone.
    pub fn navigate_into(&mut self, folder: &str) {
        let folder = path::normalize(folder);
        if folder != self.current {
            let previous = std::mem::replace(&mut self.current, folder);
            self.history.push(previous);
        }
    }

    /// Return to the previous folder. Returns false (and does nothing) when
    /// there is no history.
    pub fn navigate_back(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.current = previous;
                true
            }
            None => false,
        }
    }

    /// Jump straight to `target`; the back stack is discarded.
    pub fn navigate_to_breadcrumb(&mut self, target: &str) {
        self.current = path::normalize(target);
        self.history.clear();
    }

    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        let mut crumbs = vec![Breadcrumb {
            label: "Home".to_string(),
            path: String::new(),
            is_current: self.current.is_empty(),
        }];
        crumbs.extend(path::prefixes(&self.current).into_iter().map(|prefix| {
            Breadcrumb {
                label: path::file_name(prefix).to_string(),
                path: prefix.to_string(),
                is_current: prefix == self.current,
            }
        }));
        crumbs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_and_back_restores_previous_state() {
        let mut nav = Navigation::new();
        nav.navigate_into("src");
        assert_eq!(nav.current(), "src");
        assert_eq!(nav.history(), &[String::new()]);

        assert!(nav.navigate_back());
        assert_eq!(nav.current(), "");
        assert!(nav.history().is_empty());
    }

    #[test]
    fn entering_current_folder_keeps_history() {
        let mut nav = Navigation::new();
        nav.navigate_into("src");
        nav.navigate_into("src/");
        assert_eq!(nav.history().len(), 1);
    }

    #[test]
    fn back_on_empty_history_is_noop() {
        let mut nav = Navigation::new();
        assert!(!nav.navigate_back());
        assert_eq!(nav, Navigation::new());
    }

    #[test]
    fn breadcrumb_jump_clears_history() {
        let mut nav = Navigation::new();
        nav.navigate_into("a");
        nav.navigate_into("a/b");
        nav.navigate_into("a/b/c");
        nav.navigate_to_breadcrumb("a");
        assert_eq!(nav.current(), "a");
        assert!(!nav.can_go_back());
        assert!(!nav.navigate_back());
        assert_eq!(nav.current(), "a");
    }

    #[test]
    fn breadcrumbs_mark_last_segment_current() {
        let mut nav = Navigation::new();
        nav.navigate_into("blueprints/automation");
        let crumbs = nav.breadcrumbs();
        let labels: Vec<_> = crumbs.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Home", "blueprints", "automation"]);
        assert_eq!(crumbs[1].path, "blueprints");
        assert!(!crumbs[0].is_current);
        assert!(crumbs[2].is_current);
    }

    #[test]
    fn breadcrumbs_at_root_is_only_home() {
        let crumbs = Navigation::new().breadcrumbs();
        assert_eq!(crumbs.len(), 1);
        assert!(crumbs[0].is_current);
    }
}
