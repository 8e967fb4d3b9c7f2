//! Open files, one tab per path.

/// One open file.
#[derive(Debug, Clone, PartialEq)]
pub struct Tab {
    pub path: String,
    pub content: String,
    pub original_content: String,
    pub modified: bool,
    pub mtime: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct Tabs {
    tabs: Vec<Tab>,
    active: Option<usize>,
}

impl Tabs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `path` and make it active. An already open, unmodified tab picks
    /// up the new content; a modified one keeps the user's edits.
    pub fn open(&mut self, path: &str, content: String, mtime: Option<f64>) {
        if let Some(idx) = self.position(path) {
            let tab = &mut self.tabs[idx];
            if !tab.modified {
                tab.original_content = content.clone();
                tab.content = content;
                tab.mtime = mtime;
            }
            self.active = Some(idx);
            return;
        }
        self.tabs.push(Tab {
            path: path.to_string(),
            original_content: content.clone(),
            content,
            modified: false,
            mtime,
        });
        self.active = Some(self.tabs.len() - 1);
    }

    /// Replace the buffer of `path`. Returns false if it is not open.
    #[cfg(test)]
    pub fn edit(&mut self, path: &str, content: String) -> bool {
        match self.position(path) {
            Some(idx) => {
                let tab = &mut self.tabs[idx];
                tab.modified = content != tab.original_content;
                tab.content = content;
                true
            }
            None => false,
        }
    }

    /// Close `path`. The tab to its left (or the new first tab) becomes active.
    pub fn close(&mut self, path: &str) -> Option<Tab> {
        let idx = self.position(path)?;
        let tab = self.tabs.remove(idx);
        self.active = match self.active {
            _ if self.tabs.is_empty() => None,
            Some(active) if active > idx => Some(active - 1),
            Some(active) if active == idx => Some(idx.saturating_sub(1)),
            other => other,
        };
        Some(tab)
    }

    pub fn is_modified(&self, path: &str) -> bool {
        self.get(path).is_some_and(|t| t.modified)
    }

    pub fn get(&self, path: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.path == path)
    }

    pub fn active(&self) -> Option<&Tab> {
        self.active.and_then(|idx| self.tabs.get(idx))
    }

    pub fn active_path(&self) -> Option<&str> {
        self.active().map(|t| t.path.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tab> {
        self.tabs.iter()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    fn position(&self, path: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.path == path)
    }
}
