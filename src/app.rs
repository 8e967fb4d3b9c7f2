use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::debounce::Debouncer;
use crate::event::{Event, EventSender};
use crate::remote::api::Backend;
use crate::tabs::Tabs;
use crate::theme::{resolve_theme, ThemeColors};
use crate::tree::cache::TreeCache;
use crate::tree::moves::{execute_move, plan_move_multi, Marks, MovePlan};
use crate::tree::nav::Navigation;
use crate::tree::path;
use crate::tree::render::{render_rows, DisplayRow, RenderContext, RowKind, TreeMode};
use crate::tree::search::{run_search, SearchMode, SearchOptions, SearchState, SearchTicket};

/// How long a status message stays visible.
const STATUS_TTL: Duration = Duration::from_secs(4);

/// The kind of dialog being displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogKind {
    ConfirmMove(MovePlan),
}

/// Application mode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Normal,
    /// Typing into the search bar.
    Search,
    Dialog(DialogKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    pub created: Instant,
}

/// Runtime knobs taken from config.
#[derive(Debug, Clone)]
pub struct Settings {
    pub show_hidden: bool,
    pub lazy_loading: bool,
    pub filename_debounce: Duration,
    pub content_debounce: Duration,
    pub case_sensitive: bool,
    pub use_regex: bool,
    pub request_timeout: Duration,
}

impl Settings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            show_hidden: config.show_hidden(),
            lazy_loading: config.lazy_loading(),
            filename_debounce: config.filename_debounce(),
            content_debounce: config.content_debounce(),
            case_sensitive: config.case_sensitive(),
            use_regex: config.use_regex(),
            request_timeout: config.request_timeout(),
        }
    }
}

/// Session state of the explorer. All mutation happens on the main loop;
/// backend requests run in spawned tasks and report back as [`Event`]s.
pub struct App<B: Backend> {
    backend: Arc<B>,
    cache: Arc<TreeCache<B>>,
    events: EventSender,
    settings: Settings,
    debouncer: Debouncer,
    /// Latest scheduled search, until its result arrives.
    searching: Option<SearchTicket>,
    pub nav: Navigation,
    pub search: SearchState,
    pub expanded: HashSet<String>,
    pub tree_mode: TreeMode,
    pub tabs: Tabs,
    pub favorites: BTreeSet<String>,
    pub marks: Marks,
    pub selected: usize,
    pub scroll_offset: usize,
    pub mode: AppMode,
    pub status_message: Option<StatusMessage>,
    pub theme: ThemeColors,
    pub should_quit: bool,
}

impl<B: Backend> App<B> {
    pub fn new(backend: Arc<B>, events: EventSender, config: &AppConfig) -> Self {
        let settings = Settings::from_config(config);
        let cache = Arc::new(TreeCache::new(
            Arc::clone(&backend),
            settings.show_hidden,
            settings.request_timeout,
        ));
        Self {
            backend,
            cache,
            events,
            settings,
            debouncer: Debouncer::new(),
            searching: None,
            nav: Navigation::new(),
            search: SearchState::new(config.search_mode()),
            expanded: HashSet::new(),
            tree_mode: config.tree_mode(),
            tabs: Tabs::new(),
            favorites: config.favorites(),
            marks: Marks::new(),
            selected: 0,
            scroll_offset: 0,
            mode: AppMode::Normal,
            status_message: None,
            theme: resolve_theme(&config.theme),
            should_quit: false,
        }
    }

    pub fn cache(&self) -> &TreeCache<B> {
        &self.cache
    }

    /// Kick off the initial fetches and optionally open `start_path`.
    pub fn start(&mut self, start_path: Option<&str>) {
        let start = start_path.map(path::normalize).unwrap_or_default();
        if !start.is_empty() {
            match self.tree_mode {
                TreeMode::Navigation => self.nav.navigate_to_breadcrumb(&start),
                TreeMode::Collapsible => {
                    self.expanded
                        .extend(path::prefixes(&start).into_iter().map(str::to_string));
                }
            }
        }
        if self.settings.lazy_loading {
            self.load_visible();
        } else {
            self.spawn_prefetch(false);
        }
    }

    // ── Rows & selection ────────────────────────────────────────────────────

    /// Visible rows, derived fresh from the current state.
    pub fn rows(&self) -> Vec<DisplayRow> {
        render_rows(&RenderContext {
            nav: &self.nav,
            source: &*self.cache,
            search: &self.search,
            expanded: &self.expanded,
            mode: self.tree_mode,
            tabs: &self.tabs,
            favorites: &self.favorites,
        })
    }

    pub fn selected_row(&self) -> Option<DisplayRow> {
        self.rows().into_iter().nth(self.selected)
    }

    pub fn select_next(&mut self) {
        let len = self.rows().len();
        if len > 0 && self.selected < len - 1 {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.rows().len().saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let len = self.rows().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    /// Keep the selection inside a viewport of `visible_height` rows.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected + 1 - visible_height;
        }
    }

    // ── Loading ─────────────────────────────────────────────────────────────

    /// Directories whose contents are on screen.
    pub fn visible_dirs(&self) -> Vec<String> {
        match self.tree_mode {
            TreeMode::Navigation => vec![self.nav.current().to_string()],
            TreeMode::Collapsible => {
                let mut dirs = vec![String::new()];
                let mut expanded: Vec<_> = self.expanded.iter().cloned().collect();
                expanded.sort();
                dirs.extend(expanded);
                dirs
            }
        }
    }

    /// Fetch `dir` unless it is cached or already on its way.
    pub fn ensure_loaded(&self, dir: &str) {
        if self.cache.contains(dir) || self.cache.is_loading(dir) {
            return;
        }
        self.spawn_load(dir.to_string());
    }

    fn load_visible(&self) {
        for dir in self.visible_dirs() {
            self.ensure_loaded(&dir);
        }
    }

    fn spawn_load(&self, dir: String) {
        let cache = Arc::clone(&self.cache);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = cache.load(&dir).await;
            let _ = tx.send(Event::DirectoryLoaded { path: dir, result });
        });
    }

    fn spawn_refresh(&self, dir: String) {
        let cache = Arc::clone(&self.cache);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = cache.refresh(&dir).await;
            let _ = tx.send(Event::DirectoryLoaded { path: dir, result });
        });
    }

    fn spawn_prefetch(&self, force: bool) {
        let cache = Arc::clone(&self.cache);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = cache.prefetch_all(force).await;
            let _ = tx.send(Event::TreePrefetched(result));
        });
    }

    /// Re-fetch what is on screen. Old snapshots stay until the new ones land.
    pub fn refresh(&mut self) {
        if !self.settings.lazy_loading {
            self.spawn_prefetch(true);
        }
        for dir in self.visible_dirs() {
            self.spawn_refresh(dir);
        }
        self.set_status(StatusLevel::Info, "Refreshing...");
    }

    pub fn toggle_hidden(&mut self) {
        self.settings.show_hidden = !self.settings.show_hidden;
        self.cache.set_show_hidden(self.settings.show_hidden);
        tracing::info!(show_hidden = self.settings.show_hidden, "hidden files toggled");
        if self.settings.lazy_loading {
            self.load_visible();
        } else {
            self.spawn_prefetch(true);
        }
        if let Some(ticket) = self.search.ticket() {
            self.schedule_search(ticket);
        }
        self.selected = 0;
    }

    // ── Navigation ──────────────────────────────────────────────────────────

    pub fn navigate_into(&mut self, folder: &str) {
        self.nav.navigate_into(folder);
        self.selected = 0;
        self.ensure_loaded(self.nav.current());
    }

    pub fn navigate_back(&mut self) {
        if self.nav.navigate_back() {
            self.selected = 0;
            self.ensure_loaded(self.nav.current());
        }
    }

    pub fn navigate_to_breadcrumb(&mut self, target: &str) {
        self.nav.navigate_to_breadcrumb(target);
        self.selected = 0;
        self.ensure_loaded(self.nav.current());
    }

    /// Jump to breadcrumb `index` (0 is Home).
    pub fn breadcrumb_jump(&mut self, index: usize) {
        if let Some(crumb) = self.nav.breadcrumbs().get(index) {
            let target = crumb.path.clone();
            self.navigate_to_breadcrumb(&target);
        }
    }

    /// Breadcrumb jump to the parent of the current folder.
    pub fn navigate_up(&mut self) {
        if !self.nav.current().is_empty() {
            let parent = path::parent(self.nav.current()).to_string();
            self.navigate_to_breadcrumb(&parent);
        }
    }

    /// Home in navigation mode, fold everything in tree mode.
    pub fn collapse_all(&mut self) {
        match self.tree_mode {
            TreeMode::Navigation => self.navigate_to_breadcrumb(""),
            TreeMode::Collapsible => {
                self.expanded.clear();
                self.selected = 0;
            }
        }
    }

    pub fn toggle_expand(&mut self, folder: &str) {
        if !self.expanded.remove(folder) {
            self.expanded.insert(folder.to_string());
            self.ensure_loaded(folder);
        }
    }

    pub fn toggle_tree_mode(&mut self) {
        self.tree_mode = self.tree_mode.toggled();
        self.selected = 0;
        self.scroll_offset = 0;
        self.load_visible();
    }

    /// Enter: open a folder or a file.
    pub fn activate_selected(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        match row.kind {
            RowKind::Folder { .. } => match self.tree_mode {
                TreeMode::Navigation => self.navigate_into(&row.path),
                TreeMode::Collapsible => self.toggle_expand(&row.path),
            },
            RowKind::File => self.open_file(&row.path),
            RowKind::Loading | RowKind::Empty => {}
        }
    }

    /// Backspace: go back in navigation mode; collapse or climb in tree mode.
    pub fn back_or_collapse(&mut self) {
        match self.tree_mode {
            TreeMode::Navigation => self.navigate_back(),
            TreeMode::Collapsible => {
                let Some(row) = self.selected_row() else {
                    return;
                };
                if row.kind == (RowKind::Folder { expanded: true }) {
                    self.expanded.remove(&row.path);
                    return;
                }
                let parent = path::parent(&row.path);
                if let Some(idx) = self.rows().iter().position(|r| r.is_folder() && r.path == parent) {
                    self.selected = idx;
                }
            }
        }
    }

    // ── Search ──────────────────────────────────────────────────────────────

    pub fn set_search_query(&mut self, raw: &str) {
        match self.search.set_query(raw) {
            Some(ticket) => self.schedule_search(ticket),
            None => {
                self.debouncer.cancel();
                self.searching = None;
            }
        }
        self.selected = 0;
    }

    pub fn search_push_char(&mut self, c: char) {
        let mut query = self.search.query().to_string();
        query.push(c);
        self.set_search_query(&query);
    }

    pub fn search_pop_char(&mut self) {
        let mut query = self.search.query().to_string();
        query.pop();
        self.set_search_query(&query);
    }

    pub fn clear_search(&mut self) {
        self.debouncer.cancel();
        self.searching = None;
        self.search.clear();
        self.selected = 0;
    }

    pub fn toggle_search_mode(&mut self) {
        let ticket = self.search.toggle_mode();
        if let Some(ticket) = ticket {
            self.schedule_search(ticket);
        }
        let mode = self.search.mode();
        self.set_status(StatusLevel::Info, format!("Search mode: {}", mode));
    }

    fn schedule_search(&mut self, ticket: SearchTicket) {
        let delay = match ticket.mode {
            SearchMode::Filename => self.settings.filename_debounce,
            SearchMode::Content => self.settings.content_debounce,
        };
        let options = SearchOptions {
            show_hidden: self.settings.show_hidden,
            case_sensitive: self.settings.case_sensitive,
            use_regex: self.settings.use_regex,
        };
        self.searching = Some(ticket.clone());
        let backend = Arc::clone(&self.backend);
        let tx = self.events.clone();
        self.debouncer.schedule(delay, move || async move {
            tracing::debug!(mode = %ticket.mode, query = %ticket.query, "running search");
            let result = run_search(&*backend, &ticket, options).await;
            let _ = tx.send(Event::SearchFinished { ticket, result });
        });
    }

    /// True from the keystroke until the latest search's result lands.
    pub fn is_search_pending(&self) -> bool {
        self.searching.is_some()
    }

    // ── Favorites, marks & moves ────────────────────────────────────────────

    pub fn toggle_favorite(&mut self) {
        let Some(row) = self.selected_row().filter(|r| r.is_file() || r.is_folder()) else {
            return;
        };
        if self.favorites.remove(&row.path) {
            self.set_status(StatusLevel::Info, format!("Unpinned {}", row.name));
        } else {
            self.favorites.insert(row.path.clone());
            self.set_status(StatusLevel::Info, format!("Pinned {}", row.name));
        }
    }

    pub fn toggle_mark(&mut self) {
        let Some(row) = self.selected_row().filter(|r| r.is_file() || r.is_folder()) else {
            return;
        };
        self.marks.toggle(&row.path);
        self.select_next();
    }

    /// Folder a drop lands in: the selected folder, else the folder holding
    /// the selected file, else the current folder.
    fn drop_target(&self) -> String {
        match self.selected_row() {
            Some(row) if row.is_folder() => row.path,
            Some(row) if row.is_file() => path::parent(&row.path).to_string(),
            _ => match self.tree_mode {
                TreeMode::Navigation => self.nav.current().to_string(),
                TreeMode::Collapsible => String::new(),
            },
        }
    }

    /// Validate moving the marked items and ask for confirmation.
    pub fn request_move(&mut self) {
        if self.marks.is_empty() {
            self.set_status(StatusLevel::Warning, "Nothing marked (x to mark)");
            return;
        }
        let target = self.drop_target();
        match plan_move_multi(self.marks.paths(), &target) {
            Ok(plan) => self.mode = AppMode::Dialog(DialogKind::ConfirmMove(plan)),
            Err(rejection) => {
                if let Some(warning) = rejection.warning() {
                    self.set_status(StatusLevel::Warning, warning);
                }
            }
        }
    }

    pub fn confirm_dialog(&mut self) {
        let AppMode::Dialog(DialogKind::ConfirmMove(plan)) = &self.mode else {
            return;
        };
        let plan = plan.clone();
        self.mode = AppMode::Normal;
        let backend = Arc::clone(&self.backend);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = execute_move(&*backend, &plan).await;
            let _ = tx.send(Event::MoveFinished { plan, result });
        });
        self.set_status(StatusLevel::Info, "Moving...");
    }

    pub fn cancel_dialog(&mut self) {
        self.mode = AppMode::Normal;
    }

    fn apply_move(&mut self, plan: &MovePlan) {
        for dir in plan.affected_dirs() {
            self.cache.invalidate(&dir);
        }
        let sources = plan.sources();
        let moved = |p: &str| sources.iter().any(|s| p == *s || path::is_strict_descendant(p, s));
        if moved(self.nav.current()) {
            let target = plan.target_dir().to_string();
            self.nav.navigate_to_breadcrumb(&target);
        }
        self.expanded.retain(|p| !moved(p.as_str()));
        self.marks.clear();
        self.load_visible();

        let count = sources.len();
        let noun = if count == 1 { "item" } else { "items" };
        self.set_status(StatusLevel::Info, format!("Moved {} {}", count, noun));
    }

    // ── Files ───────────────────────────────────────────────────────────────

    pub fn open_file(&mut self, file_path: &str) {
        let backend = Arc::clone(&self.backend);
        let tx = self.events.clone();
        let file_path = file_path.to_string();
        tokio::spawn(async move {
            let result = backend.read_file(&file_path).await;
            let _ = tx.send(Event::FileOpened {
                path: file_path,
                result,
            });
        });
    }

    pub fn close_active_tab(&mut self) {
        let Some(active) = self.tabs.active_path().map(str::to_string) else {
            return;
        };
        if self.tabs.close(&active).is_some_and(|tab| tab.modified) {
            self.set_status(StatusLevel::Warning, format!("Discarded edits to {}", active));
        }
    }

    // ── Events ──────────────────────────────────────────────────────────────

    /// Apply everything except key presses, which go through the handler.
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(_) | Event::Resize(_, _) => {}
            Event::Tick => self.clear_expired_status(),
            Event::DirectoryLoaded { path: dir, result } => {
                if let Err(e) = result {
                    self.set_status(StatusLevel::Error, e.to_string());
                } else {
                    tracing::debug!(path = %dir, "directory loaded");
                }
                self.clamp_selection();
            }
            Event::TreePrefetched(result) => {
                match result {
                    Ok(count) => tracing::debug!(directories = count, "tree prefetched"),
                    Err(e) => self.set_status(StatusLevel::Error, e.to_string()),
                }
                // Fill gaps, or fall back to lazy loads if the prefetch failed.
                self.load_visible();
                self.clamp_selection();
            }
            Event::SearchFinished { ticket, result } => {
                if self.searching.as_ref() == Some(&ticket) {
                    self.searching = None;
                }
                let message = result.as_ref().err().map(ToString::to_string);
                if self.search.apply(&ticket, result) {
                    if let Some(message) = message {
                        tracing::warn!(error = %message, "search failed");
                        self.set_status(StatusLevel::Error, message);
                    }
                    self.selected = 0;
                }
            }
            Event::MoveFinished { plan, result } => {
                match result {
                    Ok(()) => self.apply_move(&plan),
                    Err(e) => {
                        tracing::warn!(error = %e, "move failed");
                        self.set_status(StatusLevel::Error, e.to_string());
                    }
                }
                self.clamp_selection();
            }
            Event::FileOpened { path: file_path, result } => match result {
                Ok(file) => {
                    let content = if file.is_base64 {
                        format!("(binary file, {} bytes encoded)", file.content.len())
                    } else {
                        file.content
                    };
                    self.tabs.open(&file_path, content, file.mtime);
                    self.set_status(StatusLevel::Info, format!("Opened {}", file_path));
                }
                Err(e) => {
                    self.set_status(StatusLevel::Error, format!("Cannot open {}: {}", file_path, e))
                }
            },
        }
    }

    // ── Status & lifecycle ──────────────────────────────────────────────────

    pub fn set_status(&mut self, level: StatusLevel, text: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            level,
            created: Instant::now(),
        });
    }

    pub fn clear_expired_status(&mut self) {
        if self
            .status_message
            .as_ref()
            .is_some_and(|m| m.created.elapsed() > STATUS_TTL)
        {
            self.status_message = None;
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}
