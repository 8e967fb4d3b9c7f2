//! Configuration: TOML files, CLI overrides and built-in defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--url`, `--token`, `--tree`, ...)
//! 2. `--config <file>`
//! 3. `$BPX_CONFIG` environment variable (path to config file)
//! 4. Project-local `.bpx.toml` in the current working directory
//! 5. Global `~/.config/bpx/config.toml`
//! 6. Built-in defaults

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::remote::api::TokenSource;
use crate::tree::path;
use crate::tree::render::TreeMode;
use crate::tree::search::SearchMode;

// ── Section configs ──────────────────────────────────────────────────────────

/// Where the Blueprint Studio API lives and how to authenticate.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL, e.g. `http://homeassistant.local:8123`.
    pub url: Option<String>,
    /// API path below the base URL.
    pub endpoint: Option<String>,
    /// Long-lived access token.
    pub token: Option<String>,
    /// File holding the token; re-read when the backend answers 401.
    pub token_file: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TreeConfig {
    /// "navigation" (one folder at a time) or "collapsible".
    pub mode: Option<TreeMode>,
    pub show_hidden: Option<bool>,
    /// Fetch folders on demand instead of the whole tree up front.
    pub lazy_loading: Option<bool>,
    /// Pinned paths.
    pub favorites: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SearchConfig {
    /// "filename" or "content".
    pub mode: Option<SearchMode>,
    pub filename_debounce_ms: Option<u64>,
    pub content_debounce_ms: Option<u64>,
    pub case_sensitive: Option<bool>,
    pub use_regex: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LogConfig {
    pub file: Option<PathBuf>,
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    pub level: Option<String>,
}

/// Color overrides for the "custom" scheme. Values are `#rrggbb`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeColorsConfig {
    pub tree_fg: Option<String>,
    pub tree_selected_bg: Option<String>,
    pub tree_selected_fg: Option<String>,
    pub tree_dir_fg: Option<String>,
    pub tree_file_fg: Option<String>,
    pub breadcrumb_fg: Option<String>,
    pub status_bg: Option<String>,
    pub status_fg: Option<String>,
    pub border_fg: Option<String>,
    pub dialog_bg: Option<String>,
    pub dialog_border_fg: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// "dark", "light" or "custom".
    pub scheme: Option<String>,
    pub custom: Option<ThemeColorsConfig>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// All fields are optional so partial configs from different sources can be
/// layered with [`AppConfig::merge`].
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub tree: TreeConfig,
    pub search: SearchConfig,
    pub log: LogConfig,
    pub theme: ThemeConfig,
}

pub const DEFAULT_ENDPOINT: &str = "/api/blueprint_studio";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_FILENAME_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_CONTENT_DEBOUNCE_MS: u64 = 500;

// ── Config file locator ──────────────────────────────────────────────────────

/// Candidate config files, highest priority first. `--config` is handled
/// separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(env_path) = std::env::var("BPX_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".bpx.toml"));
    }
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("bpx").join("config.toml"));
    }
    paths
}

/// Read and parse one config file. Missing files are skipped silently;
/// unparsable ones with a warning on stderr (logging is not up yet).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprintln!(
                "Warning: ignoring config file {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Layer `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            server: ServerConfig {
                url: other.server.url.clone().or(self.server.url),
                endpoint: other.server.endpoint.clone().or(self.server.endpoint),
                token: other.server.token.clone().or(self.server.token),
                token_file: other.server.token_file.clone().or(self.server.token_file),
                timeout_secs: other.server.timeout_secs.or(self.server.timeout_secs),
            },
            tree: TreeConfig {
                mode: other.tree.mode.or(self.tree.mode),
                show_hidden: other.tree.show_hidden.or(self.tree.show_hidden),
                lazy_loading: other.tree.lazy_loading.or(self.tree.lazy_loading),
                favorites: other.tree.favorites.clone().or(self.tree.favorites),
            },
            search: SearchConfig {
                mode: other.search.mode.or(self.search.mode),
                filename_debounce_ms: other
                    .search
                    .filename_debounce_ms
                    .or(self.search.filename_debounce_ms),
                content_debounce_ms: other
                    .search
                    .content_debounce_ms
                    .or(self.search.content_debounce_ms),
                case_sensitive: other.search.case_sensitive.or(self.search.case_sensitive),
                use_regex: other.search.use_regex.or(self.search.use_regex),
            },
            log: LogConfig {
                file: other.log.file.clone().or(self.log.file),
                level: other.log.level.clone().or(self.log.level),
            },
            theme: ThemeConfig {
                scheme: other.theme.scheme.clone().or(self.theme.scheme),
                custom: other.theme.custom.clone().or(self.theme.custom),
            },
        }
    }

    /// Load the final merged configuration.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Lowest priority first so higher layers overwrite.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }
        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }
        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }
        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    pub fn server_url(&self) -> Option<&str> {
        self.server.url.as_deref().filter(|u| !u.trim().is_empty())
    }

    pub fn endpoint(&self) -> &str {
        self.server.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    /// An inline token beats a token file.
    pub fn token_source(&self) -> TokenSource {
        match (&self.server.token, &self.server.token_file) {
            (Some(token), _) if !token.trim().is_empty() => TokenSource::Static(token.trim().to_string()),
            (_, Some(file)) => TokenSource::File(file.clone()),
            _ => TokenSource::None,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS).max(1))
    }

    pub fn tree_mode(&self) -> TreeMode {
        self.tree.mode.unwrap_or_default()
    }

    pub fn show_hidden(&self) -> bool {
        self.tree.show_hidden.unwrap_or(false)
    }

    pub fn lazy_loading(&self) -> bool {
        self.tree.lazy_loading.unwrap_or(true)
    }

    pub fn favorites(&self) -> BTreeSet<String> {
        self.tree
            .favorites
            .iter()
            .flatten()
            .map(|p| path::normalize(p))
            .filter(|p| !p.is_empty())
            .collect()
    }

    pub fn search_mode(&self) -> SearchMode {
        self.search.mode.unwrap_or_default()
    }

    pub fn filename_debounce(&self) -> Duration {
        Duration::from_millis(
            self.search
                .filename_debounce_ms
                .unwrap_or(DEFAULT_FILENAME_DEBOUNCE_MS),
        )
    }

    pub fn content_debounce(&self) -> Duration {
        Duration::from_millis(
            self.search
                .content_debounce_ms
                .unwrap_or(DEFAULT_CONTENT_DEBOUNCE_MS),
        )
    }

    pub fn case_sensitive(&self) -> bool {
        self.search.case_sensitive.unwrap_or(false)
    }

    pub fn use_regex(&self) -> bool {
        self.search.use_regex.unwrap_or(false)
    }

    /// Log file path; defaults to `<cache dir>/bpx/bpx.log`.
    pub fn log_file(&self) -> Option<PathBuf> {
        self.log
            .file
            .clone()
            .or_else(|| dirs::cache_dir().map(|d| d.join("bpx").join("bpx.log")))
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or("info")
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
