mod app;
mod components;
mod config;
mod debounce;
mod error;
mod event;
mod handler;
mod remote;
mod tabs;
mod theme;
mod tree;
mod tui;
mod ui;

use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::config::{AppConfig, SearchConfig, ServerConfig, TreeConfig};
use crate::error::AppError;
use crate::event::{Event, EventHandler};
use crate::remote::api::{Credentials, HttpBackend};
use crate::tree::render::TreeMode;
use crate::tree::search::SearchMode;
use crate::tui::{install_panic_hook, Tui};

/// Browse a remote Blueprint Studio workspace from the terminal.
#[derive(Parser, Debug)]
#[command(name = "bpx", version, about)]
struct Cli {
    /// Folder to open, relative to the workspace root
    start: Option<String>,

    /// Home Assistant base URL, e.g. http://homeassistant.local:8123
    #[arg(long)]
    url: Option<String>,

    /// Long-lived access token
    #[arg(long, env = "BPX_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Config file to use on top of the default locations
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start in collapsible tree mode
    #[arg(long)]
    tree: bool,

    /// Start in content search mode
    #[arg(long)]
    content_search: bool,

    /// Show hidden files and folders
    #[arg(long)]
    show_hidden: bool,
}

impl Cli {
    /// Flags as a config layer; unset flags stay `None`.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            server: ServerConfig {
                url: self.url.clone(),
                token: self.token.clone(),
                ..Default::default()
            },
            tree: TreeConfig {
                mode: self.tree.then_some(TreeMode::Collapsible),
                show_hidden: self.show_hidden.then_some(true),
                ..Default::default()
            },
            search: SearchConfig {
                mode: self.content_search.then_some(SearchMode::Content),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Send `tracing` output to the log file; the terminal belongs to the UI.
fn init_logging(config: &AppConfig) -> error::Result<()> {
    let Some(path) = config.log_file() else {
        return Ok(());
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = File::options().create(true).append(true).open(&path)?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level()))
        .map_err(|e| AppError::Config(format!("invalid log level: {}", e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| AppError::Config(format!("cannot initialize logging: {}", e)))
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));
    init_logging(&config)?;

    let url = config.server_url().ok_or_else(|| {
        AppError::Config("no server URL; pass --url or set server.url in the config".into())
    })?;
    let backend = HttpBackend::new(
        url,
        config.endpoint(),
        Credentials::new(config.token_source()),
        config.request_timeout(),
    )?;
    tracing::info!(endpoint = %backend.endpoint(), "starting");

    install_panic_hook();

    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(Duration::from_millis(250));
    let mut app = App::new(Arc::new(backend), events.sender(), &config);
    app.start(cli.start.as_deref());

    loop {
        tui.terminal_mut().draw(|frame| {
            ui::render(&mut app, frame);
        })?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key),
            other => app.handle_event(other),
        }

        if app.should_quit {
            break;
        }
    }

    tui.restore()?;
    tracing::info!("exiting");
    Ok(())
}
