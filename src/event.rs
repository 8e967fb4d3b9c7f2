use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use tokio::sync::mpsc;

use crate::error::{ApiError, LoadError, MoveError, Result, SearchError};
use crate::remote::types::{DirectorySnapshot, FileContent};
use crate::tree::moves::MovePlan;
use crate::tree::search::SearchTicket;

/// Application events: terminal input plus completions of backend requests
/// started by [`crate::app::App`].
#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    /// Periodic tick for redraws and status expiry.
    Tick,
    Resize(u16, u16),
    DirectoryLoaded {
        path: String,
        result: std::result::Result<Arc<DirectorySnapshot>, LoadError>,
    },
    /// Whole-tree prefetch finished (non-lazy mode).
    TreePrefetched(std::result::Result<usize, LoadError>),
    SearchFinished {
        ticket: SearchTicket,
        result: std::result::Result<BTreeSet<String>, SearchError>,
    },
    MoveFinished {
        plan: MovePlan,
        result: std::result::Result<(), MoveError>,
    },
    FileOpened {
        path: String,
        result: std::result::Result<FileContent, ApiError>,
    },
}

pub type EventSender = mpsc::UnboundedSender<Event>;

/// Polls crossterm on a blocking thread and forwards input through a channel
/// shared with the request tasks.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    tx: EventSender,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        tokio::task::spawn_blocking(move || loop {
            let event = if event::poll(tick_rate).unwrap_or(false) {
                match event::read() {
                    Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                        Event::Key(key)
                    }
                    Ok(CrosstermEvent::Resize(w, h)) => Event::Resize(w, h),
                    _ => continue,
                }
            } else {
                Event::Tick
            };
            if event_tx.send(event).is_err() {
                break;
            }
        });

        Self { rx, tx }
    }

    /// Sender for tasks that report back to the main loop.
    pub fn sender(&self) -> EventSender {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Result<Event> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| crate::error::AppError::Terminal("Event channel closed".into()))
    }
}
