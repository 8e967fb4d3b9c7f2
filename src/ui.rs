use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::{Block, Borders},
    Frame,
};

use crate::app::{App, AppMode};
use crate::components::breadcrumb::BreadcrumbWidget;
use crate::components::dialog::DialogWidget;
use crate::components::search::SearchBarWidget;
use crate::components::status_bar::StatusBarWidget;
use crate::components::tab_bar::TabBarWidget;
use crate::components::tree::TreeWidget;
use crate::remote::api::Backend;
use crate::tree::render::{format_bytes, RowKind, TreeMode};

/// Render the application UI.
pub fn render<B: Backend>(app: &mut App<B>, frame: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // breadcrumb
            Constraint::Length(1), // search bar
            Constraint::Min(3),    // tree
            Constraint::Length(1), // tabs
            Constraint::Length(1), // status bar
        ])
        .split(frame.area());

    // Keep the selection visible; 2 rows of border.
    let visible_height = chunks[2].height.saturating_sub(2) as usize;
    app.update_scroll(visible_height);

    let rows = app.rows();
    let theme = &app.theme;

    let crumbs = app.nav.breadcrumbs();
    frame.render_widget(BreadcrumbWidget::new(&crumbs, theme), chunks[0]);

    frame.render_widget(
        SearchBarWidget::new(&app.search, theme)
            .focused(app.mode == AppMode::Search)
            .pending(app.is_search_pending()),
        chunks[1],
    );

    let title = match app.tree_mode {
        TreeMode::Navigation => " Files ",
        TreeMode::Collapsible => " Tree ",
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_fg));
    frame.render_widget(
        TreeWidget::new(&rows, &app.marks, theme)
            .selected(app.selected, app.scroll_offset)
            .block(block),
        chunks[2],
    );

    frame.render_widget(TabBarWidget::new(&app.tabs, theme), chunks[3]);

    let selected = rows.get(app.selected);
    let path_str = match selected {
        Some(row) if row.is_file() || row.is_folder() => format!("/{}", row.path),
        _ => format!("/{}", app.nav.current()),
    };
    let item_info = match selected {
        Some(row) if row.kind == RowKind::File => row
            .size
            .map(|size| format_bytes(size, 1))
            .unwrap_or_default(),
        Some(row) if row.is_folder() => "Folder".to_string(),
        _ => String::new(),
    };
    let marks_info = match app.marks.len() {
        0 => String::new(),
        n => format!("{} marked", n),
    };
    let mut status = StatusBarWidget::new(&path_str, &item_info, theme).marks_info(&marks_info);
    if let Some(message) = &app.status_message {
        status = status.status_message(&message.text, message.level);
    }
    frame.render_widget(status, chunks[4]);

    if matches!(app.mode, AppMode::Dialog(_)) {
        frame.render_widget(DialogWidget::new(&app.mode, theme), frame.area());
    }
}
