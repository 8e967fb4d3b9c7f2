use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, AppMode};
use crate::remote::api::Backend;

/// Handle a key event.
pub fn handle_key_event<B: Backend>(app: &mut App<B>, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    match app.mode {
        AppMode::Dialog(_) => handle_dialog_key(app, key),
        AppMode::Search => handle_search_key(app, key),
        AppMode::Normal => handle_normal_key(app, key),
    }
}

fn handle_dialog_key<B: Backend>(app: &mut App<B>, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => app.confirm_dialog(),
        KeyCode::Char('n') | KeyCode::Esc => app.cancel_dialog(),
        _ => {}
    }
}

fn handle_search_key<B: Backend>(app: &mut App<B>, key: KeyEvent) {
    match key.code {
        KeyCode::Char('f') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.toggle_search_mode()
        }
        KeyCode::Esc => {
            app.clear_search();
            app.mode = AppMode::Normal;
        }
        // Keep the results and return to the tree.
        KeyCode::Enter | KeyCode::Down | KeyCode::Tab => app.mode = AppMode::Normal,
        KeyCode::Backspace => app.search_pop_char(),
        KeyCode::Char(c) => app.search_push_char(c),
        _ => {}
    }
}

fn handle_normal_key<B: Backend>(app: &mut App<B>, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
        KeyCode::Home => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => app.activate_selected(),
        KeyCode::Backspace | KeyCode::Char('h') | KeyCode::Left => app.back_or_collapse(),
        KeyCode::Char('f') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.toggle_search_mode()
        }
        KeyCode::Char('/') => app.mode = AppMode::Search,
        KeyCode::Esc if app.search.is_active() => app.clear_search(),
        KeyCode::Esc => app.marks.clear(),
        KeyCode::Char('t') => app.toggle_tree_mode(),
        KeyCode::Char('.') => app.toggle_hidden(),
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('p') => app.toggle_favorite(),
        KeyCode::Char('x') | KeyCode::Char(' ') => app.toggle_mark(),
        KeyCode::Char('m') => app.request_move(),
        KeyCode::Char('w') => app.close_active_tab(),
        KeyCode::Char('g') => app.navigate_to_breadcrumb(""),
        KeyCode::Char('u') => app.navigate_up(),
        KeyCode::Char('c') => app.collapse_all(),
        KeyCode::Char(d) if d.is_ascii_digit() => {
            app.breadcrumb_jump(d.to_digit(10).unwrap_or(0) as usize)
        }
        _ => {}
    }
}
