use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;
use crate::tree::search::{SearchMode, SearchState};

/// One-line search input shown above the tree.
pub struct SearchBarWidget<'a> {
    state: &'a SearchState,
    theme: &'a ThemeColors,
    focused: bool,
    pending: bool,
}

impl<'a> SearchBarWidget<'a> {
    pub fn new(state: &'a SearchState, theme: &'a ThemeColors) -> Self {
        Self {
            state,
            theme,
            focused: false,
            pending: false,
        }
    }

    /// Draw a cursor at the end of the query.
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// A debounced search has not fired yet.
    pub fn pending(mut self, pending: bool) -> Self {
        self.pending = pending;
        self
    }

    fn status_text(&self) -> String {
        if !self.state.is_active() {
            return if self.focused {
                "Type to search...".to_string()
            } else {
                "/ to search".to_string()
            };
        }
        if self.pending {
            return "Searching...".to_string();
        }
        match self.state.overlay() {
            Some(hits) => format!(
                "{} result{}",
                hits.len(),
                if hits.len() == 1 { "" } else { "s" }
            ),
            None => "Searching...".to_string(),
        }
    }
}

impl<'a> Widget for SearchBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let mode_label = match self.state.mode() {
            SearchMode::Filename => " Name ",
            SearchMode::Content => " Text ",
        };
        let mode_style = Style::default()
            .bg(self.theme.accent_fg)
            .fg(self.theme.status_bg)
            .add_modifier(Modifier::BOLD);
        let prompt_style = Style::default()
            .fg(self.theme.accent_fg)
            .add_modifier(Modifier::BOLD);
        let input_style = Style::default().fg(self.theme.tree_fg);
        let cursor_style = Style::default()
            .bg(self.theme.tree_fg)
            .fg(self.theme.status_bg);
        let dim_style = Style::default().fg(self.theme.dim_fg);

        let mut spans = vec![
            Span::styled(mode_label, mode_style),
            Span::styled(" > ", prompt_style),
            Span::styled(self.state.query(), input_style),
        ];
        if self.focused {
            spans.push(Span::styled(" ", cursor_style));
        }
        spans.push(Span::styled(format!("  {}", self.status_text()), dim_style));

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;
    use std::collections::BTreeSet;

    fn render_to_string(widget: SearchBarWidget<'_>, width: u16) -> String {
        let area = Rect::new(0, 0, width, 1);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        (0..width)
            .map(|x| buf.cell((x, 0)).unwrap().symbol().to_string())
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    #[test]
    fn test_idle_hint() {
        let tc = theme::dark_theme();
        let state = SearchState::default();
        let line = render_to_string(SearchBarWidget::new(&state, &tc), 60);
        assert_eq!(line, " Name  >   / to search");
    }

    #[test]
    fn test_result_count() {
        let tc = theme::dark_theme();
        let mut state = SearchState::new(SearchMode::Content);
        let ticket = state.set_query("foo").unwrap();
        let hits: BTreeSet<String> = ["a.yaml".to_string()].into();
        assert!(state.apply(&ticket, Ok(hits)));
        let line = render_to_string(SearchBarWidget::new(&state, &tc).focused(true), 60);
        assert!(line.starts_with(" Text  > foo"));
        assert!(line.ends_with("1 result"));
    }

    #[test]
    fn test_pending_search() {
        let tc = theme::dark_theme();
        let mut state = SearchState::default();
        state.set_query("mai");
        let line = render_to_string(SearchBarWidget::new(&state, &tc).pending(true), 60);
        assert!(line.ends_with("Searching..."));
    }
}
