use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::app::StatusLevel;
use crate::theme::ThemeColors;

const KEY_HINTS: &str = " /:search  x:mark  m:move  t:tree  q:quit ";

/// Keep the last `max` characters, prefixed with `...` when cut.
fn truncate_left(text: &str, max: usize) -> String {
    let len = text.chars().count();
    if len <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }
    let tail: String = text.chars().skip(len - (max - 3)).collect();
    format!("...{}", tail)
}

/// Status bar: selected path, item info and key hints, or a transient
/// status message.
pub struct StatusBarWidget<'a> {
    path_str: &'a str,
    item_info: &'a str,
    theme: &'a ThemeColors,
    status_message: Option<(&'a str, StatusLevel)>,
    marks_info: Option<&'a str>,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(path_str: &'a str, item_info: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            path_str,
            item_info,
            theme,
            status_message: None,
            marks_info: None,
        }
    }

    pub fn status_message(mut self, msg: &'a str, level: StatusLevel) -> Self {
        self.status_message = Some((msg, level));
        self
    }

    pub fn marks_info(mut self, info: &'a str) -> Self {
        self.marks_info = Some(info);
        self
    }
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;

        if let Some((msg, level)) = self.status_message {
            let style = match level {
                StatusLevel::Error => Style::default()
                    .bg(self.theme.error_fg)
                    .fg(self.theme.status_fg),
                StatusLevel::Warning => Style::default()
                    .fg(self.theme.warning_fg)
                    .add_modifier(Modifier::BOLD),
                StatusLevel::Info => Style::default().fg(self.theme.success_fg),
            };
            let display: String = msg.chars().take(width).collect();
            let display = format!("{:<width$}", display, width = width);
            buf.set_line(area.x, area.y, &Line::from(Span::styled(display, style)), area.width);
            return;
        }

        // [path] [info] [marks] [hints]
        let hints_len = KEY_HINTS.len();
        let remaining = width.saturating_sub(hints_len);
        let info_len = self.item_info.chars().count();
        let path_budget = remaining.saturating_sub(info_len).saturating_sub(1);
        let path_display = truncate_left(self.path_str, path_budget);

        let info_budget = remaining.saturating_sub(path_display.chars().count());
        let info_display: String = self.item_info.chars().take(info_budget).collect();

        let gap = remaining
            .saturating_sub(path_display.chars().count())
            .saturating_sub(info_display.chars().count());

        let mut spans = vec![
            Span::styled(path_display, Style::default().fg(self.theme.status_fg)),
            Span::raw(" ".repeat(gap)),
            Span::styled(info_display, Style::default().fg(self.theme.info_fg)),
        ];

        if let Some(marks) = self.marks_info.filter(|m| !m.is_empty()) {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                marks.to_string(),
                Style::default()
                    .fg(self.theme.accent_fg)
                    .add_modifier(Modifier::BOLD),
            ));
        }

        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let pad = width.saturating_sub(used).saturating_sub(hints_len);
        if pad > 0 {
            spans.push(Span::raw(" ".repeat(pad)));
        }
        spans.push(Span::styled(
            KEY_HINTS,
            Style::default()
                .fg(self.theme.dim_fg)
                .add_modifier(Modifier::DIM),
        ));

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}
