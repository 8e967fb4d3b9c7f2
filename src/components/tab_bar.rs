use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::tabs::Tabs;
use crate::theme::ThemeColors;
use crate::tree::path;

/// Strip of open files; the active one is highlighted, unsaved ones carry a dot.
pub struct TabBarWidget<'a> {
    tabs: &'a Tabs,
    theme: &'a ThemeColors,
}

impl<'a> TabBarWidget<'a> {
    pub fn new(tabs: &'a Tabs, theme: &'a ThemeColors) -> Self {
        Self { tabs, theme }
    }
}

impl<'a> Widget for TabBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 || self.tabs.is_empty() {
            return;
        }

        let active = self.tabs.active_path();
        let mut spans = Vec::new();
        for tab in self.tabs.iter() {
            let dot = if tab.modified { " ●" } else { "" };
            let style = if active == Some(tab.path.as_str()) {
                Style::default()
                    .bg(self.theme.tree_selected_bg)
                    .fg(self.theme.tree_selected_fg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.dim_fg)
            };
            spans.push(Span::styled(
                format!(" {}{} ", path::file_name(&tab.path), dot),
                style,
            ));
            spans.push(Span::raw(" "));
        }
        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;

    #[test]
    fn test_tabs_render_with_active_and_modified() {
        let tc = theme::dark_theme();
        let mut tabs = Tabs::new();
        tabs.open("a/one.yaml", "x".into(), None);
        tabs.open("two.yaml", "y".into(), None);
        tabs.edit("a/one.yaml", "changed".into());

        let area = Rect::new(0, 0, 40, 1);
        let mut buf = Buffer::empty(area);
        TabBarWidget::new(&tabs, &tc).render(area, &mut buf);
        let content: String = (0..40)
            .map(|x| buf.cell((x, 0)).unwrap().symbol().to_string())
            .collect();
        assert_eq!(content.trim_end(), " one.yaml ●   two.yaml");
        // The last opened tab is active.
        assert_eq!(buf.cell((14, 0)).unwrap().bg, tc.tree_selected_bg);
    }

    #[test]
    fn test_no_tabs_renders_nothing() {
        let tc = theme::dark_theme();
        let tabs = Tabs::new();
        let area = Rect::new(0, 0, 20, 1);
        let mut buf = Buffer::empty(area);
        TabBarWidget::new(&tabs, &tc).render(area, &mut buf);
        assert_eq!(buf.cell((0, 0)).unwrap().symbol(), " ");
    }
}
