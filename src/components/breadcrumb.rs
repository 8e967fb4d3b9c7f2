use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;
use crate::tree::nav::Breadcrumb;

/// `Home / a / b` trail for navigation mode. Crumbs are numbered so digit
/// keys can jump to them.
pub struct BreadcrumbWidget<'a> {
    crumbs: &'a [Breadcrumb],
    theme: &'a ThemeColors,
}

impl<'a> BreadcrumbWidget<'a> {
    pub fn new(crumbs: &'a [Breadcrumb], theme: &'a ThemeColors) -> Self {
        Self { crumbs, theme }
    }
}

impl<'a> Widget for BreadcrumbWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let sep_style = Style::default().fg(self.theme.dim_fg);
        let mut spans = vec![Span::raw(" ")];
        for (i, crumb) in self.crumbs.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" / ", sep_style));
            }
            if i < 10 {
                spans.push(Span::styled(format!("{}:", i), sep_style));
            }
            let style = if crumb.is_current {
                Style::default()
                    .fg(self.theme.accent_fg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.breadcrumb_fg)
            };
            spans.push(Span::styled(crumb.label.clone(), style));
        }

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;
    use crate::tree::nav::Navigation;

    fn render_to_string(crumbs: &[Breadcrumb], width: u16) -> (String, Buffer) {
        let tc = theme::dark_theme();
        let area = Rect::new(0, 0, width, 1);
        let mut buf = Buffer::empty(area);
        BreadcrumbWidget::new(crumbs, &tc).render(area, &mut buf);
        let line = (0..width)
            .map(|x| buf.cell((x, 0)).unwrap().symbol().to_string())
            .collect::<String>();
        (line.trim_end().to_string(), buf)
    }

    #[test]
    fn test_home_only() {
        let crumbs = Navigation::new().breadcrumbs();
        let (line, _) = render_to_string(&crumbs, 30);
        assert_eq!(line, " 0:Home");
    }

    #[test]
    fn test_nested_trail_highlights_current() {
        let mut nav = Navigation::new();
        nav.navigate_into("blueprints/automation");
        let (line, buf) = render_to_string(&nav.breadcrumbs(), 60);
        assert_eq!(line, " 0:Home / 1:blueprints / 2:automation");

        let tc = theme::dark_theme();
        let last = line.chars().count() as u16 - 1;
        assert_eq!(buf.cell((last, 0)).unwrap().fg, tc.accent_fg);
        assert_eq!(buf.cell((3, 0)).unwrap().fg, tc.breadcrumb_fg);
    }

    #[test]
    fn test_zero_area_does_not_panic() {
        let tc = theme::dark_theme();
        let crumbs = Navigation::new().breadcrumbs();
        let area = Rect::new(0, 0, 0, 0);
        let mut buf = Buffer::empty(area);
        BreadcrumbWidget::new(&crumbs, &tc).render(area, &mut buf);
    }
}
