use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Widget},
};

use crate::app::{AppMode, DialogKind};
use crate::theme::ThemeColors;
use crate::tree::moves::MovePlan;
use crate::tree::path;

/// Centered modal overlay for the current dialog, if any.
pub struct DialogWidget<'a> {
    mode: &'a AppMode,
    theme: &'a ThemeColors,
}

impl<'a> DialogWidget<'a> {
    pub fn new(mode: &'a AppMode, theme: &'a ThemeColors) -> Self {
        Self { mode, theme }
    }

    fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        let w = width.min(area.width);
        let h = height.min(area.height);
        Rect::new(x, y, w, h)
    }
}

impl<'a> Widget for DialogWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if let AppMode::Dialog(DialogKind::ConfirmMove(plan)) = self.mode {
            render_move_dialog(plan, self.theme, area, buf);
        }
    }
}

fn render_move_dialog(plan: &MovePlan, theme: &ThemeColors, area: Rect, buf: &mut Buffer) {
    let question = plan.to_string();
    let sources = plan.sources();

    let max_name_len = sources
        .iter()
        .map(|s| path::file_name(s).chars().count())
        .chain(std::iter::once(question.chars().count()))
        .max()
        .unwrap_or(10);
    let dialog_width = (max_name_len as u16 + 8)
        .max(40)
        .min(area.width.saturating_sub(4));
    let dialog_height = (sources.len() as u16 + 6).min(area.height.saturating_sub(2));
    let rect = DialogWidget::centered_rect(dialog_width, dialog_height, area);

    Clear.render(rect, buf);

    let block = Block::default()
        .title(" Move ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.dialog_border_fg))
        .style(Style::default().bg(theme.dialog_bg))
        .padding(Padding::horizontal(1));

    let inner = block.inner(rect);
    block.render(rect, buf);

    if inner.height < 2 || inner.width == 0 {
        return;
    }

    let header = Line::from(Span::styled(
        question,
        Style::default()
            .fg(theme.warning_fg)
            .add_modifier(Modifier::BOLD),
    ));
    buf.set_line(inner.x, inner.y, &header, inner.width);

    let max_items = inner.height.saturating_sub(3) as usize;
    for (i, source) in sources.iter().take(max_items).enumerate() {
        let line = Line::from(Span::styled(
            format!("  • {}", source),
            Style::default().fg(theme.tree_fg),
        ));
        buf.set_line(inner.x, inner.y + 2 + i as u16, &line, inner.width);
    }

    let hint = Line::from(Span::styled(
        "[y] Yes  [n/Esc] Cancel",
        Style::default()
            .fg(theme.dim_fg)
            .add_modifier(Modifier::DIM),
    ));
    buf.set_line(inner.x, inner.y + inner.height - 1, &hint, inner.width);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;

    fn buffer_to_string(buf: &Buffer, area: Rect) -> String {
        let mut s = String::new();
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                s.push_str(buf.cell((x, y)).unwrap().symbol());
            }
            s.push('\n');
        }
        s
    }

    #[test]
    fn test_single_move_dialog_renders() {
        let tc = theme::dark_theme();
        let mode = AppMode::Dialog(DialogKind::ConfirmMove(MovePlan::Rename {
            source: "src/main.yaml".into(),
            destination: "main.yaml".into(),
        }));
        let area = Rect::new(0, 0, 60, 20);
        let mut buf = Buffer::empty(area);
        DialogWidget::new(&mode, &tc).render(area, &mut buf);

        let content = buffer_to_string(&buf, area);
        assert!(content.contains("Move 'main.yaml' to '/'?"));
        assert!(content.contains("src/main.yaml"));
        assert!(content.contains("[y] Yes"));
    }

    #[test]
    fn test_multi_move_dialog_lists_sources() {
        let tc = theme::dark_theme();
        let mode = AppMode::Dialog(DialogKind::ConfirmMove(MovePlan::MoveMulti {
            paths: vec!["a.yaml".into(), "b.yaml".into()],
            destination: "docs".into(),
        }));
        let area = Rect::new(0, 0, 60, 20);
        let mut buf = Buffer::empty(area);
        DialogWidget::new(&mode, &tc).render(area, &mut buf);

        let content = buffer_to_string(&buf, area);
        assert!(content.contains("Move 2 items to 'docs'?"));
        assert!(content.contains("a.yaml"));
        assert!(content.contains("b.yaml"));
    }

    #[test]
    fn test_no_dialog_mode_noop() {
        let tc = theme::dark_theme();
        let mode = AppMode::Normal;
        let area = Rect::new(0, 0, 40, 10);
        let mut buf = Buffer::empty(area);
        DialogWidget::new(&mode, &tc).render(area, &mut buf);
        assert_eq!(buffer_to_string(&buf, area).trim(), "");
    }
}
