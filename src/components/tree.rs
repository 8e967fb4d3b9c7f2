use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::theme::ThemeColors;
use crate::tree::moves::Marks;
use crate::tree::render::{format_bytes, DisplayRow, RowKind, Symlink};

/// Renders the rows produced by [`crate::tree::render::render_rows`].
pub struct TreeWidget<'a> {
    rows: &'a [DisplayRow],
    selected: usize,
    scroll: usize,
    marks: &'a Marks,
    theme: &'a ThemeColors,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(rows: &'a [DisplayRow], marks: &'a Marks, theme: &'a ThemeColors) -> Self {
        Self {
            rows,
            selected: 0,
            scroll: 0,
            marks,
            theme,
            block: None,
        }
    }

    pub fn selected(mut self, selected: usize, scroll: usize) -> Self {
        self.selected = selected;
        self.scroll = scroll;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// A row is the last of its siblings when no later row sits at the same
    /// depth before the listing climbs back out.
    fn is_last_sibling(rows: &[DisplayRow], index: usize) -> bool {
        let depth = rows[index].depth;
        for row in &rows[index + 1..] {
            if row.depth == depth {
                return false;
            }
            if row.depth < depth {
                return true;
            }
        }
        true
    }

    /// Box-drawing indentation for nested rows.
    fn build_prefix(rows: &[DisplayRow], index: usize) -> String {
        let depth = rows[index].depth;
        if depth == 0 {
            return String::new();
        }

        let mut parts: Vec<&str> = Vec::new();
        for d in 1..depth {
            // Walk back to the ancestor at depth d.
            let ancestor = (0..index).rev().find(|&j| rows[j].depth == d);
            let ancestor_is_last = ancestor.is_some_and(|j| Self::is_last_sibling(rows, j));
            parts.push(if ancestor_is_last { "   " } else { "│  " });
        }
        parts.push(if Self::is_last_sibling(rows, index) {
            "└──"
        } else {
            "├──"
        });
        parts.join("")
    }

    fn indicator(row: &DisplayRow) -> &'static str {
        match row.kind {
            RowKind::Folder { expanded: true } => "▾ ",
            RowKind::Folder { expanded: false } => "▸ ",
            RowKind::File => "  ",
            RowKind::Loading | RowKind::Empty => "",
        }
    }

    /// Trailing badges: size, link target, pin and unsaved markers.
    fn suffix(row: &DisplayRow) -> String {
        let mut parts = Vec::new();
        if let Some(size) = row.size {
            parts.push(format_bytes(size, 1));
        }
        match &row.symlink {
            Some(Symlink::Valid(target)) => parts.push(format!("→ {}", target)),
            Some(Symlink::Broken) => parts.push("(broken link)".to_string()),
            None => {}
        }
        if row.pinned {
            parts.push("★".to_string());
        }
        if row.modified {
            parts.push("●".to_string());
        }
        parts.join("  ")
    }

    fn row_style(&self, row: &DisplayRow, is_selected: bool, is_marked: bool) -> Style {
        if is_selected {
            Style::default()
                .bg(self.theme.tree_selected_bg)
                .fg(self.theme.tree_selected_fg)
                .add_modifier(Modifier::BOLD)
        } else if is_marked {
            Style::default()
                .fg(self.theme.accent_fg)
                .add_modifier(Modifier::BOLD)
        } else {
            match row.kind {
                RowKind::Folder { .. } => Style::default()
                    .fg(self.theme.tree_dir_fg)
                    .add_modifier(Modifier::BOLD),
                RowKind::File if row.symlink == Some(Symlink::Broken) => {
                    Style::default().fg(self.theme.error_fg)
                }
                RowKind::File if row.active => Style::default()
                    .fg(self.theme.tree_file_fg)
                    .add_modifier(Modifier::UNDERLINED),
                RowKind::File => Style::default().fg(self.theme.tree_file_fg),
                RowKind::Loading | RowKind::Empty => Style::default()
                    .fg(self.theme.dim_fg)
                    .add_modifier(Modifier::ITALIC),
            }
        }
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let visible_height = inner_area.height as usize;
        if self.rows.is_empty() || visible_height == 0 {
            return;
        }

        let visible = self
            .rows
            .iter()
            .enumerate()
            .skip(self.scroll)
            .take(visible_height);

        for (i, (idx, row)) in visible.enumerate() {
            let y = inner_area.y + i as u16;
            let is_selected = idx == self.selected;
            let is_marked = self.marks.contains(&row.path)
                && matches!(row.kind, RowKind::File | RowKind::Folder { .. });

            let style = self.row_style(row, is_selected, is_marked);
            let marker = if is_marked { "● " } else { "" };
            let label = format!(
                "{}{}{}{}",
                Self::build_prefix(self.rows, idx),
                marker,
                Self::indicator(row),
                row.name
            );

            let mut spans = vec![Span::styled(label, style)];
            let suffix = Self::suffix(row);
            if !suffix.is_empty() {
                spans.push(Span::styled(
                    format!("  {}", suffix),
                    Style::default().fg(self.theme.dim_fg),
                ));
            }
            buf.set_line(inner_area.x, y, &Line::from(spans), inner_area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;

    fn row(kind: RowKind, path: &str, depth: usize) -> DisplayRow {
        DisplayRow {
            kind,
            path: path.to_string(),
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            depth,
            size: None,
            symlink: None,
            pinned: false,
            modified: false,
            active: false,
        }
    }

    fn folder(path: &str, depth: usize, expanded: bool) -> DisplayRow {
        row(RowKind::Folder { expanded }, path, depth)
    }

    fn file(path: &str, depth: usize) -> DisplayRow {
        row(RowKind::File, path, depth)
    }

    fn render_lines(rows: &[DisplayRow], marks: &Marks, selected: usize) -> (Vec<String>, Buffer) {
        let tc = theme::dark_theme();
        let area = Rect::new(0, 0, 40, rows.len() as u16);
        let mut buf = Buffer::empty(area);
        TreeWidget::new(rows, marks, &tc)
            .selected(selected, 0)
            .render(area, &mut buf);
        let lines = (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf.cell((x, y)).unwrap().symbol().to_string())
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect();
        (lines, buf)
    }

    #[test]
    fn test_nested_rows_get_box_drawing() {
        let rows = vec![
            folder("a", 0, true),
            folder("a/b", 1, true),
            file("a/b/x.yaml", 2),
            file("a/y.yaml", 1),
            folder("c", 0, false),
        ];
        let (lines, _) = render_lines(&rows, &Marks::new(), 99);
        assert_eq!(lines[0], "▾ a");
        assert_eq!(lines[1], "├──▾ b");
        assert_eq!(lines[2], "│  └──  x.yaml");
        assert_eq!(lines[3], "└──  y.yaml");
        assert_eq!(lines[4], "▸ c");
    }

    #[test]
    fn test_badges_rendered() {
        let mut r = file("a.yaml", 0);
        r.size = Some(2048);
        r.pinned = true;
        r.modified = true;
        let mut link = file("l.yaml", 0);
        link.symlink = Some(Symlink::Broken);
        let (lines, _) = render_lines(&[r, link], &Marks::new(), 99);
        assert_eq!(lines[0], "  a.yaml  2 KB  ★  ●");
        assert!(lines[1].contains("(broken link)"));
    }

    #[test]
    fn test_selected_and_marked_styles() {
        let tc = theme::dark_theme();
        let rows = vec![file("a.yaml", 0), file("b.yaml", 0)];
        let mut marks = Marks::new();
        marks.toggle("b.yaml");
        let (lines, buf) = render_lines(&rows, &marks, 0);
        assert_eq!(buf.cell((0, 0)).unwrap().bg, tc.tree_selected_bg);
        assert!(lines[1].starts_with("● "));
        assert_eq!(buf.cell((0, 1)).unwrap().fg, tc.accent_fg);
    }

    #[test]
    fn test_placeholder_row() {
        let mut empty = row(RowKind::Empty, "", 0);
        empty.name = "No results".into();
        let (lines, _) = render_lines(&[empty], &Marks::new(), 99);
        assert_eq!(lines[0], "No results");
    }

    #[test]
    fn test_scroll_skips_rows() {
        let tc = theme::dark_theme();
        let rows: Vec<_> = (0..5).map(|i| file(&format!("f{}", i), 0)).collect();
        let marks = Marks::new();
        let area = Rect::new(0, 0, 20, 2);
        let mut buf = Buffer::empty(area);
        TreeWidget::new(&rows, &marks, &tc)
            .selected(3, 3)
            .render(area, &mut buf);
        let first: String = (0..20)
            .map(|x| buf.cell((x, 0)).unwrap().symbol().to_string())
            .collect();
        assert!(first.contains("f3"));
    }

    #[test]
    fn test_zero_area_does_not_panic() {
        let tc = theme::dark_theme();
        let rows = vec![file("a", 0)];
        let marks = Marks::new();
        let area = Rect::new(0, 0, 0, 0);
        let mut buf = Buffer::empty(area);
        TreeWidget::new(&rows, &marks, &tc).render(area, &mut buf);
    }
}
