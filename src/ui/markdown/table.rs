//! Pipe-table rendering. Collects cell text while the parser walks the
//! table, then lays out bordered rows with per-column alignment taken from
//! the separator row (which is consumed by the parser and never rendered).

use pulldown_cmark::Alignment;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::ui::theme::Theme;

pub(super) struct TableRenderer {
    alignments: Vec<Alignment>,
    rows: Vec<Vec<String>>,
    current_row: Vec<String>,
    current_cell: String,
    in_header: bool,
}

impl TableRenderer {
    pub(super) fn new(alignments: Vec<Alignment>) -> Self {
        Self {
            alignments,
            rows: Vec::new(),
            current_row: Vec::new(),
            current_cell: String::new(),
            in_header: false,
        }
    }

    pub(super) fn start_header(&mut self) {
        self.in_header = true;
    }

    pub(super) fn end_header(&mut self) {
        self.in_header = false;
        self.end_row();
    }

    pub(super) fn end_row(&mut self) {
        if !self.current_row.is_empty() {
            self.rows.push(std::mem::take(&mut self.current_row));
        }
    }

    pub(super) fn start_cell(&mut self) {
        self.current_cell.clear();
    }

    pub(super) fn end_cell(&mut self) {
        self.current_row
            .push(std::mem::take(&mut self.current_cell).trim().to_string());
    }

    pub(super) fn push_text(&mut self, text: &str) {
        self.current_cell.push_str(text);
    }

    pub(super) fn into_lines(self, theme: &Theme) -> Vec<Line<'static>> {
        if self.rows.is_empty() {
            return Vec::new();
        }

        let columns = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![1usize; columns];
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(UnicodeWidthStr::width(cell.as_str()));
            }
        }

        let mut lines = Vec::new();
        lines.push(self.border_line('┌', '┬', '┐', &widths, theme));

        for (row_index, row) in self.rows.iter().enumerate() {
            let mut spans = Vec::new();
            spans.push(Span::styled("│".to_string(), theme.table_border));
            for (col, width) in widths.iter().enumerate() {
                let cell = row.get(col).map(String::as_str).unwrap_or("");
                let alignment = self
                    .alignments
                    .get(col)
                    .copied()
                    .unwrap_or(Alignment::None);
                spans.push(Span::raw(format!(" {} ", pad_cell(cell, *width, alignment))));
                spans.push(Span::styled("│".to_string(), theme.table_border));
            }
            lines.push(Line::from(spans));

            if row_index == 0 && self.rows.len() > 1 {
                lines.push(self.border_line('├', '┼', '┤', &widths, theme));
            }
        }

        lines.push(self.border_line('└', '┴', '┘', &widths, theme));
        lines
    }

    fn border_line(
        &self,
        left: char,
        mid: char,
        right: char,
        widths: &[usize],
        theme: &Theme,
    ) -> Line<'static> {
        let mut text = String::new();
        text.push(left);
        for (i, width) in widths.iter().enumerate() {
            text.push_str(&"─".repeat(width + 2));
            if i < widths.len() - 1 {
                text.push(mid);
            }
        }
        text.push(right);
        Line::from(Span::styled(text, theme.table_border))
    }
}

fn pad_cell(cell: &str, width: usize, alignment: Alignment) -> String {
    let content_width = UnicodeWidthStr::width(cell);
    let fill = width.saturating_sub(content_width);
    match alignment {
        Alignment::Right => format!("{}{}", " ".repeat(fill), cell),
        Alignment::Center => {
            let left = fill / 2;
            format!("{}{}{}", " ".repeat(left), cell, " ".repeat(fill - left))
        }
        Alignment::None | Alignment::Left => format!("{}{}", cell, " ".repeat(fill)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_table(alignments: Vec<Alignment>, rows: &[&[&str]]) -> TableRenderer {
        let mut table = TableRenderer::new(alignments);
        table.start_header();
        for (i, row) in rows.iter().enumerate() {
            for cell in row.iter() {
                table.start_cell();
                table.push_text(cell);
                table.end_cell();
            }
            if i == 0 {
                table.end_header();
            } else {
                table.end_row();
            }
        }
        table
    }

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn header_and_body_rows_are_bordered() {
        let table = build_table(
            vec![Alignment::None, Alignment::None],
            &[&["a", "b"], &["1", "2"]],
        );
        let theme = Theme::default();
        let lines = table.into_lines(&theme);

        // Top border, header, separator, body, bottom border.
        assert_eq!(lines.len(), 5);
        assert!(line_text(&lines[0]).starts_with('┌'));
        assert!(line_text(&lines[1]).contains("a"));
        assert!(line_text(&lines[2]).starts_with('├'));
        assert!(line_text(&lines[3]).contains("1"));
        assert!(line_text(&lines[4]).starts_with('└'));
    }

    #[test]
    fn alignment_pads_cells_accordingly() {
        assert_eq!(pad_cell("x", 5, Alignment::Left), "x    ");
        assert_eq!(pad_cell("x", 5, Alignment::Right), "    x");
        assert_eq!(pad_cell("x", 5, Alignment::Center), "  x  ");
        assert_eq!(pad_cell("x", 5, Alignment::None), "x    ");
    }

    #[test]
    fn ragged_rows_are_padded_with_empty_cells() {
        let table = build_table(
            vec![Alignment::None, Alignment::None],
            &[&["a", "b"], &["only"]],
        );
        let theme = Theme::default();
        let lines = table.into_lines(&theme);
        let body = line_text(&lines[3]);
        assert!(body.contains("only"));
        assert_eq!(body.matches('│').count(), 3);
    }
}
