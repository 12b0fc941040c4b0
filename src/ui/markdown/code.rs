//! Code and math block rendering.

use ratatui::text::{Line, Span};

use crate::ui::theme::Theme;

/// Fenced blocks without a language tag get a generic label.
pub(super) fn language_label(hint: &str) -> &str {
    if hint.is_empty() {
        "text"
    } else {
        hint
    }
}

/// Render a fenced code block with a language header and stable per-line
/// numbering. Numbering restarts at 1 for every block.
pub(super) fn render_code_block(
    language: &str,
    code_lines: &[String],
    theme: &Theme,
) -> Vec<Line<'static>> {
    let mut lines = Vec::with_capacity(code_lines.len() + 1);
    lines.push(Line::from(Span::styled(
        format!("─ {} ─", language_label(language)),
        theme.code_language,
    )));
    for (index, code) in code_lines.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("{:>3} │ ", index + 1), theme.code_line_number),
            Span::styled(code.clone(), theme.code_text),
        ]));
    }
    lines
}

/// Braces must pair up for the math renderer; a close without an open or a
/// dangling open both count as unbalanced.
pub(super) fn balanced_braces(src: &str) -> bool {
    let mut depth: i64 = 0;
    let mut chars = src.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                // Escaped characters (including \{ and \}) are literal.
                chars.next();
            }
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Inline math either renders styled or degrades to the raw source followed
/// by a visible error annotation; it never aborts the surrounding render.
pub(super) fn inline_math_spans(src: &str, theme: &Theme) -> Vec<Span<'static>> {
    if balanced_braces(src) {
        vec![Span::styled(src.to_string(), theme.math_text)]
    } else {
        vec![
            Span::raw(src.to_string()),
            Span::styled(" [math error: unbalanced braces]", theme.math_error),
        ]
    }
}

pub(super) fn render_math_block(src: &str, theme: &Theme) -> Vec<Line<'static>> {
    src.lines()
        .map(|line| Line::from(inline_math_spans(line, theme)))
        .collect()
}
