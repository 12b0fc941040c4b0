//! Conversion of message text into a structured display tree of themed
//! ratatui lines. The renderer is a pure function over the text: it is
//! called on partial content while a response streams (best effort) and
//! again on the final content for the finished result.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use ratatui::style::Style;
use ratatui::text::{Line, Span};

use super::code;
use super::segments::{split_reasoning, Segment};
use super::table::TableRenderer;
use crate::core::message::{Message, Role};
use crate::ui::theme::Theme;

/// Render one transcript message into display lines, including a trailing
/// blank spacer line.
pub fn render_message(message: &Message, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = match message.role {
        Role::User => user_lines(&message.content, theme),
        Role::System => message
            .content
            .lines()
            .map(|l| Line::from(Span::styled(l.to_string(), theme.system_text)))
            .collect(),
        Role::Assistant => assistant_lines(&message.content, theme),
    };
    lines.push(Line::from(""));
    lines
}

fn user_lines(content: &str, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (index, text) in content.lines().enumerate() {
        if index == 0 {
            lines.push(Line::from(vec![
                Span::styled("You: ", theme.user_prefix),
                Span::styled(text.to_string(), theme.user_text),
            ]));
        } else {
            lines.push(Line::from(Span::styled(text.to_string(), theme.user_text)));
        }
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled("You: ", theme.user_prefix)));
    }
    lines
}

fn assistant_lines(content: &str, theme: &Theme) -> Vec<Line<'static>> {
    if content.starts_with("⚠️") {
        return content
            .lines()
            .map(|l| Line::from(Span::styled(l.to_string(), theme.error_text)))
            .collect();
    }

    let mut lines = Vec::new();
    for segment in split_reasoning(content) {
        match segment {
            Segment::Reasoning(body) => {
                for (index, text) in body.trim().lines().enumerate() {
                    let prefix = if index == 0 { "Thinking: " } else { "          " };
                    lines.push(Line::from(vec![
                        Span::styled(prefix.to_string(), theme.reasoning_text),
                        Span::styled(text.to_string(), theme.reasoning_text),
                    ]));
                }
            }
            Segment::Normal(text) => {
                lines.extend(markdown_lines(&text, theme));
            }
        }
    }
    lines
}

/// If the text carries an odd number of inline backticks outside fenced
/// regions, the last span is unterminated; close it at end-of-string so the
/// parser treats it as inline code instead of literal text.
fn close_unterminated_inline_code(text: &str) -> String {
    let mut in_fence = false;
    let mut backticks = 0usize;
    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if !in_fence {
            backticks += line.matches('`').count();
        }
    }
    if backticks % 2 == 1 {
        let mut closed = text.to_string();
        closed.push('`');
        closed
    } else {
        text.to_string()
    }
}

struct ListLevel {
    number: Option<u64>,
}

/// Convert markdown-like text to display lines. Recognizes fenced code
/// blocks (with per-line numbering), fenced and inline math, pipe tables
/// with an alignment row, inline code, nested lists, and paragraphs.
/// Unterminated constructs in a partial string render best effort.
pub fn markdown_lines(text: &str, theme: &Theme) -> Vec<Line<'static>> {
    let text = close_unterminated_inline_code(text);

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_MATH);
    let parser = Parser::new_ext(&text, options);

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut bold = false;
    let mut italic = false;
    let mut list_stack: Vec<ListLevel> = Vec::new();
    let mut code_block: Option<(String, String)> = None;
    let mut table: Option<TableRenderer> = None;

    let flush =
        |lines: &mut Vec<Line<'static>>, current: &mut Vec<Span<'static>>| {
            if !current.is_empty() {
                lines.push(Line::from(std::mem::take(current)));
            }
        };

    for event in parser {
        match event {
            Event::Start(Tag::Paragraph) => {}
            Event::End(TagEnd::Paragraph) => {
                flush(&mut lines, &mut current);
                if list_stack.is_empty() {
                    lines.push(Line::from(""));
                }
            }
            Event::Start(Tag::Heading { .. }) => {
                flush(&mut lines, &mut current);
                bold = true;
            }
            Event::End(TagEnd::Heading(_)) => {
                flush(&mut lines, &mut current);
                lines.push(Line::from(""));
                bold = false;
            }
            Event::Start(Tag::BlockQuote(_)) => {
                italic = true;
            }
            Event::End(TagEnd::BlockQuote(_)) => {
                flush(&mut lines, &mut current);
                italic = false;
            }
            Event::Start(Tag::List(start)) => {
                flush(&mut lines, &mut current);
                list_stack.push(ListLevel { number: start });
            }
            Event::End(TagEnd::List(_)) => {
                list_stack.pop();
                if list_stack.is_empty() {
                    lines.push(Line::from(""));
                }
            }
            Event::Start(Tag::Item) => {
                flush(&mut lines, &mut current);
                let depth = list_stack.len().saturating_sub(1);
                let marker = match list_stack.last_mut().and_then(|l| l.number.as_mut()) {
                    Some(number) => {
                        let marker = format!("{number}. ");
                        *number += 1;
                        marker
                    }
                    None => "• ".to_string(),
                };
                current.push(Span::raw("  ".repeat(depth)));
                current.push(Span::styled(marker, theme.list_marker));
            }
            Event::End(TagEnd::Item) => {
                flush(&mut lines, &mut current);
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                flush(&mut lines, &mut current);
                let language = match kind {
                    CodeBlockKind::Indented => String::new(),
                    CodeBlockKind::Fenced(info) => info
                        .split_ascii_whitespace()
                        .next()
                        .unwrap_or("")
                        .to_string(),
                };
                code_block = Some((language, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((language, buffer)) = code_block.take() {
                    if language == "math" {
                        lines.extend(code::render_math_block(&buffer, theme));
                    } else {
                        let code_lines: Vec<String> =
                            buffer.lines().map(str::to_string).collect();
                        lines.extend(code::render_code_block(&language, &code_lines, theme));
                    }
                    lines.push(Line::from(""));
                }
            }
            Event::Start(Tag::Table(alignments)) => {
                flush(&mut lines, &mut current);
                table = Some(TableRenderer::new(alignments));
            }
            Event::End(TagEnd::Table) => {
                if let Some(table) = table.take() {
                    lines.extend(table.into_lines(theme));
                    lines.push(Line::from(""));
                }
            }
            Event::Start(Tag::TableHead) => {
                if let Some(table) = table.as_mut() {
                    table.start_header();
                }
            }
            Event::End(TagEnd::TableHead) => {
                if let Some(table) = table.as_mut() {
                    table.end_header();
                }
            }
            Event::Start(Tag::TableRow) => {}
            Event::End(TagEnd::TableRow) => {
                if let Some(table) = table.as_mut() {
                    table.end_row();
                }
            }
            Event::Start(Tag::TableCell) => {
                if let Some(table) = table.as_mut() {
                    table.start_cell();
                }
            }
            Event::End(TagEnd::TableCell) => {
                if let Some(table) = table.as_mut() {
                    table.end_cell();
                }
            }
            Event::Start(Tag::Emphasis) => italic = true,
            Event::End(TagEnd::Emphasis) => italic = false,
            Event::Start(Tag::Strong) => bold = true,
            Event::End(TagEnd::Strong) => bold = false,
            Event::Text(text) => {
                if let Some((_, buffer)) = code_block.as_mut() {
                    buffer.push_str(&text);
                } else if let Some(table) = table.as_mut() {
                    table.push_text(&text);
                } else {
                    current.push(Span::styled(
                        text.to_string(),
                        inline_style(theme, bold, italic),
                    ));
                }
            }
            Event::Code(code_text) => {
                if let Some(table) = table.as_mut() {
                    table.push_text(&code_text);
                } else {
                    current.push(Span::styled(code_text.to_string(), theme.code_text));
                }
            }
            Event::InlineMath(math) => {
                if let Some(table) = table.as_mut() {
                    table.push_text(&math);
                } else {
                    current.extend(code::inline_math_spans(&math, theme));
                }
            }
            Event::DisplayMath(math) => {
                flush(&mut lines, &mut current);
                lines.extend(code::render_math_block(&math, theme));
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(table) = table.as_mut() {
                    table.push_text(" ");
                } else {
                    flush(&mut lines, &mut current);
                }
            }
            Event::Rule => {
                flush(&mut lines, &mut current);
                lines.push(Line::from(Span::styled(
                    "────────".to_string(),
                    theme.system_text,
                )));
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                // Unknown tags render as literal text.
                current.push(Span::styled(
                    html.to_string(),
                    inline_style(theme, bold, italic),
                ));
            }
            _ => {}
        }
    }

    flush(&mut lines, &mut current);
    while lines.last().map(|l| l.spans.is_empty()).unwrap_or(false)
        || lines
            .last()
            .map(|l| l.spans.iter().all(|s| s.content.is_empty()))
            .unwrap_or(false)
    {
        lines.pop();
    }
    lines
}

fn inline_style(theme: &Theme, bold: bool, italic: bool) -> Style {
    let mut style = theme.assistant_text;
    if bold {
        style = style.add_modifier(ratatui::style::Modifier::BOLD);
    }
    if italic {
        style = style.add_modifier(ratatui::style::Modifier::ITALIC);
    }
    style
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn all_text(lines: &[Line<'_>]) -> Vec<String> {
        lines.iter().map(line_text).collect()
    }

    #[test]
    fn table_round_trip_renders_header_and_body_without_separator() {
        let theme = Theme::default();
        let lines = markdown_lines("a|b\n---|---\n1|2", &theme);
        let texts = all_text(&lines);

        let header = texts
            .iter()
            .find(|t| t.contains('a') && t.contains('b'))
            .expect("header row rendered");
        assert!(header.contains('│'));
        assert!(texts.iter().any(|t| t.contains('1') && t.contains('2')));
        assert!(
            !texts.iter().any(|t| t.contains("---")),
            "alignment row must be consumed, not rendered"
        );
    }

    #[test]
    fn table_alignment_row_selects_column_alignment() {
        let theme = Theme::default();
        let lines = markdown_lines("| h | i |\n|---:|:---:|\n| 1 | 2 |", &theme);
        // The parser consumed the alignment row; body cells are padded
        // right/center inside their columns.
        let texts = all_text(&lines);
        assert!(texts.iter().any(|t| t.contains('1')));
        assert!(!texts.iter().any(|t| t.contains(":--")));
    }

    #[test]
    fn code_blocks_are_numbered_and_labeled() {
        let theme = Theme::default();
        let lines = markdown_lines("```rust\nlet x = 1;\nlet y = 2;\n```", &theme);
        let texts = all_text(&lines);

        assert!(texts[0].contains("rust"));
        assert!(texts[1].starts_with("  1 │ "));
        assert!(texts[1].contains("let x = 1;"));
        assert!(texts[2].starts_with("  2 │ "));
    }

    #[test]
    fn unlabeled_fence_gets_the_generic_label() {
        let theme = Theme::default();
        let lines = markdown_lines("```\ncode\n```", &theme);
        assert!(line_text(&lines[0]).contains("text"));
    }

    #[test]
    fn fenced_math_blocks_render_as_math() {
        let theme = Theme::default();
        let lines = markdown_lines("```math\nE = mc^2\n```", &theme);
        let texts = all_text(&lines);
        assert!(texts.iter().any(|t| t.contains("E = mc^2")));
        assert!(!texts.iter().any(|t| t.contains('│')));
    }

    #[test]
    fn inline_math_renders_between_dollar_signs() {
        let theme = Theme::default();
        let lines = markdown_lines("the relation $x+y$ holds", &theme);
        let texts = all_text(&lines);
        assert!(texts.iter().any(|t| t.contains("x+y")));
        assert!(!texts.iter().any(|t| t.contains('$')));
    }

    #[test]
    fn unbalanced_math_degrades_to_annotation() {
        let theme = Theme::default();
        let lines = markdown_lines("```math\n\\frac{a}{b\n```", &theme);
        let texts = all_text(&lines);
        assert!(texts.iter().any(|t| t.contains("math error")));
        // The raw source stays visible next to the annotation.
        assert!(texts.iter().any(|t| t.contains("\\frac{a}{b")));
    }

    #[test]
    fn unterminated_inline_code_closes_at_end_of_string() {
        let theme = Theme::default();
        let lines = markdown_lines("run `cargo build", &theme);
        let texts = all_text(&lines);
        assert!(texts.iter().any(|t| t.contains("cargo build")));
    }

    #[test]
    fn nested_lists_indent_by_depth() {
        let theme = Theme::default();
        let lines = markdown_lines("- a\n- b\n  - c", &theme);
        let texts = all_text(&lines);
        assert!(texts.iter().any(|t| t == "• a"));
        assert!(texts.iter().any(|t| t == "• b"));
        assert!(texts.iter().any(|t| t == "  • c"));
    }

    #[test]
    fn ordered_lists_keep_their_numbering() {
        let theme = Theme::default();
        let lines = markdown_lines("1. first\n2. second", &theme);
        let texts = all_text(&lines);
        assert!(texts.iter().any(|t| t == "1. first"));
        assert!(texts.iter().any(|t| t == "2. second"));
    }

    #[test]
    fn partial_table_mid_stream_renders_without_panic() {
        let theme = Theme::default();
        let lines = markdown_lines("| a | b", &theme);
        assert!(!lines.is_empty());
    }

    #[test]
    fn partial_code_fence_renders_best_effort() {
        let theme = Theme::default();
        let lines = markdown_lines("```py\nprint('hi')", &theme);
        let texts = all_text(&lines);
        assert!(texts.iter().any(|t| t.contains("print('hi')")));
    }

    #[test]
    fn paragraphs_are_separated_by_blank_lines() {
        let theme = Theme::default();
        let lines = markdown_lines("one\n\ntwo", &theme);
        let texts = all_text(&lines);
        let one = texts.iter().position(|t| t == "one").unwrap();
        let two = texts.iter().position(|t| t == "two").unwrap();
        assert!(two > one + 1, "expected a blank spacer between paragraphs");
    }

    #[test]
    fn user_messages_carry_the_you_prefix() {
        let theme = Theme::default();
        let lines = render_message(&Message::user("hello"), &theme);
        assert_eq!(line_text(&lines[0]), "You: hello");
    }

    #[test]
    fn assistant_reasoning_segment_renders_as_thinking_block() {
        let theme = Theme::default();
        let message = Message::assistant("<think>weighing options</think>done");
        let lines = render_message(&message, &theme);
        let texts = all_text(&lines);
        assert!(texts.iter().any(|t| t.contains("Thinking: weighing options")));
        assert!(texts.iter().any(|t| t.contains("done")));
    }

    #[test]
    fn error_messages_render_verbatim() {
        let theme = Theme::default();
        let message = Message::assistant("⚠️ Error: request failed");
        let lines = render_message(&message, &theme);
        assert!(line_text(&lines[0]).contains("request failed"));
    }
}
