use ratatui::style::{Color, Modifier, Style};

/// Styles for the display tree produced by the markdown renderer. One theme
/// is active for the whole session.
pub struct Theme {
    pub user_prefix: Style,
    pub user_text: Style,
    pub assistant_text: Style,
    pub system_text: Style,
    pub reasoning_text: Style,
    pub code_text: Style,
    pub code_line_number: Style,
    pub code_language: Style,
    pub math_text: Style,
    pub math_error: Style,
    pub table_border: Style,
    pub list_marker: Style,
    pub error_text: Style,
    pub hint_text: Style,
}

impl Theme {
    pub fn dark_default() -> Self {
        Self {
            user_prefix: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            user_text: Style::default().fg(Color::Cyan),
            assistant_text: Style::default().fg(Color::White),
            system_text: Style::default().fg(Color::DarkGray),
            reasoning_text: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
            code_text: Style::default().fg(Color::Green),
            code_line_number: Style::default().fg(Color::DarkGray),
            code_language: Style::default().fg(Color::DarkGray),
            math_text: Style::default().fg(Color::Magenta),
            math_error: Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::ITALIC),
            table_border: Style::default().fg(Color::DarkGray),
            list_marker: Style::default().fg(Color::Yellow),
            error_text: Style::default().fg(Color::Red),
            hint_text: Style::default().fg(Color::DarkGray),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark_default()
    }
}
