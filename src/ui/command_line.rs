//! Command line UI component

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::state::{CommandLineState, CommandMode, Screen};
use crate::theme::Theme;

/// Draw the command line at the bottom of the screen
pub fn draw(
    frame: &mut Frame,
    area: Rect,
    state: &CommandLineState,
    screen: Screen,
    theme: &Theme,
) {
    let (text, style) = match state.mode {
        CommandMode::Normal => {
            // Show message or empty
            if let Some(ref msg) = state.message {
                let style = if state.is_error {
                    Style::default().fg(theme.error)
                } else {
                    Style::default().fg(theme.fg_muted)
                };
                (msg.clone(), style)
            } else {
                (hint_for(screen), Style::default().fg(theme.fg_muted))
            }
        }
        CommandMode::Command => {
            let text = format!(":{}", state.input);
            (text, Style::default().fg(theme.accent_primary))
        }
    };

    // Build the line with cursor if in input mode
    let line = if state.is_input_mode() {
        build_line_with_cursor(&text, state.cursor + 1, style, theme) // +1 for prefix
    } else {
        Line::from(Span::styled(text, style))
    };

    let paragraph = Paragraph::new(line);
    frame.render_widget(paragraph, area);
}

/// Key hints for the current screen, shown when there is no message
fn hint_for(screen: Screen) -> String {
    let keys = match screen {
        Screen::Home | Screen::SubjectSelect | Screen::ChapterSelect => {
            "j/k move  Enter open  Esc back  s saved  t test  p profile"
        }
        Screen::Questions | Screen::Saved => "j/k question  a-d answer  r reset  m bookmark  Esc back",
        Screen::TestSetup => "j/k field  h/l change  Enter start  Esc back",
        Screen::TestActive => "a-d answer  h/l question  m bookmark  S submit",
        Screen::TestResult => "Enter new test  H home",
        Screen::Profile => ", settings  L sign in  :logout  R retry sync",
        Screen::Settings => "Enter/T toggle theme  Esc back",
        Screen::AdminDashboard => "h/l tab  n new  e edit  X delete  :import <csv>",
        Screen::SignIn => "Tab switch field  Enter submit  Ctrl-N sign up/in  Esc back",
    };
    format!("{}  : commands  ? help", keys)
}

/// Build a line with a visible cursor
fn build_line_with_cursor(
    text: &str,
    cursor_pos: usize,
    base_style: Style,
    theme: &Theme,
) -> Line<'static> {
    let chars: Vec<char> = text.chars().collect();
    let mut spans = Vec::new();

    // Text before cursor
    if cursor_pos > 0 {
        let before: String = chars.iter().take(cursor_pos).collect();
        spans.push(Span::styled(before, base_style));
    }

    // Cursor character (or space if at end)
    let cursor_char = chars.get(cursor_pos).copied().unwrap_or(' ');
    let cursor_style =
        Style::default().fg(theme.bg_primary).bg(theme.fg_primary).add_modifier(Modifier::BOLD);
    spans.push(Span::styled(cursor_char.to_string(), cursor_style));

    // Text after cursor
    if cursor_pos + 1 < chars.len() {
        let after: String = chars.iter().skip(cursor_pos + 1).collect();
        spans.push(Span::styled(after, base_style));
    }

    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_mentions_commands() {
        assert!(hint_for(Screen::TestActive).contains("S submit"));
        assert!(hint_for(Screen::Home).ends_with("? help"));
    }

    #[test]
    fn build_cursor_at_start() {
        let theme = Theme::default();
        let line = build_line_with_cursor(":test", 0, Style::default(), &theme);
        assert_eq!(line.spans.len(), 2); // cursor + rest
    }

    #[test]
    fn build_cursor_at_end() {
        let theme = Theme::default();
        let line = build_line_with_cursor(":test", 5, Style::default(), &theme);
        assert_eq!(line.spans.len(), 2); // before + cursor (space)
    }

    #[test]
    fn build_cursor_in_middle() {
        let theme = Theme::default();
        let line = build_line_with_cursor(":test", 2, Style::default(), &theme);
        assert_eq!(line.spans.len(), 3); // before + cursor + after
    }
}
