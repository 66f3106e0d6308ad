//! Practice question cards for the Questions and Saved screens

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use textwrap::{Options, wrap};

use super::layout::{draw_placeholder, panel};
use crate::app::state::{AppState, Screen};
use crate::model::{OptionKey, Question};
use crate::quiz::OptionState;
use crate::theme::Theme;

const BOOKMARKED: &str = "★";
const NOT_BOOKMARKED: &str = "☆";
const SOLVED: &str = "✓";

/// Draw the cards, starting at the focused question
pub fn draw(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let title = match state.screen() {
        Screen::Saved => "Saved questions".to_string(),
        _ => state.nav.selection().chapter.clone().unwrap_or_else(|| "Questions".to_string()),
    };
    let block = panel(&title, theme, true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let questions = state.visible_questions();
    if questions.is_empty() {
        let msg = match state.screen() {
            Screen::Saved => "No saved questions yet\n\nPress m on a question to bookmark it",
            _ => "No questions found in this chapter",
        };
        draw_placeholder(frame, inner, msg, theme);
        return;
    }

    let total = questions.len();
    let focused = state.list.selected.min(total - 1);
    let width = inner.width.saturating_sub(2) as usize;
    let height = inner.height as usize;

    let mut lines: Vec<Line> = Vec::new();
    for (i, question) in questions.iter().enumerate().skip(focused) {
        if lines.len() >= height {
            break;
        }
        card_lines(&mut lines, state, question, i, total, i == focused, width, theme);
    }
    lines.truncate(height);

    frame.render_widget(Paragraph::new(lines), inner);
}

#[allow(clippy::too_many_arguments)]
fn card_lines(
    lines: &mut Vec<Line<'static>>,
    state: &AppState,
    question: &Question,
    index: usize,
    total: usize,
    focused: bool,
    width: usize,
    theme: &Theme,
) {
    let header_style = if focused {
        Style::default().fg(theme.accent_primary).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.fg_muted)
    };
    let mark = if state.progress.is_bookmarked(question.id) { BOOKMARKED } else { NOT_BOOKMARKED };
    let mut header = vec![
        Span::styled(format!("Q{} of {}  ", index + 1, total), header_style),
        Span::styled(mark, Style::default().fg(theme.warning)),
        Span::styled(
            format!("  {}", question.difficulty.as_str()),
            Style::default().fg(theme.fg_muted),
        ),
    ];
    if let Some(year) = &question.year {
        header.push(Span::styled(format!("  {}", year), Style::default().fg(theme.fg_muted)));
    }
    if state.progress.is_solved(question.id) {
        header.push(Span::styled(format!("  {}", SOLVED), Style::default().fg(theme.success)));
    }
    lines.push(Line::from(header));

    for part in wrapped(&question.text, width) {
        lines.push(Line::from(Span::styled(
            part,
            Style::default().fg(theme.fg_primary).add_modifier(Modifier::BOLD),
        )));
    }
    if let Some(url) = &question.image_url {
        lines.push(Line::from(Span::styled(
            format!("[image] {}", url),
            Style::default().fg(theme.info),
        )));
    }

    for key in OptionKey::ALL {
        let option_state = state.practice.option_state(question, key);
        let (marker, style) = option_look(option_state, theme);
        let text = format!("  {} {}) {}", marker, key, question.option(key));
        for (n, part) in wrapped(&text, width).into_iter().enumerate() {
            let part = if n == 0 { part } else { format!("      {}", part) };
            lines.push(Line::from(Span::styled(part, style)));
        }
    }

    if let Some(solution) = state.practice.solution(question) {
        lines.push(Line::from(Span::styled(
            "Solution",
            Style::default().fg(theme.accent_secondary).add_modifier(Modifier::BOLD),
        )));
        for part in wrapped(solution, width) {
            lines.push(Line::from(Span::styled(part, Style::default().fg(theme.fg_secondary))));
        }
    }
    lines.push(Line::from(""));
}

fn option_look(option_state: OptionState, theme: &Theme) -> (&'static str, Style) {
    match option_state {
        OptionState::Open => ("○", Style::default().fg(theme.fg_secondary)),
        OptionState::Correct => {
            ("✓", Style::default().fg(theme.success).add_modifier(Modifier::BOLD))
        }
        OptionState::WrongPick => {
            ("✗", Style::default().fg(theme.error).add_modifier(Modifier::BOLD))
        }
        OptionState::Dimmed => ("○", Style::default().fg(theme.fg_muted)),
    }
}

fn wrapped(text: &str, width: usize) -> Vec<String> {
    if width < 4 {
        return vec![text.to_string()];
    }
    wrap(text, Options::new(width)).into_iter().map(|s| s.into_owned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_text_wraps() {
        let parts = wrapped("The Battle of Plassey was fought in which year of the eighteenth century", 20);
        assert!(parts.len() > 1);
        assert!(parts.iter().all(|p| p.chars().count() <= 20));
    }

    #[test]
    fn wrong_pick_and_correct_look_different() {
        let theme = Theme::default();
        let (wrong, _) = option_look(OptionState::WrongPick, &theme);
        let (right, _) = option_look(OptionState::Correct, &theme);
        assert_ne!(wrong, right);
    }
}
