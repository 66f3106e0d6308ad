//! Profile (account, sync state, score history) and settings

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::layout::{draw_placeholder, panel, row_style, visible_rows};
use crate::app::state::AppState;
use crate::sync::ProgressSource;
use crate::theme::{Theme, ThemeMode};

pub fn draw_profile(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let chunks = Layout::vertical([Constraint::Length(8), Constraint::Min(3)]).split(area);

    let block = panel("Account", theme, false);
    let inner = block.inner(chunks[0]);
    frame.render_widget(block, chunks[0]);
    frame.render_widget(Paragraph::new(account_lines(state, theme)), inner);

    let block = panel("Test history", theme, true);
    let inner = block.inner(chunks[1]);
    frame.render_widget(block, chunks[1]);

    if state.identity.is_none() {
        draw_placeholder(frame, inner, "Sign in to see your test history", theme);
        return;
    }
    if state.history.is_empty() {
        draw_placeholder(frame, inner, "No tests taken yet\n\nPress t to start a mock test", theme);
        return;
    }

    let range = visible_rows(&mut state.list, inner.height as usize, state.history.len());
    let selected = state.list.selected;
    let lines: Vec<Line> = state.history[range.clone()]
        .iter()
        .zip(range)
        .map(|(result, i)| {
            Line::from(vec![
                Span::styled(
                    format!(" {:<40}", result.title),
                    row_style(i == selected, theme),
                ),
                Span::styled(
                    format!("  {:>4} / {:<4}", result.score, result.max_score),
                    Style::default().fg(theme.accent_secondary),
                ),
                Span::styled(
                    format!(
                        "  ✓{} ✗{}  {}",
                        result.correct_count,
                        result.wrong_count,
                        result.created_at.format("%d %b %Y %H:%M")
                    ),
                    Style::default().fg(theme.fg_muted),
                ),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn account_lines(state: &AppState, theme: &Theme) -> Vec<Line<'static>> {
    let label = Style::default().fg(theme.fg_secondary);
    let value = Style::default().fg(theme.fg_primary).add_modifier(Modifier::BOLD);

    let (who, role) = match &state.identity {
        Some(identity) => (
            identity.email.clone(),
            if identity.is_admin() { "Admin" } else { "Student" },
        ),
        None => ("Guest".to_string(), "progress is kept on this device"),
    };
    let storage = match state.progress.source() {
        ProgressSource::Guest => "Local file".to_string(),
        ProgressSource::Cloud { .. } if !state.progress.is_loaded() => "Cloud (loading)".to_string(),
        ProgressSource::Cloud { .. } => "Cloud".to_string(),
    };
    let progress = state.progress.progress();

    let mut lines = vec![
        Line::from(vec![Span::styled("  Signed in as  ", label), Span::styled(who, value)]),
        Line::from(vec![Span::styled("  Role          ", label), Span::styled(role, value)]),
        Line::from(vec![Span::styled("  Progress      ", label), Span::styled(storage, value)]),
        Line::from(vec![
            Span::styled("  Solved        ", label),
            Span::styled(
                format!("{}   Bookmarked {}", progress.solved.len(), progress.bookmarks.len()),
                value,
            ),
        ]),
    ];
    if state.progress.failed_count() > 0 {
        let reason = state.progress.last_failure().unwrap_or("unknown error").to_string();
        lines.push(Line::from(Span::styled(
            format!(
                "  {} change(s) not synced: {}. Press R to retry",
                state.progress.failed_count(),
                reason
            ),
            Style::default().fg(theme.warning),
        )));
    }
    lines
}

pub fn draw_settings(frame: &mut Frame, area: Rect, mode: ThemeMode, access_code: bool, theme: &Theme) {
    let block = panel("Settings", theme, true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let label = Style::default().fg(theme.fg_secondary);
    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Theme         ", label),
            Span::styled(format!(" ‹ {} › ", mode.label()), row_style(true, theme)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Access code   ", label),
            Span::styled(
                if access_code { "set (:code to clear)" } else { "none (:code <code>)" },
                Style::default().fg(theme.fg_primary),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled("  [Enter] Toggle theme", Style::default().fg(theme.fg_muted))),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}
