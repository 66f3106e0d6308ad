//! Layout utilities and common components

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::state::{AppState, Dialog, ListCursor};
use crate::sync::ProgressSource;
use crate::theme::Theme;

/// Width of the text progress bars in list rows
pub const BAR_WIDTH: usize = 20;

/// Bordered panel with a title
pub fn panel<'a>(title: &'a str, theme: &Theme, focused: bool) -> Block<'a> {
    let border_color = if focused { theme.border_focused } else { theme.border };
    Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(theme.bg_primary))
}

/// Draw a muted message (empty lists, unavailable screens)
pub fn draw_placeholder(frame: &mut Frame, area: Rect, message: &str, theme: &Theme) {
    let style = Style::default().fg(theme.fg_muted).bg(theme.bg_primary);

    let placeholder =
        Paragraph::new(message).style(style).alignment(Alignment::Center).wrap(Wrap { trim: true });

    frame.render_widget(placeholder, area);
}

/// Style for a list row, highlighted under the cursor
pub fn row_style(selected: bool, theme: &Theme) -> Style {
    if selected {
        Style::default().fg(theme.bg_primary).bg(theme.accent_primary).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.fg_primary)
    }
}

/// "██████░░░░ 60%"
pub fn progress_bar(percent: u8, width: usize) -> String {
    let filled = (usize::from(percent.min(100)) * width + 50) / 100;
    format!("{}{} {:>3}%", "█".repeat(filled), "░".repeat(width - filled), percent)
}

/// Store the list height and return the rows to draw
pub fn visible_rows(cursor: &mut ListCursor, height: usize, len: usize) -> std::ops::Range<usize> {
    cursor.visible_height = height;
    cursor.clamp(len);
    cursor.ensure_selection_visible();
    let start = cursor.scroll_offset.min(len);
    start..(start + height).min(len)
}

/// Top bar: app name, screen, breadcrumb and account
pub fn draw_header(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let selection = state.nav.selection();
    let crumbs: Vec<&str> = [&selection.exam, &selection.subject, &selection.chapter]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect();

    let mut spans = vec![
        Span::styled(
            " TargetUP ",
            Style::default().fg(theme.bg_primary).bg(theme.accent_primary).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {}", state.screen().title()), Style::default().fg(theme.fg_primary)),
    ];
    if !crumbs.is_empty() {
        spans.push(Span::styled(
            format!("  {}", crumbs.join(" › ")),
            Style::default().fg(theme.fg_muted),
        ));
    }

    let account = match (&state.identity, state.progress.source()) {
        (Some(identity), _) if identity.is_admin() => format!("{} (admin)", identity.email),
        (Some(identity), _) => identity.email.clone(),
        (None, ProgressSource::Guest) => "Guest".to_string(),
        (None, _) => "Signing in...".to_string(),
    };
    let mut right = vec![Span::styled(account, Style::default().fg(theme.accent_secondary))];
    if state.progress.pending_count() > 0 || state.in_flight > 0 {
        right.push(Span::styled("  ⟳", Style::default().fg(theme.info)));
    }
    if state.progress.failed_count() > 0 {
        right.push(Span::styled(
            format!("  {} unsynced (R)", state.progress.failed_count()),
            Style::default().fg(theme.warning),
        ));
    }
    right.push(Span::raw(" "));

    let chunks = Layout::horizontal([Constraint::Min(10), Constraint::Length(right_width(&right))])
        .split(area);
    let bar = Style::default().bg(theme.bg_secondary);
    frame.render_widget(Paragraph::new(Line::from(spans)).style(bar), chunks[0]);
    frame.render_widget(
        Paragraph::new(Line::from(right)).style(bar).alignment(Alignment::Right),
        chunks[1],
    );
}

fn right_width(spans: &[Span]) -> u16 {
    spans.iter().map(|s| s.width()).sum::<usize>().min(u16::MAX as usize) as u16
}

/// Modal dialog over everything else
pub fn draw_dialog(frame: &mut Frame, dialog: &Dialog, theme: &Theme) {
    let area = centered_rect(60, 40, frame.area());
    frame.render_widget(Clear, area);

    let accent = if dialog.is_error { theme.error } else { theme.border_focused };
    let block = Block::default()
        .title(format!(" {} ", dialog.title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent))
        .style(Style::default().bg(theme.bg_secondary));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = dialog
        .message
        .lines()
        .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(theme.fg_primary))))
        .collect();
    lines.push(Line::from(""));
    let hint = if dialog.confirm.is_some() { "[y/Enter] Confirm    [n/Esc] Cancel" } else { "[Enter] OK" };
    lines.push(Line::from(Span::styled(hint, Style::default().fg(theme.fg_muted))));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

/// Create a centered rectangle with the given percentage of width and height
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(r);

    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(0, 10), "░░░░░░░░░░   0%");
        assert_eq!(progress_bar(50, 10), "█████░░░░░  50%");
        assert_eq!(progress_bar(100, 4), "████ 100%");
    }

    #[test]
    fn visible_rows_follow_cursor() {
        let mut cursor = ListCursor { selected: 7, ..Default::default() };
        let rows = visible_rows(&mut cursor, 5, 10);
        assert!(rows.contains(&7));
        assert_eq!(rows.len(), 5);
    }

    #[test]
    fn visible_rows_clamp_to_short_lists() {
        let mut cursor = ListCursor { selected: 9, ..Default::default() };
        assert_eq!(visible_rows(&mut cursor, 5, 2), 0..2);
        assert_eq!(cursor.selected, 1);
    }

    #[test]
    fn centered_rect_is_inside() {
        let outer = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(60, 40, outer);
        assert_eq!(inner.width, 60);
        assert_eq!(inner.height, 20);
    }
}
