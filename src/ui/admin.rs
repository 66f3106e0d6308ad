//! Admin dashboard: question and exam tables

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::layout::{draw_placeholder, panel, row_style, visible_rows};
use crate::app::state::{AdminTab, AppState};
use crate::theme::Theme;

pub fn draw(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    if !state.is_admin() {
        draw_placeholder(frame, area, "Admin access required", theme);
        return;
    }

    let chunks = Layout::vertical([Constraint::Length(1), Constraint::Min(3)]).split(area);
    draw_tabs(frame, chunks[0], state.admin_tab, theme);

    let (title, rows) = match state.admin_tab {
        AdminTab::Questions => (
            format!("Questions ({})", state.questions.len()),
            state
                .questions
                .iter()
                .map(|q| {
                    format!(
                        "#{:<5} {:<6} {:<10} {:<14} [{}] {}",
                        q.id, q.exam_id, q.subject, q.chapter, q.correct, q.text
                    )
                })
                .collect::<Vec<_>>(),
        ),
        AdminTab::Exams => (
            format!("Exams ({})", state.exams.len()),
            state
                .exams
                .iter()
                .map(|e| {
                    let code = if e.access_code.is_some() { "  [private]" } else { "" };
                    format!("{:<8} {:<20} {}{}", e.id, e.name, e.subjects.join(", "), code)
                })
                .collect(),
        ),
    };

    let block = panel(&title, theme, true);
    let inner = block.inner(chunks[1]);
    frame.render_widget(block, chunks[1]);

    if rows.is_empty() {
        draw_placeholder(frame, inner, "Nothing here yet. Press n to add one", theme);
        return;
    }

    let range = visible_rows(&mut state.list, inner.height as usize, rows.len());
    let selected = state.list.selected;
    let width = inner.width as usize;
    let lines: Vec<Line> = rows[range.clone()]
        .iter()
        .zip(range)
        .map(|(row, i)| {
            let text: String = format!(" {}", row).chars().take(width).collect();
            Line::from(Span::styled(text, row_style(i == selected, theme)))
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_tabs(frame: &mut Frame, area: Rect, active: AdminTab, theme: &Theme) {
    let tab = |label: &'static str, on: bool| {
        if on {
            Span::styled(
                label,
                Style::default().fg(theme.accent_primary).add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            )
        } else {
            Span::styled(label, Style::default().fg(theme.fg_muted))
        }
    };
    let line = Line::from(vec![
        Span::raw(" "),
        tab("Questions", active == AdminTab::Questions),
        Span::raw("   "),
        tab("Exams", active == AdminTab::Exams),
        Span::styled(
            "      n new  e edit  X delete  :import <csv>  :upload <image>",
            Style::default().fg(theme.fg_muted),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
