//! Exam, subject and chapter lists with progress bars

use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::layout::{BAR_WIDTH, draw_placeholder, panel, progress_bar, row_style, visible_rows};
use crate::app::state::AppState;
use crate::progress::GroupProgress;
use crate::theme::Theme;

/// One list row: label, count and progress
struct Row {
    label: String,
    detail: String,
    percent: u8,
}

impl From<GroupProgress> for Row {
    fn from(g: GroupProgress) -> Self {
        Row { label: g.name, detail: format!("{}/{} solved", g.solved, g.total), percent: g.percent }
    }
}

/// Home: the practicable exams
pub fn draw_home(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let rows: Vec<Row> = state
        .home_exams()
        .into_iter()
        .map(|exam| Row {
            label: exam.name.clone(),
            detail: exam.subjects.join(", "),
            percent: state.exam_progress(&exam.id),
        })
        .collect();

    let empty = if state.in_flight > 0 { "Loading exams..." } else { "No exams available" };
    draw_rows(frame, area, state, theme, "Exams", rows, empty);
}

pub fn draw_subjects(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let title = state.current_exam().map_or_else(|| "Subjects".to_string(), |e| e.name.clone());
    let rows = state.subject_rows().into_iter().map(Row::from).collect();
    draw_rows(frame, area, state, theme, &title, rows, "This exam has no subjects");
}

pub fn draw_chapters(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let title = state.nav.selection().subject.clone().unwrap_or_else(|| "Chapters".to_string());
    let rows = state.chapter_rows().into_iter().map(Row::from).collect();
    draw_rows(frame, area, state, theme, &title, rows, "No questions in this subject yet");
}

fn draw_rows(
    frame: &mut Frame,
    area: Rect,
    state: &mut AppState,
    theme: &Theme,
    title: &str,
    rows: Vec<Row>,
    empty: &str,
) {
    let block = panel(title, theme, true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if rows.is_empty() {
        draw_placeholder(frame, inner, empty, theme);
        return;
    }

    // two lines per row plus a spacer
    let per_row = 3;
    let range = visible_rows(&mut state.list, inner.height as usize / per_row, rows.len());
    let selected = state.list.selected;
    let label_width = inner.width.saturating_sub(BAR_WIDTH as u16 + 8) as usize;

    let mut lines = Vec::new();
    for (i, row) in rows.iter().enumerate().take(range.end).skip(range.start) {
        let is_selected = i == selected;
        let bar_style = match row.percent {
            100 => Style::default().fg(theme.success),
            0 => Style::default().fg(theme.fg_muted),
            _ => Style::default().fg(theme.accent_secondary),
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!(" {:<width$}", row.label, width = label_width),
                row_style(is_selected, theme),
            ),
            Span::raw("  "),
            Span::styled(progress_bar(row.percent, BAR_WIDTH), bar_style),
        ]));
        lines.push(Line::from(Span::styled(
            format!("   {}", row.detail),
            Style::default().fg(theme.fg_muted),
        )));
        lines.push(Line::from(""));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}
