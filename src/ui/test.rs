//! Mock test setup, the running test and its result

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

use super::layout::{draw_placeholder, panel};
use crate::app::state::{AppState, SetupField};
use crate::model::OptionKey;
use crate::quiz::{SECONDS_PER_QUESTION, TestSession};
use crate::theme::Theme;

/// Clock turns to the warning colour under this many seconds
const LOW_TIME_SECS: u32 = 60;

pub fn draw_setup(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let block = panel("Mock Test", theme, true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let setup = &state.setup;
    let exam_name = setup
        .exam
        .as_ref()
        .map(|id| state.exams.iter().find(|e| &e.id == id).map_or(id.as_str(), |e| e.name.as_str()))
        .unwrap_or("Choose an exam");
    let any = |v: &Option<String>| v.clone().unwrap_or_else(|| "All".to_string());
    let minutes = setup.count as u32 * SECONDS_PER_QUESTION / 60;

    let fields = [
        (SetupField::Exam, "Exam", exam_name.to_string()),
        (SetupField::Subject, "Subject", any(&setup.subject)),
        (SetupField::Chapter, "Chapter", any(&setup.chapter)),
        (SetupField::Count, "Questions", setup.count.to_string()),
    ];

    let mut lines = vec![Line::from("")];
    for (field, label, value) in fields {
        let focused = field == setup.focus;
        let value_style = if focused {
            Style::default().fg(theme.bg_primary).bg(theme.accent_primary).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.fg_primary)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<12}", label), Style::default().fg(theme.fg_secondary)),
            Span::styled(format!(" ‹ {} › ", value), value_style),
        ]));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        format!("  Time limit: {} minutes   Marking: +4 correct, -1 wrong, 0 skipped", minutes),
        Style::default().fg(theme.fg_muted),
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  [Enter] Start test",
        Style::default().fg(theme.accent_secondary),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
}

pub fn draw_active(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let Some(test) = &state.test else {
        draw_placeholder(frame, area, "No test running", theme);
        return;
    };

    let chunks = Layout::horizontal([Constraint::Min(30), Constraint::Length(24)]).split(area);
    draw_current(frame, chunks[0], state, test, theme);
    draw_palette(frame, chunks[1], test, theme);
}

fn draw_current(frame: &mut Frame, area: Rect, state: &AppState, test: &TestSession, theme: &Theme) {
    let block = panel(test.title(), theme, true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(question) = test.current_question() else {
        return;
    };
    let picked = test.answer(question.id);
    let mark = if state.progress.is_bookmarked(question.id) { "  ★" } else { "" };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("Question {} of {}", test.current_index() + 1, test.questions().len()),
                Style::default().fg(theme.fg_muted),
            ),
            Span::styled(mark, Style::default().fg(theme.warning)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            question.text.clone(),
            Style::default().fg(theme.fg_primary).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for key in OptionKey::ALL {
        let chosen = picked == Some(key);
        let (marker, style) = if chosen {
            ("●", Style::default().fg(theme.accent_primary).add_modifier(Modifier::BOLD))
        } else {
            ("○", Style::default().fg(theme.fg_secondary))
        };
        lines.push(Line::from(Span::styled(
            format!("  {} {}) {}", marker, key, question.option(key)),
            style,
        )));
        lines.push(Line::from(""));
    }

    if picked.is_some() {
        lines.push(Line::from(Span::styled(
            "Answer locked",
            Style::default().fg(theme.fg_muted),
        )));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_palette(frame: &mut Frame, area: Rect, test: &TestSession, theme: &Theme) {
    let block = panel("Palette", theme, false);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let clock_style = if test.remaining_secs() < LOW_TIME_SECS {
        Style::default().fg(theme.error).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.accent_secondary).add_modifier(Modifier::BOLD)
    };

    let mut lines = vec![
        Line::from(Span::styled(format!("⏱ {}", test.clock_label()), clock_style)),
        Line::from(Span::styled(
            format!("{}/{} answered", test.answered_count(), test.questions().len()),
            Style::default().fg(theme.fg_muted),
        )),
        Line::from(""),
    ];

    // five cells per row
    let cells: Vec<Span> = test
        .questions()
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let style = if i == test.current_index() {
                Style::default().fg(theme.bg_primary).bg(theme.accent_primary)
            } else if test.answer(q.id).is_some() {
                Style::default().fg(theme.bg_primary).bg(theme.success)
            } else {
                Style::default().fg(theme.fg_secondary).bg(theme.bg_tertiary)
            };
            Span::styled(format!("{:>3}", i + 1), style)
        })
        .collect();
    for row in cells.chunks(5) {
        let mut spans = Vec::new();
        for cell in row {
            spans.push(cell.clone());
            spans.push(Span::raw(" "));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("[S] Submit", Style::default().fg(theme.warning))));

    frame.render_widget(Paragraph::new(lines), inner);
}

pub fn draw_result(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let block = panel("Result", theme, true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(report) = &state.last_report else {
        draw_placeholder(frame, inner, "No result yet", theme);
        return;
    };

    let score_style = if report.score > 0 {
        Style::default().fg(theme.success).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.error).add_modifier(Modifier::BOLD)
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(report.title.clone(), Style::default().fg(theme.fg_secondary))),
        Line::from(""),
        Line::from(Span::styled(
            format!("Score: {} / {}", report.score, report.max_score),
            score_style,
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("✓ {} correct   ", report.correct), Style::default().fg(theme.success)),
            Span::styled(format!("✗ {} wrong   ", report.wrong), Style::default().fg(theme.error)),
            Span::styled(format!("– {} skipped", report.skipped), Style::default().fg(theme.fg_muted)),
        ]),
    ];
    if report.timed_out {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Time ran out; the test was submitted automatically",
            Style::default().fg(theme.warning),
        )));
    }
    if state.identity.is_none() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Sign in to keep a history of your scores",
            Style::default().fg(theme.fg_muted),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "[Enter] New test    [H] Home",
        Style::default().fg(theme.fg_muted),
    )));

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}
