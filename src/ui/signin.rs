//! Email and password form

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
};

use super::layout::{centered_rect, panel};
use crate::app::state::{SignInField, SignInForm};
use crate::theme::Theme;

pub fn draw(frame: &mut Frame, area: Rect, form: &SignInForm, busy: bool, theme: &Theme) {
    let area = centered_rect(60, 60, area);
    frame.render_widget(Clear, area);

    let title = if form.sign_up { "Create account" } else { "Sign in" };
    let block = panel(title, theme, true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let masked = "•".repeat(form.password.chars().count());
    let mut lines = vec![
        Line::from(""),
        field_line("Email", &form.email, form.focus == SignInField::Email, theme),
        Line::from(""),
        field_line("Password", &masked, form.focus == SignInField::Password, theme),
        Line::from(""),
    ];

    let status = if busy { "Contacting server..." } else { "" };
    lines.push(Line::from(Span::styled(status, Style::default().fg(theme.info))));
    lines.push(Line::from(""));
    let switch = if form.sign_up { "Ctrl-N: have an account? Sign in" } else { "Ctrl-N: new here? Create an account" };
    lines.push(Line::from(Span::styled(
        format!("  [Enter] Submit   [Tab] Next field   {}", switch),
        Style::default().fg(theme.fg_muted),
    )));
    lines.push(Line::from(Span::styled(
        "  OAuth: :oauth google, then :token <access_token>",
        Style::default().fg(theme.fg_muted),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
}

fn field_line<'a>(label: &'a str, value: &str, focused: bool, theme: &Theme) -> Line<'a> {
    let value_style = if focused {
        Style::default().fg(theme.fg_primary).bg(theme.bg_tertiary).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.fg_secondary).bg(theme.bg_secondary)
    };
    let cursor = if focused { "│" } else { " " };
    Line::from(vec![
        Span::styled(format!("  {:<10}", label), Style::default().fg(theme.fg_secondary)),
        Span::styled(format!(" {}{:<30}", value, cursor), value_style),
    ])
}
