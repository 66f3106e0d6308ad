//! UI rendering components

pub mod admin;
pub mod browse;
pub mod command_line;
pub mod layout;
pub mod profile;
pub mod questions;
pub mod signin;
pub mod test;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::Block,
};

use crate::app::state::{AppState, Screen};
use crate::config::Config;

/// Main draw function
pub fn draw(frame: &mut Frame, state: &mut AppState, config: &Config) {
    let theme = config.active_theme();
    let area = frame.area();
    frame.render_widget(Block::default().style(Style::default().bg(theme.bg_primary)), area);

    // Split vertically: header, main area and command line
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3), Constraint::Length(1)])
        .split(area);
    let main = chunks[1];

    layout::draw_header(frame, chunks[0], state, &theme);

    match state.screen() {
        Screen::Home => browse::draw_home(frame, main, state, &theme),
        Screen::SubjectSelect => browse::draw_subjects(frame, main, state, &theme),
        Screen::ChapterSelect => browse::draw_chapters(frame, main, state, &theme),
        Screen::Questions | Screen::Saved => questions::draw(frame, main, state, &theme),
        Screen::TestSetup => test::draw_setup(frame, main, state, &theme),
        Screen::TestActive => test::draw_active(frame, main, state, &theme),
        Screen::TestResult => test::draw_result(frame, main, state, &theme),
        Screen::Profile => profile::draw_profile(frame, main, state, &theme),
        Screen::Settings => {
            profile::draw_settings(frame, main, config.theme, config.access_code.is_some(), &theme)
        }
        Screen::AdminDashboard => admin::draw(frame, main, state, &theme),
        Screen::SignIn => signin::draw(frame, main, &state.sign_in, state.in_flight > 0, &theme),
    }

    command_line::draw(frame, chunks[2], &state.command_line, state.screen(), &theme);

    if let Some(dialog) = &state.dialog {
        layout::draw_dialog(frame, dialog, &theme);
    }
}
