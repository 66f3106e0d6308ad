//! Key bindings

use crossterm::event::{KeyCode, KeyModifiers};

use crate::model::OptionKey;

/// Vim-style key mapping (basic, without modifiers)
pub fn vim_key_to_action(key: KeyCode) -> Option<Action> {
    match key {
        KeyCode::Char('j') | KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::Up),
        KeyCode::Char('h') | KeyCode::Left => Some(Action::Left),
        KeyCode::Char('l') | KeyCode::Right => Some(Action::Right),
        KeyCode::Char('g') | KeyCode::Home => Some(Action::Top),
        KeyCode::Char('G') | KeyCode::End => Some(Action::Bottom),
        KeyCode::Enter => Some(Action::Select),
        KeyCode::Esc | KeyCode::Backspace => Some(Action::Back),
        KeyCode::Char('H') => Some(Action::Home),
        KeyCode::Char(c @ ('a' | 'b' | 'c' | 'd' | 'A' | 'B' | 'C' | 'D')) => {
            OptionKey::from_char(c).map(Action::Choose)
        }
        KeyCode::Char(c @ '1'..='4') => {
            OptionKey::ALL.get((c as usize) - ('1' as usize)).copied().map(Action::Choose)
        }
        KeyCode::Char('m') => Some(Action::ToggleBookmark),
        KeyCode::Char('r') => Some(Action::Reset),
        KeyCode::Char('s') => Some(Action::OpenSaved),
        KeyCode::Char('t') => Some(Action::OpenTest),
        KeyCode::Char('p') => Some(Action::OpenProfile),
        KeyCode::Char(',') => Some(Action::OpenSettings),
        KeyCode::Char('x') => Some(Action::OpenAdmin),
        KeyCode::Char('L') => Some(Action::OpenSignIn),
        KeyCode::Char('T') => Some(Action::ToggleTheme),
        KeyCode::Char('S') => Some(Action::Submit),
        KeyCode::Char('R') => Some(Action::Retry),
        KeyCode::Char('n') => Some(Action::New),
        KeyCode::Char('e') => Some(Action::Edit),
        KeyCode::Delete | KeyCode::Char('X') => Some(Action::Delete),
        KeyCode::Char(':') => Some(Action::Command),
        KeyCode::Char('?') => Some(Action::Help),
        // Note: 'q' intentionally not mapped - use :q command to quit
        _ => None,
    }
}

/// Key mapping with modifiers (for Ctrl combinations)
pub fn key_with_modifier_to_action(key: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
    if modifiers.contains(KeyModifiers::CONTROL) {
        match key {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('r') => Some(Action::Refresh),
            _ => None,
        }
    } else {
        vim_key_to_action(key)
    }
}

/// Actions that can be taken in the app
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // Navigation
    Up,
    Down,
    Left,
    Right,
    Top,
    Bottom,
    Select,
    Back,
    Home,

    // Answering
    Choose(OptionKey),
    Reset,
    ToggleBookmark,
    Submit,

    // Screens
    OpenSaved,
    OpenTest,
    OpenProfile,
    OpenSettings,
    OpenAdmin,
    OpenSignIn,

    // Admin list
    New,
    Edit,
    Delete,

    // Misc
    ToggleTheme,
    Retry,
    Refresh,
    Command,
    Help,
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vim_j_maps_to_down() {
        assert_eq!(vim_key_to_action(KeyCode::Char('j')), Some(Action::Down));
    }

    #[test]
    fn option_letters_and_digits_choose() {
        assert_eq!(vim_key_to_action(KeyCode::Char('c')), Some(Action::Choose(OptionKey::C)));
        assert_eq!(vim_key_to_action(KeyCode::Char('B')), Some(Action::Choose(OptionKey::B)));
        assert_eq!(vim_key_to_action(KeyCode::Char('4')), Some(Action::Choose(OptionKey::D)));
        assert_eq!(vim_key_to_action(KeyCode::Char('5')), None);
    }

    #[test]
    fn q_is_not_bound() {
        assert_eq!(vim_key_to_action(KeyCode::Char('q')), None);
    }

    #[test]
    fn ctrl_c_quits() {
        assert_eq!(
            key_with_modifier_to_action(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(Action::Quit)
        );
    }

    #[test]
    fn no_modifier_uses_vim_keys() {
        assert_eq!(
            key_with_modifier_to_action(KeyCode::Char('m'), KeyModifiers::NONE),
            Some(Action::ToggleBookmark)
        );
    }
}
