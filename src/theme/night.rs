//! Dark palette

use ratatui::style::Color;

use super::Theme;

/// Night palette (deep navy with the brand blue)
pub const NIGHT: Theme = Theme {
    name: String::new(),

    // Background colors
    bg_primary: Color::Rgb(15, 23, 42),   // #0f172a
    bg_secondary: Color::Rgb(30, 41, 59), // #1e293b
    bg_tertiary: Color::Rgb(51, 65, 85),  // #334155

    // Foreground colors
    fg_primary: Color::Rgb(226, 232, 240),   // #e2e8f0
    fg_secondary: Color::Rgb(203, 213, 225), // #cbd5e1
    fg_muted: Color::Rgb(100, 116, 139),     // #64748b

    // Accent colors
    accent_primary: Color::Rgb(96, 165, 250),    // #60a5fa
    accent_secondary: Color::Rgb(129, 140, 248), // #818cf8

    // Semantic colors
    success: Color::Rgb(74, 222, 128),  // #4ade80
    warning: Color::Rgb(251, 146, 60),  // #fb923c
    error: Color::Rgb(248, 113, 113),   // #f87171
    info: Color::Rgb(56, 189, 248),     // #38bdf8

    // UI elements
    border: Color::Rgb(51, 65, 85),            // #334155
    border_focused: Color::Rgb(96, 165, 250),  // #60a5fa
    selection: Color::Rgb(30, 58, 138),        // #1e3a8a
};

impl Theme {
    pub fn night() -> Self {
        Theme { name: "Night".to_string(), ..NIGHT }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn night_colors_are_rgb() {
        let theme = Theme::night();
        assert!(matches!(theme.bg_primary, Color::Rgb(_, _, _)));
        assert!(matches!(theme.accent_primary, Color::Rgb(_, _, _)));
    }
}
