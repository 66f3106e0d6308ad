//! Light palette

use ratatui::style::Color;

use super::Theme;

/// Day palette (gray-50 page, blue-600 accent)
pub const DAY: Theme = Theme {
    name: String::new(),

    bg_primary: Color::Rgb(249, 250, 251),   // #f9fafb
    bg_secondary: Color::Rgb(255, 255, 255), // #ffffff
    bg_tertiary: Color::Rgb(243, 244, 246),  // #f3f4f6

    fg_primary: Color::Rgb(17, 24, 39),    // #111827
    fg_secondary: Color::Rgb(55, 65, 81),  // #374151
    fg_muted: Color::Rgb(156, 163, 175),   // #9ca3af

    accent_primary: Color::Rgb(37, 99, 235),   // #2563eb
    accent_secondary: Color::Rgb(79, 70, 229), // #4f46e5

    success: Color::Rgb(22, 163, 74),  // #16a34a
    warning: Color::Rgb(234, 88, 12),  // #ea580c
    error: Color::Rgb(220, 38, 38),    // #dc2626
    info: Color::Rgb(2, 132, 199),     // #0284c7

    border: Color::Rgb(229, 231, 235),        // #e5e7eb
    border_focused: Color::Rgb(37, 99, 235),  // #2563eb
    selection: Color::Rgb(219, 234, 254),     // #dbeafe
};

impl Theme {
    pub fn day() -> Self {
        Theme { name: "Day".to_string(), ..DAY }
    }
}
