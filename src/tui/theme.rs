//! Color themes for TUI

use ratatui::style::Color;

/// Theme for the TUI
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// Parse a config value ("dark" / "light")
    pub fn from_name(name: &str) -> Option<Theme> {
        match name.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    /// Prevote gauge fill
    pub fn prevote(&self) -> Color {
        match self {
            Theme::Dark => Color::Rgb(102, 153, 255),
            Theme::Light => Color::Rgb(50, 100, 200),
        }
    }

    /// Precommit gauge fill
    pub fn precommit(&self) -> Color {
        match self {
            Theme::Dark => Color::Rgb(120, 255, 180),
            Theme::Light => Color::Rgb(0, 150, 80),
        }
    }

    /// Error banner
    pub fn error(&self) -> Color {
        match self {
            Theme::Dark => Color::Rgb(255, 100, 120),
            Theme::Light => Color::Rgb(200, 0, 40),
        }
    }

    pub fn muted(&self) -> Color {
        match self {
            Theme::Dark => Color::Rgb(150, 150, 170),
            Theme::Light => Color::Rgb(100, 100, 120),
        }
    }

    pub fn border(&self) -> Color {
        match self {
            Theme::Dark => Color::Rgb(100, 80, 140),
            Theme::Light => Color::Rgb(180, 180, 200),
        }
    }

    pub fn title(&self) -> Color {
        match self {
            Theme::Dark => Color::Rgb(180, 150, 255),
            Theme::Light => Color::Rgb(60, 40, 150),
        }
    }

    pub fn text(&self) -> Color {
        match self {
            Theme::Dark => Color::Rgb(220, 220, 230),
            Theme::Light => Color::Rgb(40, 40, 50),
        }
    }

    /// Toggle to the other theme
    pub fn toggle(&self) -> Theme {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Theme::from_name("dark"), Some(Theme::Dark));
        assert_eq!(Theme::from_name(" Light "), Some(Theme::Light));
        assert_eq!(Theme::from_name("midnight"), None);
    }

    #[test]
    fn test_toggle_round_trips() {
        assert_eq!(Theme::Dark.toggle(), Theme::Light);
        assert_eq!(Theme::Dark.toggle().toggle(), Theme::Dark);
    }
}
