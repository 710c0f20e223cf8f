//! Theme definitions for the TUI
//!
//! This module provides colorblind-safe themes for both dark and light terminals.
//! The default is "dark" but users can configure "light" via config file or env var.

use ratatui::style::Color;

use crate::list::Tone;
use crate::notify::Level;

/// Available theme names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeName {
    #[default]
    Dark,
    Light,
}

impl ThemeName {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "light" => ThemeName::Light,
            _ => ThemeName::Dark,
        }
    }
}

/// Color theme for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: ThemeName,

    // Base colors
    pub fg: Color,
    pub muted: Color,
    pub border: Color,
    pub border_focused: Color,

    // Cell tones (colorblind-safe)
    pub positive: Color,
    pub info: Color,
    pub warning: Color,
    pub negative: Color,

    // UI elements
    pub selected_bg: Color,
    pub selected_fg: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub banner_bg: Color,
    pub input_invalid: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Create a dark theme (default)
    pub fn dark() -> Self {
        Self {
            name: ThemeName::Dark,

            fg: Color::White,
            muted: Color::DarkGray,
            border: Color::DarkGray,
            border_focused: Color::Cyan,

            positive: Color::Rgb(0, 200, 0),
            info: Color::Rgb(80, 160, 255),
            warning: Color::Rgb(255, 180, 0),
            negative: Color::Rgb(255, 80, 80),

            selected_bg: Color::Rgb(60, 60, 80),
            selected_fg: Color::White,
            header_bg: Color::Rgb(40, 80, 120),
            header_fg: Color::White,
            banner_bg: Color::Rgb(90, 20, 20),
            input_invalid: Color::Rgb(255, 100, 100),
        }
    }

    /// Create a light theme
    /// Uses darker, more saturated colors for visibility on light backgrounds
    pub fn light() -> Self {
        Self {
            name: ThemeName::Light,

            fg: Color::Black,
            muted: Color::Rgb(100, 100, 100),
            border: Color::Rgb(120, 120, 120),
            border_focused: Color::Rgb(0, 100, 180),

            positive: Color::Rgb(0, 140, 0),
            info: Color::Rgb(0, 80, 180),
            warning: Color::Rgb(200, 120, 0),
            negative: Color::Rgb(200, 0, 0),

            selected_bg: Color::Rgb(200, 220, 255),
            selected_fg: Color::Black,
            header_bg: Color::Rgb(180, 200, 230),
            header_fg: Color::Black,
            banner_bg: Color::Rgb(255, 210, 210),
            input_invalid: Color::Rgb(200, 0, 0),
        }
    }

    /// Create theme from name string
    pub fn from_name(name: &str) -> Self {
        match ThemeName::parse(name) {
            ThemeName::Dark => Self::dark(),
            ThemeName::Light => Self::light(),
        }
    }

    /// Color of a table cell tone
    pub fn tone(&self, tone: Tone) -> Color {
        match tone {
            Tone::Plain => self.fg,
            Tone::Positive => self.positive,
            Tone::Info => self.info,
            Tone::Warning => self.warning,
            Tone::Negative => self.negative,
            Tone::Muted => self.muted,
        }
    }

    /// Color of a toast by level
    pub fn level(&self, level: Level) -> Color {
        match level {
            Level::Success => self.positive,
            Level::Info => self.info,
            Level::Warning => self.warning,
            Level::Error => self.negative,
        }
    }

    /// Percentage gauge color (higher is healthier)
    pub fn share_color(&self, percent: f64) -> Color {
        if percent >= 75.0 {
            self.positive
        } else if percent >= 50.0 {
            self.warning
        } else {
            self.negative
        }
    }
}
