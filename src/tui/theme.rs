//! TUI color semantics and style values.
//!
//! One immutable `Theme` is built at start-up from the `[theme]` config
//! section and shared as `Arc<Theme>` with every screen and component.
//!
//! Color semantics:
//! - Primary (purple): titles, focus, cursor
//! - Secondary (pink): section headers, modifiers
//! - Success / warning / error: HP bands, status lines
//! - Muted (gray): borders, help, de-emphasized text
//! - Highlight (light purple): selected rows

use std::str::FromStr;

use log::warn;
use ratatui::style::{Color, Modifier, Style};

use crate::core::config::ThemeConfig;

// ============================================================================
// DEFAULT PALETTE
// ============================================================================

pub const PRIMARY: Color = Color::Rgb(0x7C, 0x3A, 0xED);
pub const SECONDARY: Color = Color::Rgb(0xEC, 0x48, 0x99);
pub const SUCCESS: Color = Color::Rgb(0x10, 0xB9, 0x81);
pub const WARNING: Color = Color::Rgb(0xF5, 0x9E, 0x0B);
pub const ERROR: Color = Color::Rgb(0xEF, 0x44, 0x44);
pub const MUTED: Color = Color::Rgb(0x6B, 0x72, 0x80);
pub const HIGHLIGHT: Color = Color::Rgb(0xA7, 0x8B, 0xFA);
const FOREGROUND: Color = Color::Rgb(0xF9, 0xFA, 0xFB);
const SELECTED_BG: Color = Color::Rgb(0x37, 0x41, 0x51);

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub primary: Color,
    pub secondary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub muted: Color,
    pub highlight: Color,

    pub text: Style,
    pub muted_text: Style,
    pub title: Style,
    pub subtitle: Style,
    pub header: Style,
    pub border: Style,
    pub border_focused: Style,
    pub selected: Style,
    pub cursor: Style,
    pub help: Style,
    pub error_text: Style,
    pub success_text: Style,
    pub warning_text: Style,
    pub button: Style,
    pub button_focused: Style,
    pub stat_value: Style,
    pub stat_mod: Style,
    pub stat_label: Style,
    pub proficient: Style,
    pub tab_active: Style,
    pub tab_inactive: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_palette(PRIMARY, SECONDARY, SUCCESS, WARNING, ERROR, MUTED, HIGHLIGHT)
    }
}

impl Theme {
    /// Build from config, falling back to the default palette for unset or
    /// unparseable colours.
    pub fn from_config(config: &ThemeConfig) -> Self {
        Self::from_palette(
            parse_color(config.primary.as_deref(), PRIMARY),
            parse_color(config.secondary.as_deref(), SECONDARY),
            parse_color(config.success.as_deref(), SUCCESS),
            parse_color(config.warning.as_deref(), WARNING),
            parse_color(config.error.as_deref(), ERROR),
            parse_color(config.muted.as_deref(), MUTED),
            parse_color(config.highlight.as_deref(), HIGHLIGHT),
        )
    }

    fn from_palette(
        primary: Color,
        secondary: Color,
        success: Color,
        warning: Color,
        error: Color,
        muted: Color,
        highlight: Color,
    ) -> Self {
        let bold = Modifier::BOLD;
        Self {
            primary,
            secondary,
            success,
            warning,
            error,
            muted,
            highlight,

            text: Style::new().fg(FOREGROUND),
            muted_text: Style::new().fg(muted),
            title: Style::new().fg(primary).add_modifier(bold),
            subtitle: Style::new().fg(muted).add_modifier(Modifier::ITALIC),
            header: Style::new().fg(secondary).add_modifier(bold),
            border: Style::new().fg(muted),
            border_focused: Style::new().fg(primary),
            selected: Style::new().fg(highlight).bg(SELECTED_BG).add_modifier(bold),
            cursor: Style::new().fg(primary).add_modifier(bold),
            help: Style::new().fg(muted),
            error_text: Style::new().fg(error).add_modifier(bold),
            success_text: Style::new().fg(success).add_modifier(bold),
            warning_text: Style::new().fg(warning),
            button: Style::new().fg(FOREGROUND).bg(muted),
            button_focused: Style::new().fg(FOREGROUND).bg(primary).add_modifier(bold),
            stat_value: Style::new().fg(primary).add_modifier(bold),
            stat_mod: Style::new().fg(secondary),
            stat_label: Style::new().fg(muted),
            proficient: Style::new().fg(success),
            tab_active: Style::new().fg(FOREGROUND).bg(primary).add_modifier(bold),
            tab_inactive: Style::new().fg(muted),
        }
    }

    /// HP colour band: error at or below a quarter, warning at or below half.
    pub fn hp_style(&self, current: i32, max: i32) -> Style {
        let color = if max <= 0 || current * 4 <= max {
            self.error
        } else if current * 2 <= max {
            self.warning
        } else {
            self.success
        };
        Style::new().fg(color).add_modifier(Modifier::BOLD)
    }
}

fn parse_color(value: Option<&str>, fallback: Color) -> Color {
    match value {
        None => fallback,
        Some(raw) => Color::from_str(raw.trim()).unwrap_or_else(|_| {
            warn!("Unrecognized theme colour {:?}, using default", raw);
            fallback
        }),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_palette_matches_brand_colors() {
        let theme = Theme::default();
        assert_eq!(theme.primary, Color::Rgb(0x7C, 0x3A, 0xED));
        assert_eq!(theme.title.fg, Some(theme.primary));
        assert!(theme.title.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn config_overrides_and_bad_values_fall_back() {
        let config = ThemeConfig {
            primary: Some("#112233".to_string()),
            error: Some("not-a-colour".to_string()),
            ..Default::default()
        };
        let theme = Theme::from_config(&config);
        assert_eq!(theme.primary, Color::Rgb(0x11, 0x22, 0x33));
        assert_eq!(theme.error, ERROR);
        assert_eq!(theme.muted, MUTED);
    }

    #[test]
    fn hp_bands() {
        let theme = Theme::default();
        assert_eq!(theme.hp_style(20, 20).fg, Some(SUCCESS));
        assert_eq!(theme.hp_style(10, 20).fg, Some(WARNING));
        assert_eq!(theme.hp_style(5, 20).fg, Some(ERROR));
        assert_eq!(theme.hp_style(0, 0).fg, Some(ERROR));
    }
}
