//! Theme system for Chatview
//!
//! Light and dark palettes; the choice follows the stored `theme` key,
//! the configured setting and the system appearance.

mod colors;

pub use colors::*;

use chatview_core::store::is_dark_mode;
use chatview_core::{KeyValueStore, ThemeSetting};
use tracing::warn;

/// Theme configuration
#[derive(Debug, Clone)]
pub struct Theme {
    pub colors: ThemeColors,
    pub spacing: Spacing,
    pub typography: Typography,
    pub is_dark: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            colors: ThemeColors::dark(),
            spacing: Spacing::default(),
            typography: Typography::default(),
            is_dark: true,
        }
    }

    pub fn light() -> Self {
        Self {
            colors: ThemeColors::light(),
            spacing: Spacing::default(),
            typography: Typography::default(),
            is_dark: false,
        }
    }

    /// Resolve the palette. A configured `Dark` forces dark mode; otherwise the
    /// stored theme wins, then the system appearance when set to `System`.
    pub fn resolve(store: &dyn KeyValueStore, setting: ThemeSetting, system_prefers_dark: bool) -> Self {
        let fallback = match setting {
            ThemeSetting::System => system_prefers_dark,
            ThemeSetting::Light => false,
            ThemeSetting::Dark => true,
        };
        let dark = is_dark_mode(store, setting == ThemeSetting::Dark, fallback).unwrap_or_else(|e| {
            warn!("Failed to read stored theme: {}", e);
            fallback
        });
        if dark {
            Self::dark()
        } else {
            Self::light()
        }
    }
}

/// Spacing constants
#[derive(Debug, Clone)]
pub struct Spacing {
    /// Extra small spacing (4px)
    pub xs: f32,
    /// Small spacing (8px)
    pub sm: f32,
    /// Medium spacing (12px)
    pub md: f32,
    /// Large spacing (16px)
    pub lg: f32,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            xs: 4.0,
            sm: 8.0,
            md: 12.0,
            lg: 16.0,
        }
    }
}

/// Typography settings
#[derive(Debug, Clone)]
pub struct Typography {
    pub base_size: f32,
    pub small_size: f32,
    pub header_size: f32,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            base_size: 14.0,
            small_size: 12.0,
            header_size: 16.0,
        }
    }
}

/// Layout constants
pub mod layout {
    /// Preview panel header height in pixels
    pub const PANEL_HEADER_HEIGHT: f32 = 44.0;
    /// Width of the panel's drag handle
    pub const RESIZE_HANDLE_WIDTH: f32 = 4.0;
    /// Maximum width of a message bubble
    pub const BUBBLE_MAX_WIDTH: f32 = 720.0;
    pub const BORDER_RADIUS: f32 = 8.0;
    pub const BORDER_RADIUS_SM: f32 = 4.0;
}
