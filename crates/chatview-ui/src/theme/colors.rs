//! Color definitions for the Chatview theme

/// RGBA color representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    /// Create a new RGBA color from 0-255 values
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    /// Create opaque color from RGB hex (0xRRGGBB)
    pub const fn rgb(hex: u32) -> Self {
        Self::new(
            ((hex >> 16) & 0xFF) as u8,
            ((hex >> 8) & 0xFF) as u8,
            (hex & 0xFF) as u8,
            255,
        )
    }

    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self {
            r: self.r,
            g: self.g,
            b: self.b,
            a: alpha,
        }
    }
}

/// Theme color palette
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // === Backgrounds ===
    pub background: Rgba,
    /// Preview panel and cards
    pub surface: Rgba,
    pub user_bubble: Rgba,
    pub bot_bubble: Rgba,
    /// Status banner background
    pub status_bg: Rgba,
    /// Preformatted text and table cells
    pub code_bg: Rgba,

    // === Brand ===
    pub primary: Rgba,
    pub primary_hover: Rgba,

    // === Text ===
    pub text_primary: Rgba,
    pub text_secondary: Rgba,
    /// Text on primary-colored surfaces
    pub text_on_primary: Rgba,

    // === Status ===
    pub error: Rgba,
    pub live_dot: Rgba,

    // === UI Elements ===
    pub border: Rgba,
    pub hover: Rgba,
}

impl ThemeColors {
    pub fn dark() -> Self {
        Self {
            background: Rgba::rgb(0x111827),
            surface: Rgba::rgb(0x1f2937),
            user_bubble: Rgba::rgb(0x374151),
            bot_bubble: Rgba::rgb(0x1f2937),
            status_bg: Rgba::rgb(0x1e293b),
            code_bg: Rgba::rgb(0x0b1220),

            primary: Rgba::rgb(0x00af83),
            primary_hover: Rgba::rgb(0x00c895),

            text_primary: Rgba::rgb(0xf9fafb),
            text_secondary: Rgba::rgb(0x9ca3af),
            text_on_primary: Rgba::rgb(0xffffff),

            error: Rgba::rgb(0xf87171),
            live_dot: Rgba::rgb(0x34d399),

            border: Rgba::rgb(0x4b5563),
            hover: Rgba::new(0xff, 0xff, 0xff, 0x14),
        }
    }

    pub fn light() -> Self {
        Self {
            background: Rgba::rgb(0xffffff),
            surface: Rgba::rgb(0xf9fafb),
            user_bubble: Rgba::rgb(0xe5e7eb),
            bot_bubble: Rgba::rgb(0xf3f4f6),
            status_bg: Rgba::rgb(0xeff6ff),
            code_bg: Rgba::rgb(0xf3f4f6),

            primary: Rgba::rgb(0x00af83),
            primary_hover: Rgba::rgb(0x008f6b),

            text_primary: Rgba::rgb(0x111827),
            text_secondary: Rgba::rgb(0x6b7280),
            text_on_primary: Rgba::rgb(0xffffff),

            error: Rgba::rgb(0xef4444),
            live_dot: Rgba::rgb(0x10b981),

            border: Rgba::rgb(0xd1d5db),
            hover: Rgba::new(0x00, 0x00, 0x00, 0x0d),
        }
    }
}
