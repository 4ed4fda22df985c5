use ratatui::style::Color;
use std::sync::atomic::{AtomicUsize, Ordering};

// Color palette structure
#[derive(Clone)]
pub struct Base16Palette {
    pub base_00: Color, // Background
    pub base_01: Color, // Lighter background
    pub base_02: Color, // Selection background
    pub base_03: Color, // Comments, invisibles
    pub base_04: Color, // Dark foreground
    pub base_05: Color, // Default foreground
    pub base_06: Color, // Light foreground
    pub base_07: Color, // Light background
    pub base_08: Color, // Red
    pub base_09: Color, // Orange
    pub base_0a: Color, // Yellow
    pub base_0b: Color, // Green
    pub base_0c: Color, // Cyan
    pub base_0d: Color, // Blue
    pub base_0e: Color, // Purple
    pub base_0f: Color, // Brown
}

impl Base16Palette {
    /// Border and text colors for a panel depending on focus.
    pub fn panel_colors(&self, focused: bool) -> (Color, Color) {
        if focused {
            (self.base_0d, self.base_06)
        } else {
            (self.base_02, self.base_05)
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ThemeId {
    OceanicNext = 0,
    CatppuccinMocha = 1,
}

impl ThemeId {
    pub fn name(&self) -> &'static str {
        match self {
            ThemeId::OceanicNext => "Oceanic Next",
            ThemeId::CatppuccinMocha => "Catppuccin Mocha",
        }
    }

    pub fn all() -> &'static [ThemeId] {
        &[ThemeId::OceanicNext, ThemeId::CatppuccinMocha]
    }

    fn from_index(idx: usize) -> Self {
        match idx {
            0 => ThemeId::OceanicNext,
            1 => ThemeId::CatppuccinMocha,
            _ => ThemeId::OceanicNext,
        }
    }
}

static CURRENT_THEME_INDEX: AtomicUsize = AtomicUsize::new(0);

pub fn current_theme_id() -> ThemeId {
    ThemeId::from_index(CURRENT_THEME_INDEX.load(Ordering::Relaxed))
}

pub fn set_theme(theme: ThemeId) {
    CURRENT_THEME_INDEX.store(theme as usize, Ordering::Relaxed);
}

pub fn current_theme() -> &'static Base16Palette {
    match current_theme_id() {
        ThemeId::OceanicNext => &OCEANIC_NEXT_PALETTE,
        ThemeId::CatppuccinMocha => &CATPPUCCIN_MOCHA_PALETTE,
    }
}

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

// Oceanic Next theme
static OCEANIC_NEXT_PALETTE: Base16Palette = Base16Palette {
    base_00: rgb(0x1B2B34),
    base_01: rgb(0x343D46),
    base_02: rgb(0x4F5B66),
    base_03: rgb(0x65737E),
    base_04: rgb(0xA7ADBA),
    base_05: rgb(0xC0C5CE),
    base_06: rgb(0xCDD3DE),
    base_07: rgb(0xF0F4F8),
    base_08: rgb(0xEC5F67),
    base_09: rgb(0xF99157),
    base_0a: rgb(0xFAC863),
    base_0b: rgb(0x99C794),
    base_0c: rgb(0x5FB3B3),
    base_0d: rgb(0x6699CC),
    base_0e: rgb(0xC594C5),
    base_0f: rgb(0xAB7967),
};

// Catppuccin Mocha theme
// Mapped from: base=#1E1E2E, surface0=#313244, surface1=#45475A, overlay0=#6C7086
// overlay1=#7F849C, subtext0=#A6ADC8, text=#CDD6F4, rosewater=#F5E0DC
// red=#F38BA8, peach=#FAB387, yellow=#F9E2AF, green=#A6E3A1
// teal=#94E2D5, blue=#89B4FA, mauve=#CBA6F7, maroon=#EBA0AC
static CATPPUCCIN_MOCHA_PALETTE: Base16Palette = Base16Palette {
    base_00: rgb(0x1E1E2E),
    base_01: rgb(0x313244),
    base_02: rgb(0x45475A),
    base_03: rgb(0x6C7086),
    base_04: rgb(0x7F849C),
    base_05: rgb(0xA6ADC8),
    base_06: rgb(0xCDD6F4),
    base_07: rgb(0xF5E0DC),
    base_08: rgb(0xF38BA8),
    base_09: rgb(0xFAB387),
    base_0a: rgb(0xF9E2AF),
    base_0b: rgb(0xA6E3A1),
    base_0c: rgb(0x94E2D5),
    base_0d: rgb(0x89B4FA),
    base_0e: rgb(0xCBA6F7),
    base_0f: rgb(0xEBA0AC),
};

impl Base16Palette {
    /// Color-coded severity for toast notifications.
    pub fn notification_accent(&self, level: crate::notification::NotificationLevel) -> Color {
        use crate::notification::NotificationLevel;
        match level {
            NotificationLevel::Info => self.base_0d,
            NotificationLevel::Warning => self.base_0a,
            NotificationLevel::Error => self.base_08,
        }
    }
}
