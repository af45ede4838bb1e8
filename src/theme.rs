//! Theme definitions and light/dark preference persistence

use eframe::egui::Color32;
use std::path::Path;
use std::str::FromStr;

const THEME_FILE: &str = "theme";

/// Which of the two built-in palettes is active.
///
/// The preference lives in its own fixed file next to the session
/// credential and survives restarts. Light is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeKind {
    #[default]
    Light,
    Dark,
}

impl ThemeKind {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn palette(&self) -> Theme {
        match self {
            Self::Light => Theme::light(),
            Self::Dark => Theme::dark(),
        }
    }

    /// Load the persisted preference; unknown or missing content means the
    /// default.
    pub fn load(config_dir: &Path) -> Self {
        match std::fs::read_to_string(config_dir.join(THEME_FILE)) {
            Ok(raw) => raw.trim().parse().unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, config_dir: &Path) {
        if let Err(e) = std::fs::create_dir_all(config_dir) {
            log::warn!("Failed to create config dir: {}", e);
        }
        if let Err(e) = std::fs::write(config_dir.join(THEME_FILE), self.as_str()) {
            log::warn!("Failed to persist theme preference: {}", e);
        }
    }
}

impl FromStr for ThemeKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(()),
        }
    }
}

/// Color palette applied to the egui visuals.
#[derive(Clone, Copy)]
pub struct Theme {
    pub bg: Color32,
    pub panel_bg: Color32,
    pub input_bg: Color32,

    pub fg: Color32,
    pub fg_dim: Color32,

    pub accent: Color32,
    pub success: Color32,
    pub warning: Color32,
    pub error: Color32,

    pub border: Color32,
    pub selection: Color32,
    pub list_hover: Color32,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            bg: Color32::from_rgb(30, 30, 30),       // #1e1e1e
            panel_bg: Color32::from_rgb(37, 37, 38), // #252526
            input_bg: Color32::from_rgb(60, 60, 60), // #3c3c3c

            fg: Color32::from_rgb(204, 204, 204),     // #cccccc
            fg_dim: Color32::from_rgb(128, 128, 128), // #808080

            accent: Color32::from_rgb(0, 120, 212),  // #0078d4
            success: Color32::from_rgb(63, 185, 80), // #3fb950
            warning: Color32::from_rgb(204, 167, 0), // #cca700
            error: Color32::from_rgb(248, 81, 73),   // #f85149

            border: Color32::from_rgb(60, 60, 60), // #3c3c3c
            selection: Color32::from_rgb(38, 79, 120), // #264f78
            list_hover: Color32::from_rgb(42, 45, 46), // #2a2d2e
        }
    }

    pub fn light() -> Self {
        Self {
            bg: Color32::from_rgb(255, 255, 255),       // #ffffff
            panel_bg: Color32::from_rgb(243, 243, 243), // #f3f3f3
            input_bg: Color32::from_rgb(255, 255, 255), // #ffffff

            fg: Color32::from_rgb(51, 51, 51),        // #333333
            fg_dim: Color32::from_rgb(128, 128, 128), // #808080

            accent: Color32::from_rgb(0, 120, 212),  // #0078d4
            success: Color32::from_rgb(40, 160, 40), // green
            warning: Color32::from_rgb(180, 130, 0), // amber
            error: Color32::from_rgb(200, 50, 50),   // red

            border: Color32::from_rgb(200, 200, 200), // light gray
            selection: Color32::from_rgb(173, 214, 255), // light blue selection
            list_hover: Color32::from_rgb(232, 232, 232), // very light gray
        }
    }
}
