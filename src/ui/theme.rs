use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;
use tracing::warn;

use crate::constants::custom_theme_path;

/// All available built-in theme names, in cycle order.
pub const BUILTIN_THEME_NAMES: &[&str] = &["ocean", "sand", "day"];

/// Data-driven theme: five colors from which every style is computed.
/// Constructed from built-in presets or loaded from TOML files.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,
    pub accent: Color,
    /// Background of the summary and content title bands.
    pub accent_dark: Color,
    /// Primary text.
    pub ink: Color,
    pub muted: Color,
    pub background: Color,
}

impl Theme {
    // ── Constructors ─────────────────────────────────────────

    /// Teal on near-black. The starting theme.
    pub fn ocean() -> Self {
        Self {
            name: "ocean".to_string(),
            accent: Color::Rgb(0x34, 0xB3, 0xA0),
            accent_dark: Color::Rgb(0x0F, 0x2E, 0x2B),
            ink: Color::Rgb(0xE6, 0xED, 0xF3),
            muted: Color::Rgb(0x8A, 0xA1, 0xA8),
            background: Color::Rgb(0x0B, 0x11, 0x15),
        }
    }

    /// Warm amber on dark brown.
    pub fn sand() -> Self {
        Self {
            name: "sand".to_string(),
            accent: Color::Rgb(0xD7, 0xA8, 0x6E),
            accent_dark: Color::Rgb(0x33, 0x28, 0x19),
            ink: Color::Rgb(0xF2, 0xE8, 0xD5),
            muted: Color::Rgb(0xB8, 0xA3, 0x87),
            background: Color::Rgb(0x1A, 0x14, 0x0D),
        }
    }

    /// Light theme.
    pub fn day() -> Self {
        Self {
            name: "day".to_string(),
            accent: Color::Rgb(0x3B, 0x82, 0xF6),
            accent_dark: Color::Rgb(0xE6, 0xEE, 0xF9),
            ink: Color::Rgb(0x0B, 0x12, 0x20),
            muted: Color::Rgb(0x50, 0x60, 0x72),
            background: Color::Rgb(0xF7, 0xFA, 0xFF),
        }
    }

    /// Look up a built-in theme by name (case-insensitive).
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "ocean" => Some(Self::ocean()),
            "sand" => Some(Self::sand()),
            "day" => Some(Self::day()),
            _ => None,
        }
    }

    /// Built-in theme, else `~/.config/perfmon/themes/<name>.toml`, else
    /// Ocean.
    pub fn resolve(name: &str) -> Self {
        if let Some(theme) = Self::by_name(name) {
            return theme;
        }
        let path = custom_theme_path(name);
        Self::from_toml_file(&path).unwrap_or_else(|| {
            warn!(theme = name, path = %path.display(), "unknown theme, using ocean");
            Self::ocean()
        })
    }

    /// Cycle to the next built-in theme. Custom themes continue with the
    /// second built-in.
    pub fn next_builtin(&self) -> Self {
        let idx = BUILTIN_THEME_NAMES
            .iter()
            .position(|n| n.eq_ignore_ascii_case(&self.name))
            .unwrap_or(0);
        let next_idx = (idx + 1) % BUILTIN_THEME_NAMES.len();
        Self::by_name(BUILTIN_THEME_NAMES[next_idx]).unwrap_or_else(Self::ocean)
    }

    /// Load a custom theme from a TOML file, falling back to Ocean for missing fields.
    pub fn from_toml_file(path: &std::path::Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        let file: ThemeFile = match toml::from_str(&content) {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid theme file");
                return None;
            }
        };
        Some(
            file.into_theme(
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("custom"),
            ),
        )
    }

    // ── Computed Styles ──────────────────────────────────────

    /// Tab bar row, footer and info lines share the plain band.
    pub fn header_style(&self) -> Style {
        Style::default().fg(self.ink).bg(self.background)
    }

    pub fn tab_active_style(&self) -> Style {
        Style::default()
            .fg(self.background)
            .bg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn tab_inactive_style(&self) -> Style {
        Style::default().fg(self.muted).bg(self.background)
    }

    pub fn tab_disabled_style(&self) -> Style {
        self.tab_inactive_style().add_modifier(Modifier::DIM)
    }

    pub fn overflow_style(&self) -> Style {
        Style::default().fg(self.muted).bg(self.background)
    }

    pub fn summary_style(&self) -> Style {
        Style::default().fg(self.ink).bg(self.accent_dark)
    }

    pub fn info_style(&self) -> Style {
        Style::default().fg(self.ink).bg(self.background)
    }

    pub fn footer_style(&self) -> Style {
        Style::default().fg(self.muted).bg(self.background)
    }

    pub fn content_style(&self) -> Style {
        Style::default().fg(self.ink).bg(self.background)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.muted)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::ocean()
    }
}

// ── TOML deserialization for custom themes ──────────────────

/// Intermediate struct for parsing theme TOML files.
/// All fields are optional; missing fields inherit from Ocean.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ThemeFile {
    accent: Option<String>,
    accent_dark: Option<String>,
    ink: Option<String>,
    muted: Option<String>,
    background: Option<String>,
}

impl ThemeFile {
    fn into_theme(self, name: &str) -> Theme {
        let base = Theme::ocean();
        Theme {
            name: name.to_string(),
            accent: parse_color(&self.accent).unwrap_or(base.accent),
            accent_dark: parse_color(&self.accent_dark).unwrap_or(base.accent_dark),
            ink: parse_color(&self.ink).unwrap_or(base.ink),
            muted: parse_color(&self.muted).unwrap_or(base.muted),
            background: parse_color(&self.background).unwrap_or(base.background),
        }
    }
}

/// Parse a hex color string like "#FF8800" or "FF8800" into a ratatui Color.
fn parse_color(opt: &Option<String>) -> Option<Color> {
    let s = opt.as_ref()?;
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}
