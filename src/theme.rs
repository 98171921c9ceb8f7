//! Theme loading: btop-style `theme[key]="value"` files, hex → ratatui Color.

use crate::ColorScheme;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Board and HUD colours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Tile backgrounds, indexed by regular symbol id.
    pub tiles: [Color; 6],
    /// Background of power-up tiles.
    pub special: Color,
    pub bg: Color,
    pub border: Color,
    pub text: Color,
    pub title: Color,
    pub cursor: Color,
    pub selection: Color,
    /// Low-time gauge and error lines.
    pub warning: Color,
    pub inactive: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

const ONEDARK_TILES: [Color; 6] = [
    Color::Rgb(0x98, 0xC3, 0x79),
    Color::Rgb(0xE5, 0xC0, 0x7B),
    Color::Rgb(0xE0, 0x6C, 0x75),
    Color::Rgb(0x61, 0xAF, 0xEF),
    Color::Rgb(0xC6, 0x78, 0xDD),
    Color::Rgb(0x56, 0xB6, 0xC2),
];

const HIGH_CONTRAST_TILES: [Color; 6] = [
    Color::Rgb(0x00, 0xFF, 0x00),
    Color::Rgb(0xFF, 0xFF, 0x00),
    Color::Rgb(0xFF, 0x00, 0x00),
    Color::Rgb(0x00, 0x88, 0xFF),
    Color::Rgb(0xFF, 0x00, 0xFF),
    Color::Rgb(0x00, 0xFF, 0xFF),
];

// blue / orange / teal first so no pair of neighbouring ids leans on red vs green
const COLORBLIND_TILES: [Color; 6] = [
    Color::Rgb(0x00, 0x77, 0xBB),
    Color::Rgb(0xEE, 0x77, 0x33),
    Color::Rgb(0x00, 0x99, 0x88),
    Color::Rgb(0xCC, 0x33, 0x11),
    Color::Rgb(0xEE, 0x33, 0x77),
    Color::Rgb(0xBB, 0xBB, 0x00),
];

impl Default for Theme {
    fn default() -> Self {
        Self::onedark()
    }
}

impl Theme {
    pub fn onedark() -> Self {
        Self {
            tiles: ONEDARK_TILES,
            special: Color::Rgb(0x28, 0x2C, 0x34),
            bg: Color::Rgb(0x31, 0x35, 0x3F),
            border: Color::Rgb(0x3F, 0x44, 0x4F),
            text: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
            cursor: Color::Rgb(0xFF, 0xFF, 0xFF),
            selection: Color::Rgb(0xE5, 0xC0, 0x7B),
            warning: Color::Rgb(0xE0, 0x6C, 0x75),
            inactive: Color::Rgb(0x5C, 0x63, 0x70),
        }
    }

    /// Reads a btop-style theme file. Missing path or file means One Dark.
    pub fn load(path: Option<&Path>, scheme: ColorScheme) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => {
                Self::from_map(&parse_theme_file(&std::fs::read_to_string(p)?))
            }
            _ => Self::onedark(),
        };
        theme.apply_scheme(scheme);
        Ok(theme)
    }

    /// Overrides tile colours for the accessibility schemes.
    pub fn apply_scheme(&mut self, scheme: ColorScheme) {
        match scheme {
            ColorScheme::Normal => {}
            ColorScheme::HighContrast => self.tiles = HIGH_CONTRAST_TILES,
            ColorScheme::Colorblind => self.tiles = COLORBLIND_TILES,
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |keys: &[&str]| {
            keys.iter().find_map(|k| map.get(*k).and_then(|v| parse_hex(v).ok()))
        };
        let d = Self::onedark();
        Self {
            tiles: [
                get(&["mem_box", "cpu_start"]).unwrap_or(d.tiles[0]),
                get(&["title", "cpu_mid"]).unwrap_or(d.tiles[1]),
                get(&["cpu_end", "temp_end"]).unwrap_or(d.tiles[2]),
                get(&["cpu_box"]).unwrap_or(d.tiles[3]),
                get(&["net_box"]).unwrap_or(d.tiles[4]),
                get(&["hi_fg", "proc_misc"]).unwrap_or(d.tiles[5]),
            ],
            special: get(&["main_bg"]).unwrap_or(d.special),
            bg: get(&["meter_bg"]).unwrap_or(d.bg),
            border: get(&["div_line"]).unwrap_or(d.border),
            text: get(&["main_fg"]).unwrap_or(d.text),
            title: get(&["title"]).unwrap_or(d.title),
            cursor: get(&["selected_fg"]).unwrap_or(d.cursor),
            selection: get(&["selected_bg", "title"]).unwrap_or(d.selection),
            warning: get(&["cpu_end"]).unwrap_or(d.warning),
            inactive: get(&["inactive_fg"]).unwrap_or(d.inactive),
        }
    }

    #[inline]
    pub fn tile_color(&self, id: u8) -> Color {
        self.tiles[id as usize % self.tiles.len()]
    }
}

/// Parses btop-style lines into a key → value map; comments and blank lines are skipped.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(rest) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some((key, value)) = rest.split_once(']') else {
            continue;
        };
        let Some((_, value)) = value.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'');
        if !value.is_empty() {
            map.insert(key.trim().to_string(), value.to_string());
        }
    }
    map
}

/// "#RRGGBB" or "#RGB".
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let hex = s.trim().trim_start_matches('#');
    let bad = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>, scale: u8| {
        hex.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .map(|v| v * scale)
            .ok_or_else(bad)
    };
    match hex.len() {
        6 => Ok(Color::Rgb(channel(0..2, 1)?, channel(2..4, 1)?, channel(4..6, 1)?)),
        3 => Ok(Color::Rgb(channel(0..1, 17)?, channel(1..2, 17)?, channel(2..3, 17)?)),
        _ => Err(bad()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        assert_eq!(parse_hex("#98C379").unwrap(), Color::Rgb(0x98, 0xC3, 0x79));
    }

    #[test]
    fn test_parse_hex_3() {
        assert_eq!(parse_hex("#FFF").unwrap(), Color::Rgb(255, 255, 255));
    }

    #[test]
    fn test_parse_hex_rejects_junk() {
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#GGHHII").is_err());
        assert!(parse_hex("").is_err());
    }

    #[test]
    fn test_parse_theme_lines() {
        let map = parse_theme_file(
            r##"
# comment
theme[meter_bg]="#31353F"
theme[title]='#FF0000'
theme[empty]=""
"##,
        );
        assert_eq!(map.get("meter_bg").map(String::as_str), Some("#31353F"));
        assert_eq!(map.get("title").map(String::as_str), Some("#FF0000"));
        assert!(!map.contains_key("empty"));
    }

    #[test]
    fn test_theme_file_overrides_defaults() {
        let mut map = HashMap::new();
        map.insert("title".to_string(), "#010203".to_string());
        let t = Theme::from_map(&map);
        assert_eq!(t.title, Color::Rgb(1, 2, 3));
        assert_eq!(t.tiles[1], Color::Rgb(1, 2, 3));
        assert_eq!(t.bg, Theme::onedark().bg);
    }

    #[test]
    fn test_schemes_swap_tiles_only() {
        let mut t = Theme::onedark();
        t.apply_scheme(ColorScheme::Colorblind);
        assert_eq!(t.tiles, COLORBLIND_TILES);
        assert_eq!(t.bg, Theme::onedark().bg);
        assert_eq!(t.tile_color(7), COLORBLIND_TILES[1]);
    }
}
