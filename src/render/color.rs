//! Colours and themes
//!
//! The engine never picks colour values itself. It receives a `Theme` and only
//! decides how roles combine (opacity, label contrast).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 8-bit RGBA colour, serialized as `#rrggbb` or `#rrggbbaa`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Same colour with opacity `alpha` in `[0, 1]`
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    pub fn opacity(&self) -> f64 {
        self.a as f64 / 255.0
    }

    /// True when the RGB channels match, ignoring alpha
    pub fn same_rgb(&self, other: &Color) -> bool {
        (self.r, self.g, self.b) == (other.r, other.g, other.b)
    }

    /// WCAG relative luminance in `[0, 1]`
    pub fn luminance(&self) -> f64 {
        fn linear(channel: u8) -> f64 {
            let c = channel as f64 / 255.0;
            if c <= 0.039_28 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * linear(self.r) + 0.7152 * linear(self.g) + 0.0722 * linear(self.b)
    }
}

impl FromStr for Color {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Color {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: if hex.len() == 8 { channel(6)? } else { 255 },
        })
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

/// Named colour roles used by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub background: Color,
    /// Fill of inactive nodes
    pub base: Color,
    /// Fill of active nodes
    pub highlight: Color,
    /// Highlighted edges and triangles
    pub accent: Color,
    /// Static lattice edges
    pub edge: Color,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            background: Color::rgb(0xfa, 0xfa, 0xf7),
            base: Color::rgb(0xdd, 0xe3, 0xea),
            highlight: Color::rgb(0x2f, 0x4b, 0xa8),
            accent: Color::rgb(0xe4, 0x57, 0x2e),
            edge: Color::rgb(0xa3, 0xad, 0xb8),
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Color::rgb(0x12, 0x15, 0x1a),
            base: Color::rgb(0x2e, 0x34, 0x40),
            highlight: Color::rgb(0x88, 0xc0, 0xd0),
            accent: Color::rgb(0xeb, 0xcb, 0x8b),
            edge: Color::rgb(0x4c, 0x56, 0x6a),
        }
    }

    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::light()),
            "dark" => Ok(Self::dark()),
            _ => Err(ConfigError::UnknownTheme(name.to_string())),
        }
    }

    /// Text colour for a label drawn over a node filled with `fill`
    ///
    /// Picks whichever of `base` / `highlight` sits on the other side of
    /// their luminance midpoint. A fill equal to `accent` always gets white.
    pub fn label_color(&self, fill: Color) -> Color {
        if fill.same_rgb(&self.accent) {
            return Color::WHITE;
        }

        let (dark, light) = if self.base.luminance() <= self.highlight.luminance() {
            (self.base, self.highlight)
        } else {
            (self.highlight, self.base)
        };
        let midpoint = (dark.luminance() + light.luminance()) / 2.0;
        if fill.luminance() > midpoint {
            dark
        } else {
            light
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}
