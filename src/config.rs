//! Engine configuration
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```toml
//! layout = "columns"
//! debounce_ms = 50
//! theme = "dark"
//!
//! [export]
//! width = 1920
//! height = 1080
//! frame_rate = 60.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::active::FALLBACK_INTERVAL;
use crate::error::ConfigError;
use crate::lattice::LayoutKind;
use crate::render::Theme;

/// Either a preset name or a full set of colours
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThemeSetting {
    Preset(String),
    Custom(Theme),
}

impl ThemeSetting {
    pub fn resolve(&self) -> Result<Theme, ConfigError> {
        match self {
            ThemeSetting::Preset(name) => Theme::preset(name),
            ThemeSetting::Custom(theme) => Ok(*theme),
        }
    }
}

impl Default for ThemeSetting {
    fn default() -> Self {
        ThemeSetting::Preset("light".to_string())
    }
}

/// Configuration for the live view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub layout: LayoutKind,
    /// Target pixels per lattice unit when density is chosen automatically
    pub preferred_unit: f64,
    /// Lower bound for automatic density
    pub min_density: f64,
    /// Quiet period before coalesced view changes are applied
    pub debounce_ms: u64,
    /// Seconds per step of the no-score animation
    pub fallback_interval: f64,
    pub theme: ThemeSetting,
    pub export: ExportSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            layout: LayoutKind::Rows,
            preferred_unit: 60.0,
            min_density: 4.0,
            debounce_ms: 30,
            fallback_interval: FALLBACK_INTERVAL,
            theme: ThemeSetting::default(),
            export: ExportSettings::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        // Surface bad theme names at load time rather than on first render
        config.theme.resolve()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Responsive density for a viewport: keeps nodes near `preferred_unit`
    /// pixels apart, never below `min_density`
    pub fn auto_density(&self, width: f64, height: f64) -> f64 {
        if self.preferred_unit <= 0.0 {
            return self.min_density;
        }
        ((width + height) / self.preferred_unit).max(self.min_density)
    }
}

/// Configuration for offline frame export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub width: u32,
    pub height: u32,
    /// `None` inherits the live view's density
    pub density: Option<f64>,
    /// Virtual frames per second
    pub frame_rate: f64,
    /// Seconds
    pub start: f64,
    /// Seconds; `None` runs to the end of the score
    pub end: Option<f64>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            density: None,
            frame_rate: 30.0,
            start: 0.0,
            end: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Color;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.debounce_ms, 30);
        assert_eq!(config.export.frame_rate, 30.0);
    }

    #[test]
    fn test_partial_config() {
        let config = EngineConfig::from_toml_str(
            r#"
layout = "b"
theme = "dark"

[export]
width = 1920
height = 1080
density = 24.0
end = 12.5
"#,
        )
        .unwrap();

        assert_eq!(config.layout, LayoutKind::Columns);
        assert_eq!(config.theme.resolve().unwrap(), Theme::dark());
        assert_eq!(config.export.width, 1920);
        assert_eq!(config.export.density, Some(24.0));
        assert_eq!(config.export.end, Some(12.5));
        assert_eq!(config.export.frame_rate, 30.0);
    }

    #[test]
    fn test_custom_theme_table() {
        let config = EngineConfig::from_toml_str(
            r##"
[theme]
background = "#000000"
base = "#202020"
highlight = "#f0f0f0"
accent = "#ff00ff"
edge = "#404040"
"##,
        )
        .unwrap();
        let theme = config.theme.resolve().unwrap();
        assert_eq!(theme.accent, Color::rgb(255, 0, 255));
    }

    #[test]
    fn test_rejects_unknown_theme() {
        let err = EngineConfig::from_toml_str("theme = \"neon\"").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTheme(_)));
    }

    #[test]
    fn test_rejects_bad_toml() {
        assert!(matches!(
            EngineConfig::from_toml_str("debounce_ms = \"soon\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_auto_density() {
        let config = EngineConfig {
            preferred_unit: 50.0,
            min_density: 6.0,
            ..Default::default()
        };
        assert_eq!(config.auto_density(600.0, 400.0), 20.0);
        assert_eq!(config.auto_density(100.0, 100.0), 6.0);

        let degenerate = EngineConfig {
            preferred_unit: 0.0,
            ..config
        };
        assert_eq!(degenerate.auto_density(600.0, 400.0), 6.0);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tonnetz.toml");
        std::fs::write(&path, "debounce_ms = 45\n").unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap().debounce_ms, 45);
        assert!(matches!(
            EngineConfig::load(dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
