use crate::error::ConfigError;
use crate::render::{ColorMode, RenderMode};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// User configuration loaded from config file.
/// All fields are optional — CLI flags override config, config overrides defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default render mode
    pub render: Option<RenderModeConfig>,
    /// Default color mode
    pub color: Option<ColorModeConfig>,
    /// Target FPS (1-120)
    pub fps: Option<u32>,
    /// Hide status bar
    pub clean: Option<bool>,
    /// Color quantization step (0 = off, 4/8/16 = coarser colors for less output)
    pub color_quant: Option<u8>,
    /// Write log records to this file
    pub log_file: Option<PathBuf>,
    /// Log level filter (error, warn, info, debug, trace)
    pub log_level: Option<String>,
}

/// Render mode names for config file (kebab-case friendly)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderModeConfig {
    Braille,
    HalfBlock,
    Ascii,
}

impl From<RenderModeConfig> for RenderMode {
    fn from(c: RenderModeConfig) -> Self {
        match c {
            RenderModeConfig::Braille => RenderMode::Braille,
            RenderModeConfig::HalfBlock => RenderMode::HalfBlock,
            RenderModeConfig::Ascii => RenderMode::Ascii,
        }
    }
}

/// Color mode names for config file (kebab-case friendly)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorModeConfig {
    Mono,
    Ansi16,
    Ansi256,
    TrueColor,
}

impl From<ColorModeConfig> for ColorMode {
    fn from(c: ColorModeConfig) -> Self {
        match c {
            ColorModeConfig::Mono => ColorMode::Mono,
            ColorModeConfig::Ansi16 => ColorMode::Ansi16,
            ColorModeConfig::Ansi256 => ColorMode::Ansi256,
            ColorModeConfig::TrueColor => ColorMode::TrueColor,
        }
    }
}

/// Get the config file path: ~/.config/skyburst/config.toml
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("skyburst").join("config.toml"))
}

/// Read a config file. The file must exist.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load config from the default location. Returns default config if the
/// file doesn't exist or can't be used.
pub fn load_config() -> Config {
    config_path().map(|p| load_or_default(&p)).unwrap_or_default()
}

fn load_or_default(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }
    load_from(path).unwrap_or_else(|e| {
        eprintln!("Warning: {e}");
        Config::default()
    })
}

/// Generate a default config file with all options commented out
pub fn default_config_string() -> String {
    r#"# skyburst configuration
# Use --show-config to see the active config file path.
# CLI flags override these settings.

# Default render mode: braille, half-block, ascii
# render = "braille"

# Default color mode: mono, ansi16, ansi256, true-color
# color = "true-color"

# Target FPS (1-120)
# fps = 30

# Hide status bar
# clean = false

# Color quantization step (0 = off, 4/8/16 = coarser colors, less output)
# Useful for slow terminals or tmux
# color_quant = 0

# Log to a file (the display owns the terminal, so logging is off otherwise)
# log_file = "/tmp/skyburst.log"
# log_level = "info"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_string_parses_to_defaults() {
        let config: Config = toml::from_str(&default_config_string()).unwrap();
        assert!(config.render.is_none());
        assert!(config.fps.is_none());
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            render = "half-block"
            color = "ansi256"
            fps = 60
            clean = true
            color_quant = 8
            log_file = "/tmp/sky.log"
            log_level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.render, Some(RenderModeConfig::HalfBlock));
        assert_eq!(RenderMode::from(config.render.unwrap()), RenderMode::HalfBlock);
        assert_eq!(ColorMode::from(config.color.unwrap()), ColorMode::Ansi256);
        assert_eq!(config.fps, Some(60));
        assert_eq!(config.clean, Some(true));
        assert_eq!(config.color_quant, Some(8));
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/sky.log")));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_unknown_render_mode_is_rejected() {
        assert!(toml::from_str::<Config>(r#"render = "sixel""#).is_err());
    }

    #[test]
    fn test_named_file_must_exist() {
        let path = std::env::temp_dir().join("skyburst-no-such-dir").join("typo.tml");
        let err = load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("typo.tml"));
    }

    #[test]
    fn test_missing_default_file_is_default() {
        let path = std::env::temp_dir().join("skyburst-no-such-dir").join("config.toml");
        let config = load_or_default(&path);
        assert!(config.color.is_none());
        assert!(config.fps.is_none());
    }

    #[test]
    fn test_bad_default_file_falls_back() {
        let path = std::env::temp_dir().join(format!("skyburst-fallback-{}.toml", std::process::id()));
        std::fs::write(&path, "fps = \"fast\"").unwrap();
        let config = load_or_default(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(config.fps.is_none());
    }

    #[test]
    fn test_bad_file_reports_path() {
        let path = std::env::temp_dir().join(format!("skyburst-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "fps = \"fast\"").unwrap();
        let err = load_from(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("skyburst-bad-"));
    }
}
