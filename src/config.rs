//! User settings loaded from `config.toml` in the config directory
//!
//! Every field is optional; command-line flags override what is set here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const SETTINGS_FILE: &str = "config.toml";

/// When to use colored output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color when the terminal supports it
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Parallel jobs per level
    #[serde(default)]
    pub jobs: Option<usize>,

    #[serde(default)]
    pub color: ColorMode,
}

impl Settings {
    /// Load settings from the default config directory
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let dir = crate::paths::config_dir()?;
        Self::load_from(&dir)
    }

    /// Load settings from `dir/config.toml`
    pub fn load_from(dir: &Path) -> Result<Self> {
        let path = dir.join(SETTINGS_FILE);
        if !path.exists() {
            log::debug!("No settings file at {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let settings: Self =
            toml::from_str(&content).with_context(|| format!("Invalid {}", path.display()))?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Jobs to use, preferring an explicit command-line value (at least 1)
    pub fn jobs(&self, flag: Option<usize>) -> usize {
        flag.or(self.jobs)
            .unwrap_or_else(|| declarative::ExecuteOptions::default().jobs)
            .max(1)
    }

    /// Whether output should be colored
    pub fn use_color(&self, no_color_flag: bool) -> bool {
        if no_color_flag {
            return false;
        }
        match self.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => console::colors_enabled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_from(dir.path()).unwrap();
        assert_eq!(settings.jobs, None);
        assert_eq!(settings.color, ColorMode::Auto);
    }

    #[test]
    fn test_load_settings() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            "jobs = 8\ncolor = \"never\"\n",
        )
        .unwrap();

        let settings = Settings::load_from(dir.path()).unwrap();
        assert_eq!(settings.jobs, Some(8));
        assert_eq!(settings.color, ColorMode::Never);
        assert!(!settings.use_color(false));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "colour = \"never\"\n").unwrap();
        assert!(Settings::load_from(dir.path()).is_err());
    }

    #[test]
    fn test_flags_override_settings() {
        let settings = Settings {
            jobs: Some(8),
            color: ColorMode::Always,
        };
        assert_eq!(settings.jobs(Some(2)), 2);
        assert_eq!(settings.jobs(None), 8);
        assert_eq!(Settings::default().jobs(None), 4);
        assert_eq!(settings.jobs(Some(0)), 1);

        assert!(settings.use_color(false));
        assert!(!settings.use_color(true));
    }
}
