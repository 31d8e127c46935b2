//! Path resolution for converge
//!
//! # Environment Variables
//!
//! - `CONVERGE_CONFIG_DIR` - Override the settings directory
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `CONVERGE_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/converge` (if set)
//! 3. `dirs::config_dir()/converge`:
//!    - Windows: `%APPDATA%\converge`
//!    - macOS: `~/Library/Application Support/converge`
//!    - Linux: `~/.config/converge`

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "CONVERGE_CONFIG_DIR";

/// Get the converge config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("converge");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    default_config_dir()
}

/// `<platform config dir>/converge`
///
/// `%APPDATA%` on Windows, `~/Library/Application Support` on macOS and
/// `~/.config` elsewhere.
fn default_config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    let path = base.join("converge");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Expand ~ and environment variables in a path string.
///
/// Unknown variables are left as written.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    /// Helper to run a test with temporary env var
    fn with_env_var<F, R>(key: &str, value: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: only this test touches this variable
        unsafe { env::set_var(key, value) };
        let result = f();
        match original {
            // SAFETY: only this test touches this variable
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }
        result
    }

    #[test]
    fn test_config_dir_env_override() {
        with_env_var(ENV_CONFIG_DIR, "/custom/converge", || {
            let result = config_dir().unwrap();
            assert_eq!(result, PathBuf::from("/custom/converge"));
        });
    }

    #[test]
    fn test_default_config_dir_follows_platform() {
        let expected = dirs::config_dir().unwrap().join("converge");
        assert_eq!(default_config_dir().unwrap(), expected);
    }

    #[test]
    fn test_expand_with_tilde() {
        let result = expand("~/modules/base.toml");
        let home = dirs::home_dir().unwrap();
        assert_eq!(result, home.join("modules").join("base.toml"));
    }

    #[test]
    fn test_expand_absolute() {
        assert_eq!(expand("/etc/motd"), PathBuf::from("/etc/motd"));
    }

    #[test]
    fn test_expand_with_env_var() {
        with_env_var("CONVERGE_TEST_VAR", "value", || {
            let result = expand("/srv/$CONVERGE_TEST_VAR/file");
            assert_eq!(result, PathBuf::from("/srv/value/file"));
        });
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        let result = expand("/srv/$NONEXISTENT_CONVERGE_VAR_12345/file");
        assert_eq!(
            result,
            PathBuf::from("/srv/$NONEXISTENT_CONVERGE_VAR_12345/file")
        );
    }
}
