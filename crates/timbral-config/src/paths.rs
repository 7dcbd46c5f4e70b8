//! Platform-specific configuration paths.
//!
//! - **User config**: `~/.config/timbral/` (Linux), `~/Library/Application Support/timbral/` (macOS), `%APPDATA%\timbral\` (Windows)
//! - **Default settings file**: `settings.toml` inside the user config directory

use std::path::PathBuf;

use crate::error::ConfigError;

/// Application name used for directory paths.
const APP_NAME: &str = "timbral";

/// File name of the user settings.
const SETTINGS_FILE: &str = "settings.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the user settings file. It may not exist.
pub fn default_settings_path() -> PathBuf {
    user_config_dir().join(SETTINGS_FILE)
}

/// Create the user config directory if needed and return it.
pub fn ensure_user_config_dir() -> Result<PathBuf, ConfigError> {
    let dir = user_config_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_path_is_inside_config_dir() {
        let path = default_settings_path();
        assert!(path.starts_with(user_config_dir()));
        assert!(path.ends_with("timbral/settings.toml"));
    }
}
