//! Platform-specific configuration paths.
//!
//! - **User config**: `~/.config/automat/` (Linux),
//!   `~/Library/Application Support/automat/` (macOS), `%APPDATA%\automat\`
//!   (Windows)
//! - **Config file**: `config.toml` inside the user config directory
//!
//! # Example
//!
//! ```rust,no_run
//! use automat_config::paths;
//!
//! println!("Config file: {:?}", paths::config_file_path());
//! ```

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "automat";

/// File name of the runtime configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the default location of the runtime configuration file.
pub fn config_file_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE_NAME)
}

/// Ensure the user config directory exists.
///
/// Creates the directory and any parent directories if they don't exist.
pub fn ensure_user_config_dir() -> Result<PathBuf, crate::ConfigError> {
    let dir = user_config_dir();

    if !dir.exists() {
        std::fs::create_dir_all(&dir)
            .map_err(|e| crate::ConfigError::io(crate::FileOp::CreateDir, &dir, e))?;
    }

    Ok(dir)
}
