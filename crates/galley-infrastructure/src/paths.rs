//! Path resolution for galley configuration files.
//!
//! ```text
//! ~/.config/galley/       # Config directory (platform default via `dirs`)
//! └── config.toml         # Engine configuration
//! ```

use galley_core::error::{GalleyError, Result};
use std::path::PathBuf;

const APP_DIR: &str = "galley";
const CONFIG_FILE: &str = "config.toml";

/// Unified path management for galley.
pub struct GalleyPaths;

impl GalleyPaths {
    /// Returns the galley configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/galley/`)
    /// - `Err(GalleyError::Config)`: The platform has no config directory
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| GalleyError::config("Cannot find config directory"))
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }
}
