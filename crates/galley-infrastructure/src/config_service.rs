//! Configuration service implementation.
//!
//! Loads [`GalleyConfig`] from a TOML file, either an explicit path or
//! `~/.config/galley/config.toml`.

use crate::paths::GalleyPaths;
use galley_core::config::GalleyConfig;
use galley_core::error::{GalleyError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Configuration service that loads and caches the engine configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    /// `None` means the platform default location.
    path: Option<PathBuf>,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<GalleyConfig>>>,
}

impl ConfigService {
    /// Creates a service reading the default config file.
    pub fn new() -> Self {
        Self {
            path: None,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Creates a service reading `path` (for the CLI `--config` flag and tests).
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// # Errors
    ///
    /// Returns `GalleyError::Config` if the file exists but cannot be read or
    /// parsed. A missing file yields defaults.
    pub fn get_config(&self) -> Result<GalleyConfig> {
        {
            let read_lock = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = self.load()?;

        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = Some(loaded.clone());
        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = None;
    }

    fn load(&self) -> Result<GalleyConfig> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => match GalleyPaths::config_file() {
                Ok(path) => path,
                Err(e) => {
                    tracing::debug!("[ConfigService] {e}; using defaults");
                    return Ok(GalleyConfig::default());
                }
            },
        };
        Self::load_from(&path)
    }

    /// Reads one config file. Missing or empty files yield defaults.
    pub fn load_from(path: &Path) -> Result<GalleyConfig> {
        if !path.exists() {
            tracing::debug!("[ConfigService] {} not found; using defaults", path.display());
            return Ok(GalleyConfig::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            GalleyError::config(format!("Failed to read config file at {}: {e}", path.display()))
        })?;

        if content.trim().is_empty() {
            return Ok(GalleyConfig::default());
        }

        let config = toml::from_str::<GalleyConfig>(&content).map_err(|e| {
            GalleyError::config(format!("Failed to parse TOML from {}: {e}", path.display()))
        })?;

        tracing::info!("[ConfigService] loaded {}", path.display());
        Ok(config)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}
