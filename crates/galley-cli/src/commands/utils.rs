use anyhow::{Context, Result};
use galley_core::config::GalleyConfig;
use galley_core::extraction::Channel;
use galley_infrastructure::ConfigService;
use std::path::Path;

/// Loads the config from `path`, or from the user config directory.
pub fn load_config(path: Option<&Path>) -> Result<GalleyConfig> {
    let service = match path {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new(),
    };
    service.get_config().context("Failed to load configuration")
}

pub fn channel(voice: bool) -> Channel {
    if voice { Channel::Voice } else { Channel::Text }
}
