use std::path::Path;

use anyhow::{Context, Result};
use zonewalk::CrosswalkConfig;

pub mod build;
pub mod inspect;
pub mod validate;

/// Load the configuration file if one was given, otherwise the defaults.
pub(crate) fn load_config(path: Option<&Path>) -> Result<CrosswalkConfig> {
    match path {
        Some(path) => CrosswalkConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(CrosswalkConfig::default()),
    }
}
