use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::settings::types::{ConfigError, PipelineConfig};

/// Environment variable naming a JSON pipeline config file.
pub const CONFIG_ENV_VAR: &str = "EDGEFRAME_CONFIG";

impl PipelineConfig {
    /// Load a config from a JSON file, returning defaults when the file is
    /// missing. The loaded config is validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the config from `EDGEFRAME_CONFIG`.
    ///
    /// An unset variable yields defaults. An unreadable or invalid file is
    /// logged and also yields defaults, so a bad file never prevents the
    /// processor from starting.
    pub fn from_env() -> Self {
        match config_path_from_env() {
            Some(path) => Self::load_or_default(&path),
            None => Self::default(),
        }
    }

    /// Like [`load`](Self::load) but falls back to defaults on any error.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                info!("Loaded pipeline config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring pipeline config {}: {e}", path.display());
                Self::default()
            }
        }
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var_os(CONFIG_ENV_VAR)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
