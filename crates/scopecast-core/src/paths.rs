use crate::error::{EstimateError, Result};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const SCOPECAST_DIR: &str = ".scopecast";
pub const CONFIG_FILE: &str = "config.yaml";

/// Environment variable that points at an explicit config file.
pub const CONFIG_ENV: &str = "SCOPECAST_CONFIG";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn scopecast_dir(home: &Path) -> PathBuf {
    home.join(SCOPECAST_DIR)
}

pub fn config_path(home: &Path) -> PathBuf {
    scopecast_dir(home).join(CONFIG_FILE)
}

/// Default config location: `~/.scopecast/config.yaml`.
pub fn default_config_path() -> Result<PathBuf> {
    let home = home::home_dir().ok_or(EstimateError::HomeNotFound)?;
    Ok(config_path(&home))
}
