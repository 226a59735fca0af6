use std::fs;
use std::path::Path;

use super::types::{Config, Result};

/// Loads configuration from `path`, falling back to built-in defaults when
/// the file is absent. A present-but-malformed file is still an error.
pub fn load_from_path(path: &Path) -> Result<Config> {
  match fs::read_to_string(path) {
    Ok(contents) => Ok(toml::from_str(&contents)?),
    Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
    Err(error) => Err(error.into()),
  }
}

/// Loads configuration from the well-known path (`super::paths::config_path`).
pub fn load() -> Result<Config> {
  load_from_path(&super::paths::config_path())
}
