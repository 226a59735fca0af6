use std::path::PathBuf;

/// Location of the optional on-disk config file:
/// `~/.config/bombshell/config.toml`. Its absence is not an error; callers
/// fall back to built-in defaults.
pub fn config_path() -> PathBuf {
  dirs::config_dir()
    .unwrap_or_else(|| PathBuf::from("."))
    .join("bombshell")
    .join("config.toml")
}
