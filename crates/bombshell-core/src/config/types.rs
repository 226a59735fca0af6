use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use super::defaults;

/// Effective configuration after merging built-in defaults with the
/// optional on-disk file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Per-user exclusive lock file held for the handshake duration.
  pub lock_file: PathBuf,
  /// Transport helper binary invoked as `<helper> <domain> <service>`.
  pub transport_helper: String,
  /// Service name passed to the transport helper.
  pub transport_service: String,
  /// Per-read ceiling applied by MUX.
  pub read_ceiling: usize,
  /// Signals to forward in addition to the mandatory set.
  pub extra_signals: Vec<i32>,
  /// JSONL log path used by the remote peer (whose stdout carries the wire
  /// protocol and so cannot be logged to). Unused by the local peer.
  pub remote_log_file: PathBuf,
}

impl Default for Config {
  fn default() -> Self {
    defaults::default_config()
  }
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("io: {0}")]
  Io(#[from] std::io::Error),
  #[error("toml: {0}")]
  Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
