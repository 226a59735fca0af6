use super::types::Config;
use crate::mux::READ_CEILING;
use std::path::PathBuf;

pub fn default_lock_file() -> PathBuf {
  dirs::home_dir()
    .unwrap_or_else(|| PathBuf::from("."))
    .join(".bombshell-lock")
}

pub fn default_remote_log_file() -> PathBuf {
  dirs::cache_dir()
    .unwrap_or_else(std::env::temp_dir)
    .join("bombshell")
    .join("remote.jsonl")
}

pub fn default_config() -> Config {
  Config {
    lock_file: default_lock_file(),
    transport_helper: "qrexec-client-vm".to_string(),
    transport_service: "qubes.VMShell".to_string(),
    read_ceiling: READ_CEILING,
    extra_signals: Vec::new(),
    remote_log_file: default_remote_log_file(),
  }
}
