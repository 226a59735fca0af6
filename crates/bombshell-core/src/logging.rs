//! Structured `tracing`-based logging. The two peers need different sinks:
//! the local peer's stdout is the user-facing replay of the child's stdout
//! and must stay pristine, so it logs plain text to its own stderr; the
//! remote peer's stdout *is* the transport itself, so even stderr logging
//! there would be unusual for an unattended remote-domain process — it
//! logs JSONL to a file instead. Default level is `warn` so a clean run
//! produces no diagnostic noise; `-d` raises it to `debug`.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::OnceLock;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

static INIT: OnceLock<()> = OnceLock::new();
static WORKER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn level_filter(debug: bool) -> EnvFilter {
  EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "warn" }))
}

/// Initializes plain-text logging to stderr, for the local peer. Idempotent.
pub fn init(debug: bool) {
  INIT.get_or_init(|| {
    let subscriber = fmt()
      .with_env_filter(level_filter(debug))
      .with_writer(std::io::stderr)
      .with_target(false)
      .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
    info!(event = "logging_initialized", debug, "logging initialized");
  });
}

/// Initializes JSONL logging to `path`, for the remote peer, whose stdout
/// carries the wire protocol and cannot be shared with diagnostics.
/// Idempotent; a second call is a no-op.
pub fn init_remote(path: &Path, debug: bool) {
  INIT.get_or_init(|| {
    if let Some(parent) = path.parent() {
      let _ = std::fs::create_dir_all(parent);
    }
    let file = match OpenOptions::new().create(true).append(true).open(path) {
      Ok(file) => file,
      Err(_) => return, // no writable log path available; run without logging
    };
    let (writer, guard) = tracing_appender::non_blocking(file);
    let _ = WORKER_GUARD.set(guard);

    let json_layer = fmt::layer()
      .with_timer(ChronoUtc::rfc_3339())
      .json()
      .with_current_span(false)
      .with_span_list(false)
      .with_target(false)
      .with_writer(writer);
    let subscriber = Registry::default().with(level_filter(debug)).with(json_layer);
    let _ = tracing::subscriber::set_global_default(subscriber);
    info!(event = "logging_initialized", debug, path = %path.display(), "logging initialized");
  });
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn level_filter_is_constructed_for_both_levels_without_panicking() {
    // try_from_default_env only succeeds under RUST_LOG; absent it, falls
    // back to the debug flag. Exercised for its side effect of not
    // panicking rather than its (private, version-specific) string form.
    unsafe { std::env::remove_var("RUST_LOG") };
    let _ = level_filter(false);
    let _ = level_filter(true);
  }
}
