//! Local-peer launch supervisor: holds the per-user lock across the
//! handshake, spawns the transport helper, exchanges the bootstrap text,
//! command request, and confirmation, then — on success — wires up the
//! data-phase MUX/DEMUX/signal pipeline and waits for the transport helper
//! to exit.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::fd::AsFd;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use bombshell_core::config::Config;
use bombshell_core::{codec, demux, error::ExitOutcome, mux, signals};
use tracing::{debug, info, warn};

/// Exclusive lock held across the entire handshake.
struct LockGuard {
  file: File,
}

impl LockGuard {
  fn acquire(path: &Path) -> Result<LockGuard> {
    let file = OpenOptions::new()
      .create(true)
      .write(true)
      .mode(0o600)
      .open(path)
      .with_context(|| format!("open lock file {}", path.display()))?;
    rustix::fs::flock(&file, rustix::fs::FlockOperation::LockExclusive)
      .with_context(|| format!("acquire exclusive lock on {}", path.display()))?;
    debug!(event = "lock_acquired", path = %path.display());
    Ok(LockGuard { file })
  }

  fn release(self) {
    let _ = rustix::fs::flock(&self.file, rustix::fs::FlockOperation::Unlock);
    debug!(event = "lock_released");
  }
}

/// Escapes `s` for inclusion in a POSIX `sh` command line by single-quoting
/// it, doubling any embedded single quotes.
fn shell_quote(s: &str) -> String {
  format!("'{}'", s.replace('\'', r"'\''"))
}

/// Duplicates `stderr`'s underlying fd so that, even if this process's own
/// stderr is later reassigned, the saved copy keeps writing to the original
/// terminal.
fn dup_original_stderr() -> Result<File> {
  let dup = rustix::io::dup(std::io::stderr().as_fd()).context("duplicate stderr fd")?;
  Ok(File::from(dup))
}

/// Runs the full handshake and, on success, the data phase. Returns the
/// outcome to map to a process exit code.
pub fn run(domain: &str, command: &[String], cfg: &Config) -> Result<ExitOutcome> {
  let lock = LockGuard::acquire(&cfg.lock_file)?;
  let saved_stderr = dup_original_stderr()?;

  let mut child = match Command::new(&cfg.transport_helper)
    .arg(domain)
    .arg(&cfg.transport_service)
    .stdin(Stdio::piped())
    .stdout(Stdio::piped())
    .stderr(Stdio::inherit())
    .process_group(0)
    .spawn()
  {
    Ok(child) => child,
    Err(error) => {
      warn!(event = "transport_helper_spawn_failed", helper = %cfg.transport_helper, error = %error);
      lock.release();
      eprintln!(
        "bombshell: could not spawn transport helper '{}': {}",
        cfg.transport_helper, error
      );
      return Ok(ExitOutcome::CommandNotFound);
    }
  };
  info!(event = "transport_helper_spawned", helper = %cfg.transport_helper, domain);

  let mut helper_stdin = child.stdin.take().expect("piped stdin");
  let mut helper_stdout = child.stdout.take().expect("piped stdout");

  let bootstrap_line = format!("exec {}", shell_quote("bombshell-remote"));
  let handshake_result: Result<()> = (|| {
    helper_stdin.write_all(bootstrap_line.as_bytes())?;
    helper_stdin.write_all(b"\n")?;
    helper_stdin.flush()?;
    codec::write_command(&mut helper_stdin, &codec::encode_command(command))?;
    Ok(())
  })();
  if let Err(error) = handshake_result {
    lock.release();
    return Err(error).context("write bootstrap text and command request");
  }

  let confirmation = codec::read_confirmation(&mut helper_stdout)
    .context("read launch confirmation")?;
  lock.release();

  if confirmation.status != 0 {
    info!(event = "launch_rejected", status = confirmation.status, message = %confirmation.errmsg);
    eprintln!("bombshell: {}", confirmation.errmsg);
    return Ok(match confirmation.status {
      125 => ExitOutcome::DomainUnreachable,
      126 => ExitOutcome::RemoteSpawnFailed,
      127 => ExitOutcome::CommandNotFound,
      other => ExitOutcome::ChildExit(other as i32),
    });
  }
  info!(event = "launch_confirmed");

  let (signal_pipe_read, signal_pipe_write) = nix::unistd::pipe().context("create signal pipe")?;
  let signal_pipe_read = File::from(signal_pipe_read);

  let mut extra_signals = signals::MANDATORY_SIGNALS.to_vec();
  extra_signals.extend(cfg.extra_signals.iter().copied());
  let sender = signals::SignalSender::spawn(&extra_signals, File::from(signal_pipe_write))
    .context("install signal handlers")?;

  let sources = vec![
    mux::Source {
      channel: 0,
      label: "stdin",
      reader: Box::new(std::io::stdin()),
    },
    mux::Source {
      channel: 1,
      label: "signals",
      reader: Box::new(signal_pipe_read),
    },
  ];
  // Not joined: the stdin source thread blocks on a read that may never
  // return (an interactive terminal need not close stdin), so only DEMUX is
  // waited on below.
  let _mux_handle = mux::Mux::start(sources, helper_stdin, cfg.read_ceiling);

  let sinks = vec![
    demux::Sink {
      channel: 0,
      label: "stdout",
      writer: Box::new(std::io::stdout()),
    },
    demux::Sink {
      channel: 1,
      label: "stderr",
      writer: Box::new(saved_stderr),
    },
  ];
  let demux_handle = demux::Demux::start(helper_stdout, sinks);

  let status = child.wait().context("wait for transport helper")?;
  if let Err(error) = demux_handle.join() {
    warn!(event = "demux_protocol_error", error = %error);
  }
  sender.shutdown();

  let code = exit_code_from_status(status);
  Ok(ExitOutcome::ChildExit(code))
}

fn exit_code_from_status(status: std::process::ExitStatus) -> i32 {
  use std::os::unix::process::ExitStatusExt;
  if let Some(code) = status.code() {
    code
  } else if let Some(signo) = status.signal() {
    bombshell_core::error::exit_code_for_signal(signo)
  } else {
    1
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn shell_quote_escapes_single_quotes() {
    assert_eq!(shell_quote("plain"), "'plain'");
    assert_eq!(shell_quote("it's"), r"'it'\''s'");
  }
}
