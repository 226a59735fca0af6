//! Remote-peer child supervisor: reads the command request, spawns the
//! child process, reports the launch confirmation, then wires the child's
//! fds to MUX/DEMUX and waits for it to exit.

use std::io::{Read, Write};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use bombshell_core::config::Config;
use bombshell_core::{codec, demux, mux, signals};
use nix::unistd::Pid;
use tracing::{debug, info, warn};

/// Runs the remote side: reads the command off `stdin`, spawns it, writes
/// the confirmation to `stdout`, and — on success — drives the data phase.
/// Returns the exit code this process itself should use, which is the
/// spawned child's own exit code.
pub fn run(cfg: &Config) -> Result<i32> {
  let mut stdin = std::io::stdin();
  let mut stdout = std::io::stdout();

  let cmd_bytes = codec::read_command(&mut stdin).context("read command request")?;
  let argv = codec::decode_command(&cmd_bytes);
  if argv.is_empty() {
    codec::write_confirmation(&mut stdout, 126, "empty command")?;
    return Ok(0);
  }
  debug!(event = "command_received", program = %argv[0], argc = argv.len());

  let mut child = match Command::new(&argv[0])
    .args(&argv[1..])
    .stdin(Stdio::piped())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()
  {
    Ok(child) => child,
    Err(error) => {
      let status = if error.kind() == std::io::ErrorKind::NotFound {
        127
      } else {
        126
      };
      warn!(event = "child_spawn_failed", program = %argv[0], status, error = %error);
      let message = format!("{}: {}", argv[0], error);
      codec::write_confirmation(&mut stdout, status, &message)
        .context("write launch confirmation")?;
      return Ok(0);
    }
  };
  info!(event = "child_spawned", program = %argv[0], pid = child.id());
  codec::write_confirmation(&mut stdout, 0, "").context("write launch confirmation")?;

  let pid = Pid::from_raw(child.id() as i32);
  let child_stdin = child.stdin.take().expect("piped stdin");
  let child_stdout = child.stdout.take().expect("piped stdout");
  let child_stderr = child.stderr.take().expect("piped stderr");

  let (signal_pipe_read, signal_pipe_write) =
    nix::unistd::pipe().context("create signal pipe")?;
  let signal_pipe_read = std::fs::File::from(signal_pipe_read);
  let signal_pipe_write = std::fs::File::from(signal_pipe_write);

  // Not joined: it only ends once the transport itself closes, which can
  // outlive P; the process exit below reaps it.
  let _signaler = std::thread::Builder::new()
    .name("signaler".to_string())
    .spawn(move || {
      if let Err(error) = signals::run_signaler(signal_pipe_read, pid) {
        warn!(event = "signaler_error", error = %error);
      }
    })
    .expect("spawn signaler thread");

  // Not joined: stdin from the transport may never hit EOF while the
  // session is alive, so only MUX (bounded by the child's own stdout/stderr
  // EOF) is waited on below.
  let _demux_handle = demux::Demux::start(
    stdin,
    vec![
      demux::Sink {
        channel: 0,
        label: "child-stdin",
        writer: Box::new(child_stdin),
      },
      demux::Sink {
        channel: 1,
        label: "signals",
        writer: Box::new(signal_pipe_write),
      },
    ],
  );

  let mux_handle = mux::Mux::start(
    vec![
      mux::Source {
        channel: 0,
        label: "child-stdout",
        reader: Box::new(child_stdout),
      },
      mux::Source {
        channel: 1,
        label: "child-stderr",
        reader: Box::new(child_stderr),
      },
    ],
    stdout,
    cfg.read_ceiling,
  );

  let status = child.wait().context("wait for child process")?;
  mux_handle.join();

  Ok(exit_code_from_status(status))
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
