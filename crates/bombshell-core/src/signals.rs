//! Signal pipeline: `SignalSender` turns OS signals observed by the local
//! peer into 2-byte frames fed into the local MUX's channel 1, and
//! `run_signaler` turns those frames back into `kill(2)` calls against the
//! remote child.
//!
//! Signal handlers must only perform async-signal-safe work, so the raw OS
//! handler is never touched directly here: `signal_hook` already implements
//! the self-pipe-written-from-handler, drained-on-an-ordinary-thread shape
//! (via `Signals::forever`), so it is used here instead of a hand-rolled
//! self-pipe — the handler body itself is entirely inside `signal_hook`,
//! this module only ever touches signal numbers from the safe worker
//! thread side.

use std::io::{Read, Write};
use std::thread::{self, JoinHandle};

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use signal_hook::consts::*;
use signal_hook::iterator::{Handle, Signals};
use tracing::{debug, warn};

use crate::codec;

/// The mandatory signal set the local peer must forward to the remote
/// peer. Callers may extend this set with additional signals.
pub const MANDATORY_SIGNALS: &[i32] = &[
  SIGINT, SIGABRT, SIGALRM, SIGTERM, SIGUSR1, SIGUSR2, SIGTSTP, SIGCONT,
];

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("signal registration failed: {0}")]
  Register(#[source] std::io::Error),
  #[error("impossible signal value 0 received: protocol violation")]
  ZeroSignal,
  #[error("kill failed for pid {pid}: {source}")]
  Kill { pid: i32, source: nix::Error },
}

/// Runs in L. Installs async-signal-safe handlers for `signals` and drains
/// them on a worker thread, writing each observed number as a 2-byte
/// network-order frame payload to `sink` (the write end of the internal
/// pipe that feeds L.MUX's channel 1).
pub struct SignalSender {
  handle: Handle,
  worker: Option<JoinHandle<()>>,
}

impl SignalSender {
  pub fn spawn<W>(signals: &[i32], mut sink: W) -> Result<SignalSender, Error>
  where
    W: Write + Send + 'static,
  {
    let mut registered = Signals::new(signals).map_err(Error::Register)?;
    let handle = registered.handle();
    let worker = thread::Builder::new()
      .name("signal-sender".to_string())
      .spawn(move || {
        for signo in registered.forever() {
          debug!(event = "signal_observed", signo);
          let bytes = codec::encode_signal(signo as u16);
          if sink.write_all(&bytes).is_err() {
            break;
          }
          if sink.flush().is_err() {
            break;
          }
        }
        debug!(event = "signal_sender_stopped");
      })
      .expect("spawn signal-sender thread");
    Ok(SignalSender {
      handle,
      worker: Some(worker),
    })
  }

  /// Unblocks the worker thread and joins it.
  pub fn shutdown(mut self) {
    self.handle.close();
    if let Some(worker) = self.worker.take() {
      let _ = worker.join();
    }
  }
}

impl Drop for SignalSender {
  fn drop(&mut self) {
    self.handle.close();
  }
}

/// Runs in R. Reads 2-byte signal frames from `source` (the internal pipe
/// R.DEMUX feeds as sink channel 1) and delivers each to `pid` via `kill`.
/// Terminates silently on EOF; a signal value of `0` is a protocol error
/// (impossible per §4.4, since `0` is L's internal shutdown sentinel and is
/// never forwarded).
pub fn run_signaler<R: Read>(mut source: R, pid: Pid) -> Result<(), Error> {
  loop {
    let mut buf = [0u8; 2];
    match source.read_exact(&mut buf) {
      Ok(()) => {}
      Err(error) if error.kind() == std::io::ErrorKind::UnexpectedEof => {
        debug!(event = "signaler_eof");
        return Ok(());
      }
      Err(error) => return Err(Error::Io(error)),
    }
    let signo = codec::decode_signal(&buf).expect("2-byte buffer always decodes");
    if signo == 0 {
      return Err(Error::ZeroSignal);
    }
    let sig = Signal::try_from(signo as i32).map_err(|_| Error::Kill {
      pid: pid.as_raw(),
      source: nix::Error::EINVAL,
    })?;
    debug!(event = "signaler_delivering", signo, pid = pid.as_raw());
    if let Err(source) = signal::kill(pid, sig) {
      warn!(event = "signaler_kill_failed", signo, pid = pid.as_raw(), error = %source);
      return Err(Error::Kill {
        pid: pid.as_raw(),
        source,
      });
    }
  }
}
