//! Test double standing in for `qrexec-client-vm` / `qubes.VMShell`: reads
//! the raw bootstrap line a real remote shell would consume, then execs the
//! `bombshell-remote` binary under test in its place, so the handshake and
//! data phase run exactly as they would against a real Qubes domain.
//!
//! Not shipped: built only so integration tests under `tests/` can point
//! `transport_helper` at it via a fixture config file.

use std::io::BufRead;
use std::os::unix::process::CommandExt;

fn main() {
  // First positional arg is the "domain". A magic name lets tests exercise
  // the "domain unreachable" path (qrexec-client-vm exits immediately,
  // writing nothing) without needing a real nonexistent Qubes VM.
  if std::env::args().nth(1).as_deref() == Some("unreachable-domain") {
    std::process::exit(125);
  }

  let stdin = std::io::stdin();
  let mut line = String::new();
  stdin
    .lock()
    .read_line(&mut line)
    .expect("read bootstrap line");

  let remote_bin = std::env::var("BOMBSHELL_TEST_REMOTE_BIN")
    .expect("BOMBSHELL_TEST_REMOTE_BIN must be set by the test harness");

  let error = std::process::Command::new(remote_bin).exec();
  eprintln!("fake-transport-helper: exec failed: {error}");
  std::process::exit(126);
}
