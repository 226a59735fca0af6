//! Exit-code mapping shared by both peer binaries.

/// How a peer process should end: either propagate the child/helper's exit
/// code, or one of the fixed failure codes reserved for handshake failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
  /// The remote child (or, on the remote side, the transport helper as seen
  /// by the local side) exited with this code, already folded into 0..=255.
  ChildExit(i32),
  /// No confirmation bytes were received at all: the domain could not be
  /// reached.
  DomainUnreachable,
  /// The remote side could not spawn the command (a spawn error other than
  /// not-found/not-executable).
  RemoteSpawnFailed,
  /// Either the local side could not spawn the transport helper, or the
  /// remote side reported the command as not found / not executable.
  CommandNotFound,
}

impl ExitOutcome {
  /// Maps to the process exit code fixed for each case.
  pub fn code(self) -> i32 {
    match self {
      ExitOutcome::ChildExit(code) => code & 0xff,
      ExitOutcome::DomainUnreachable => 125,
      ExitOutcome::RemoteSpawnFailed => 126,
      ExitOutcome::CommandNotFound => 127,
    }
  }
}

/// Encodes a child's wait status the way the host OS conventionally reports
/// a signal death on the command line: `128 + signo`.
pub fn exit_code_for_signal(signo: i32) -> i32 {
  128 + signo
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn maps_fixed_codes() {
    assert_eq!(ExitOutcome::DomainUnreachable.code(), 125);
    assert_eq!(ExitOutcome::RemoteSpawnFailed.code(), 126);
    assert_eq!(ExitOutcome::CommandNotFound.code(), 127);
  }

  #[test]
  fn child_exit_is_masked_to_a_byte() {
    assert_eq!(ExitOutcome::ChildExit(300).code(), 300 & 0xff);
    assert_eq!(ExitOutcome::ChildExit(42).code(), 42);
  }

  #[test]
  fn signal_exit_code_follows_128_plus_signo() {
    assert_eq!(exit_code_for_signal(9), 137);
  }
}
