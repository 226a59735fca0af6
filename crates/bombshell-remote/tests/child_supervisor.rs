//! Drives the `bombshell-remote` binary directly over its stdin/stdout,
//! exercising the remote child supervisor without needing the local peer
//! or a transport helper at all.

use std::io::Read;
use std::process::{Command, Stdio};

use assert_cmd::cargo::cargo_bin;
use bombshell_core::codec;

fn spawn_remote() -> std::process::Child {
  Command::new(cargo_bin("bombshell-remote"))
    .stdin(Stdio::piped())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()
    .expect("spawn bombshell-remote")
}

#[test]
fn spawns_command_confirms_and_echoes_stdin_to_stdout() {
  let mut child = spawn_remote();
  let mut stdin = child.stdin.take().unwrap();
  let mut stdout = child.stdout.take().unwrap();

  let command = codec::encode_command(&["cat".to_string()]);
  codec::write_command(&mut stdin, &command).unwrap();

  let confirmation = codec::read_confirmation(&mut stdout).unwrap();
  assert_eq!(confirmation.status, 0);

  codec::write_frame(&mut stdin, 0, Some(b"hello")).unwrap();
  codec::write_eof(&mut stdin, 0).unwrap();
  codec::write_eof(&mut stdin, 1).unwrap(); // close the signal channel too

  let mut collected = Vec::new();
  loop {
    match codec::read_frame(&mut stdout).unwrap() {
      None => break,
      Some(codec::Frame::Data { channel: 0, payload }) => collected.extend(payload),
      Some(codec::Frame::Eof { channel: 0 }) => break,
      Some(_) => {}
    }
  }
  assert_eq!(collected, b"hello");

  drop(stdin);
  let status = child.wait().unwrap();
  assert!(status.success());
}

#[test]
fn command_not_found_reports_status_127() {
  let mut child = spawn_remote();
  let mut stdin = child.stdin.take().unwrap();
  let mut stdout = child.stdout.take().unwrap();

  let command = codec::encode_command(&["this-binary-does-not-exist-xyz".to_string()]);
  codec::write_command(&mut stdin, &command).unwrap();

  let confirmation = codec::read_confirmation(&mut stdout).unwrap();
  assert_eq!(confirmation.status, 127);

  drop(stdin);
  let status = child.wait().unwrap();
  assert!(status.success()); // the supervisor itself exits cleanly (Ok(0))
}

#[test]
fn spawn_failure_other_than_not_found_reports_status_126() {
  let mut child = spawn_remote();
  let mut stdin = child.stdin.take().unwrap();
  let mut stdout = child.stdout.take().unwrap();

  // "/" exists but is a directory: spawning it fails with something other
  // than NotFound.
  let command = codec::encode_command(&["/".to_string()]);
  codec::write_command(&mut stdin, &command).unwrap();

  let confirmation = codec::read_confirmation(&mut stdout).unwrap();
  assert_eq!(confirmation.status, 126);

  drop(stdin);
  child.wait().unwrap();
}

#[test]
fn signal_frame_on_channel_one_is_delivered_to_the_child() {
  let mut child = spawn_remote();
  let mut stdin = child.stdin.take().unwrap();
  let mut stdout = child.stdout.take().unwrap();

  let command = codec::encode_command(&[
    "sh".to_string(),
    "-c".to_string(),
    "trap 'echo caught; exit 0' USR1; sleep 5".to_string(),
  ]);
  codec::write_command(&mut stdin, &command).unwrap();
  let confirmation = codec::read_confirmation(&mut stdout).unwrap();
  assert_eq!(confirmation.status, 0);

  std::thread::sleep(std::time::Duration::from_millis(200));
  let signo = nix::sys::signal::Signal::SIGUSR1 as i32 as u16;
  codec::write_frame(&mut stdin, 1, Some(&codec::encode_signal(signo))).unwrap();

  let mut collected = Vec::new();
  loop {
    match codec::read_frame(&mut stdout).unwrap() {
      None => break,
      Some(codec::Frame::Data { channel: 0, payload }) => collected.extend(payload),
      Some(codec::Frame::Eof { channel: 0 }) => {}
      Some(_) => {}
    }
  }
  assert!(String::from_utf8_lossy(&collected).contains("caught"));

  drop(stdin);
  let status = child.wait().unwrap();
  assert!(status.success());
}

#[test]
fn stderr_of_bombshell_remote_itself_stays_on_its_own_stream() {
  // Regression guard: bombshell-remote's own diagnostics must never land on
  // the stdout stream that carries the framed wire protocol.
  let mut child = spawn_remote();
  let mut stdin = child.stdin.take().unwrap();
  let mut own_stderr = child.stderr.take().unwrap();

  let command = codec::encode_command(&["echo".to_string(), "hi".to_string()]);
  codec::write_command(&mut stdin, &command).unwrap();

  drop(stdin);
  child.wait().unwrap();

  let mut diag = String::new();
  own_stderr.read_to_string(&mut diag).unwrap();
  // No assertion on content: only that reading it doesn't panic and that it
  // is a distinct handle from stdout (exercised by the other tests' framing
  // assertions succeeding at all).
  let _ = diag;
}
