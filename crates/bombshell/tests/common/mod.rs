use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin;
use tempfile::TempDir;

/// A scratch `$XDG_CONFIG_HOME` wired to a `fake-transport-helper` in place
/// of `qrexec-client-vm`, so the full `bombshell` binary can be driven
/// end-to-end without a real Qubes domain.
pub struct TestEnv {
  _dir: TempDir,
  config_home: PathBuf,
  lock_file: PathBuf,
}

impl TestEnv {
  pub fn new() -> TestEnv {
    let dir = tempfile::tempdir().expect("create tempdir");
    let config_home = dir.path().join("config");
    let config_dir = config_home.join("bombshell");
    std::fs::create_dir_all(&config_dir).expect("create config dir");

    let lock_file = dir.path().join("lock");
    let helper = cargo_bin("fake-transport-helper");
    std::fs::write(
      config_dir.join("config.toml"),
      format!(
        "lock_file = {lock:?}\ntransport_helper = {helper:?}\ntransport_service = \"test.Service\"\n",
        lock = lock_file,
        helper = helper,
      ),
    )
    .expect("write fixture config");

    TestEnv {
      _dir: dir,
      config_home,
      lock_file,
    }
  }

  /// An `assert_cmd::Command` for the `bombshell` binary under test,
  /// pre-wired to this environment's fixture config and a reachable domain.
  pub fn bombshell(&self, domain: &str) -> Command {
    let mut cmd = Command::cargo_bin("bombshell").expect("find bombshell binary");
    cmd
      .env("XDG_CONFIG_HOME", &self.config_home)
      .env("BOMBSHELL_TEST_REMOTE_BIN", cargo_bin("bombshell-remote"))
      .arg(domain);
    cmd
  }

  pub fn lock_file(&self) -> &std::path::Path {
    &self.lock_file
  }
}
