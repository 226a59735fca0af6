mod child;

use anyhow::Context;

fn main() {
  match try_main() {
    Ok(code) => std::process::exit(code),
    Err(err) => {
      eprintln!("bombshell-remote: {err:#}");
      std::process::exit(1);
    }
  }
}

fn try_main() -> anyhow::Result<i32> {
  let cfg = bombshell_core::config::load().context("load config")?;
  let debug = std::env::var_os("BOMBSHELL_DEBUG").is_some();
  bombshell_core::logging::init_remote(&cfg.remote_log_file, debug);
  child::run(&cfg)
}
