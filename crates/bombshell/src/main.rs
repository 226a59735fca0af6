mod args;
mod launch;

use anyhow::Context;
use bombshell_core::ExitOutcome;
use clap::Parser;
use owo_colors::OwoColorize as _;

fn main() {
  let cli = args::Cli::parse();
  bombshell_core::logging::init(cli.debug);

  match try_main(&cli) {
    Ok(outcome) => std::process::exit(outcome.code()),
    Err(err) => {
      anstream::eprintln!("{}", format!("bombshell: {err:#}").red());
      std::process::exit(1);
    }
  }
}

fn try_main(cli: &args::Cli) -> anyhow::Result<ExitOutcome> {
  let cfg = bombshell_core::config::load().context("load config")?;
  launch::run(&cli.remote_domain, &cli.command, &cfg)
}
