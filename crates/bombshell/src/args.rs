use clap::Parser;

/// Runs `command [args...]` inside `remote-domain`, reached through the
/// host's inter-domain shell transport.
#[derive(Debug, Parser)]
#[command(version, about = "Run a command in an isolated remote domain", bin_name = "bombshell")]
pub struct Cli {
  /// Enable verbose diagnostic logging to stderr.
  #[arg(short = 'd', long = "debug")]
  pub debug: bool,

  /// Opaque identifier for the remote domain, passed verbatim to the
  /// transport helper.
  pub remote_domain: String,

  /// Command (and its arguments) to run in the remote domain. Must be
  /// non-empty.
  #[arg(trailing_var_arg = true, required = true, num_args = 1..)]
  pub command: Vec<String>,
}
