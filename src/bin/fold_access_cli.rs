use clap::Parser;
use fold_access::cli::{run, Cli};

/// Main entry point for the access control CLI.
///
/// Parses arguments, loads `--config` (or `FOLD_ACCESS_CONFIG`, or
/// `config/access_config.toml`), opens the policy database and runs the
/// requested command. Errors are printed and turn into a non-zero exit code.
fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
