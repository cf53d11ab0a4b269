// pr-status entry point.
// Loads .env, initializes logging, and dispatches the parsed command.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pr_status::Settings;
use pr_status::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; the process environment still applies.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let serving = matches!(cli.command, Commands::Serve { .. });
    init_tracing(cli.verbose, serving);

    match cli::run(cli, Settings::from_env()).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Error: {error}");
            if error.is_github_error() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

/// Log to stderr. `RUST_LOG` overrides the defaults.
fn init_tracing(verbose: bool, serving: bool) {
    let default_directive = match (verbose, serving) {
        (true, _) => "pr_status=debug,tower_http=debug,info",
        (false, true) => "info",
        (false, false) => "warn",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
