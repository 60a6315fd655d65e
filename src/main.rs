// Skitter - a concurrent TCP/UDP reachability scanner.

use clap::Parser;
use skitter::cli::{self, Cli};
use skitter::output;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match cli::execute(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::from(cli::exit_code(&e))
        }
    }
}

/// Initialize logging; `RUST_LOG` takes precedence over `--debug`.
fn init_logging(debug: bool) {
    let default = if debug { "skitter=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
