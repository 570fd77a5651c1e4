//! ccure CLI entry point.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ccure::cli::{self, Cli, EXIT_ERROR};

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_env("CCURE_LOG"))
        .init();

    let cli = Cli::parse();

    let exit_code = match cli::run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
