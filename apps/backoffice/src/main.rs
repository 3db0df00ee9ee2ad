//! # `briik` Entry Point
//!
//! Parses arguments, loads configuration, initializes logging and runs one
//! command. Failures print a single line on stderr and exit non-zero.

use std::process::ExitCode;

use clap::Parser;

use briik_backoffice::cli::{self, Cli, Command};
use briik_backoffice::config::DEFAULT_LOG_FILTER;
use briik_backoffice::{init_tracing, ApiResult, BackofficeConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // `config show` must work with a broken configuration
    if let Command::Config { action } = cli.command {
        init_tracing(DEFAULT_LOG_FILTER);
        return finish(cli::run_config(action));
    }

    let config = match BackofficeConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.log_filter);

    finish(cli::run(cli, config).await)
}

fn finish(result: ApiResult<String>) -> ExitCode {
    match result {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e.message);
            ExitCode::FAILURE
        }
    }
}
