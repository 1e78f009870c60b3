use clap::Parser;
use client::{output, Config, Keyshares};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// Every bundle is valid
const EXIT_VALID: u8 = 0;
// At least one bundle is invalid
const EXIT_INVALID: u8 = 1;
// Nothing could be verified
const EXIT_FATAL: u8 = 2;

fn main() -> ExitCode {
    let cli = Keyshares::parse();

    if let Err(e) = init_logging(&cli.debug_level) {
        eprintln!("{e}");
        return ExitCode::from(EXIT_FATAL);
    }

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!(error = %e, "Verification failed");
            eprintln!("Error: {e}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn init_logging(debug_level: &str) -> Result<(), String> {
    // RUST_LOG wins over the command line
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::builder()
            .parse(debug_level)
            .map_err(|e| format!("Invalid debug level {debug_level}: {e}"))?,
    };
    // stdout carries the verdict, logs go to stderr
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .map_err(|e| format!("Unable to initialise logging: {e}"))
}

fn run(cli: &Keyshares) -> Result<u8, String> {
    let config = Config::from_cli(cli)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start runtime: {e}"))?;
    let verdict = runtime
        .block_on(client::run(&config))
        .map_err(|e| e.to_string())?;

    println!("{}", output::render(&verdict, config.output)?);
    info!(
        valid = verdict.len() - verdict.invalid_count(),
        invalid = verdict.invalid_count(),
        "Done"
    );

    if verdict.all_valid() {
        Ok(EXIT_VALID)
    } else {
        Ok(EXIT_INVALID)
    }
}
