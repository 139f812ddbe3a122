use std::process::ExitCode;

use clap::Parser;
use lunchly_cli::Cli;
use lunchly_core::config::{AppConfig, LogFormat};
use tracing::Level;

fn init_logging(config: &AppConfig) {
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    // stdout carries the JSON command outcome; logs go to stderr.
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // A broken config is reported by the command itself; log with defaults meanwhile.
    let config = AppConfig::load(cli.load_options()).unwrap_or_default();
    init_logging(&config);

    lunchly_cli::run(cli)
}
