mod cli;
mod platform;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use cli::Cli;
use platform::config::AppConfig;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_overrides(&cli);

    platform::logging::initialize(
        config.log_destination,
        platform::logging::level_for(cli.verbose),
        &config.log_file,
    );

    platform::app::run_app(&config, cli.command())
}
