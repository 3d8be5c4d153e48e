use std::process::ExitCode;

use clap::Parser;
use dotenvy::dotenv;

use alertify::api::{self, AppState};
use alertify::cli::Cli;
use alertify::config::{Config, ConfigSource};
use alertify::logging::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let cli = Cli::parse();

    // Logging depends on `verbose`, so config errors go straight to stderr.
    let (config, source) = match Config::load(&cli.config) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    init_logging(config.verbose);

    match &source {
        ConfigSource::File(path) => tracing::debug!("Loaded config from {}", path.display()),
        ConfigSource::Missing(path) => {
            tracing::warn!("No config file found ({})", path.display())
        }
    }
    tracing::debug!("Config: {:?}", config);

    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(err) => {
            tracing::error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    if cli.healthcheck {
        // Unix sense: 0 is healthy.
        return if state.healthcheck.report().await {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    if !config.has_app_key() {
        tracing::warn!("GOTIFY_KEY is not set; alerts will be rejected until it is");
    }

    if let Err(err) = api::serve(state, config.listen_port).await {
        tracing::error!("{}", err);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
