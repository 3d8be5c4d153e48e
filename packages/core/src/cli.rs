use std::path::PathBuf;

use clap::Parser;

use crate::config::{Config, DEFAULT_CONFIG_FILE};

/// Alertify CLI arguments
#[derive(Debug, Parser)]
#[command(
    name = "alertify",
    version,
    about = "Bridge between Prometheus Alertmanager and Gotify",
    after_help = env_help()
)]
pub struct Cli {
    /// Path to the config YAML
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Simply exit with 0 for healthy or 1 when unhealthy
    #[arg(short = 'H', long)]
    pub healthcheck: bool,
}

fn env_help() -> String {
    let defaults = Config::env_defaults();
    let width = defaults.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

    let mut help =
        String::from("The following environment variables will override any config or default:\n");
    for (name, default) in defaults {
        help.push_str(&format!("  * {:<width$} (default: {})\n", name, default, width = width));
    }
    help
}
