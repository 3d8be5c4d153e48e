use tracing_subscriber::{fmt, EnvFilter};

/// Initialize structured logging for the application.
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks between `debug`
/// and `info`. Must be called once at startup (in main.rs).
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Logging initialized");
}

fn default_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}
