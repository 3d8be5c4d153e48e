use thiserror::Error;

/// Unified application error.
///
/// Covers the plumbing around the bridge (config, network, parsing, the
/// listener). Alert translation has its own [`TranslateError`] because it
/// maps to a per-request 400 rather than a process failure.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Server error: {0}")]
    Server(String),
}

/// Errors raised while translating one inbound alert.
///
/// The `Display` output is the reason text returned to Alertmanager.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("Missing field: '{0}'")]
    MissingField(String),

    #[error("Invalid priority: '{0}'")]
    InvalidPriority(String),
}

impl TranslateError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }
}
