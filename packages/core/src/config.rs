//! Layered configuration.
//!
//! Each key resolves as: environment variable (the key upper-cased), then
//! the YAML config file, then the built-in default. Values are coerced to
//! the key's type after resolution, so `LISTEN_PORT=9000` and
//! `listen_port: 9000` behave the same.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::alerts::translate::Policy;
use crate::error::AppError;

pub const DEFAULT_CONFIG_FILE: &str = "alertify.yaml";

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub delete_onresolve: bool,
    pub disable_resolved: bool,
    /// Client-scoped key, used for listing and deleting messages.
    pub gotify_client: String,
    /// Application-scoped key, used for sending messages.
    pub gotify_key: String,
    pub gotify_port: u16,
    pub gotify_server: String,
    /// Seconds before a Gotify call is abandoned.
    pub gotify_timeout: u64,
    pub listen_port: u16,
    pub verbose: bool,
}

/// Where the file layer came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Missing(PathBuf),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delete_onresolve: false,
            disable_resolved: false,
            gotify_client: String::new(),
            gotify_key: String::new(),
            gotify_port: 80,
            gotify_server: "localhost".to_string(),
            gotify_timeout: 10,
            listen_port: 8080,
            verbose: false,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("delete_onresolve", &self.delete_onresolve)
            .field("disable_resolved", &self.disable_resolved)
            .field("gotify_client", &redact(&self.gotify_client))
            .field("gotify_key", &redact(&self.gotify_key))
            .field("gotify_port", &self.gotify_port)
            .field("gotify_server", &self.gotify_server)
            .field("gotify_timeout", &self.gotify_timeout)
            .field("listen_port", &self.listen_port)
            .field("verbose", &self.verbose)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl Config {
    /// Load from `path` and the process environment.
    ///
    /// A missing file is not an error; it is reported through the returned
    /// [`ConfigSource`] so the caller can log it once logging is up.
    pub fn load(path: &Path) -> Result<(Self, ConfigSource), AppError> {
        let (file, source) = match std::fs::read_to_string(path) {
            Ok(content) => (parse_yaml(&content)?, ConfigSource::File(path.to_path_buf())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                (HashMap::new(), ConfigSource::Missing(path.to_path_buf()))
            }
            Err(err) => {
                return Err(AppError::Config(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    err
                )))
            }
        };

        let config = Self::from_sources(&file, |name| std::env::var(name).ok())?;
        Ok((config, source))
    }

    /// Resolve every key from a parsed file layer and an environment lookup.
    pub fn from_sources<F>(file: &HashMap<String, Value>, env: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| -> Result<Option<String>, AppError> {
            // Empty variables count as unset.
            if let Some(value) = env(&key.to_uppercase()).filter(|v| !v.is_empty()) {
                return Ok(Some(value));
            }
            match file.get(key) {
                Some(value) => scalar(key, value),
                None => Ok(None),
            }
        };

        let defaults = Self::default();

        Ok(Self {
            delete_onresolve: match lookup("delete_onresolve")? {
                Some(raw) => parse_bool("delete_onresolve", &raw)?,
                None => defaults.delete_onresolve,
            },
            disable_resolved: match lookup("disable_resolved")? {
                Some(raw) => parse_bool("disable_resolved", &raw)?,
                None => defaults.disable_resolved,
            },
            gotify_client: lookup("gotify_client")?.unwrap_or(defaults.gotify_client),
            gotify_key: lookup("gotify_key")?.unwrap_or(defaults.gotify_key),
            gotify_port: match lookup("gotify_port")? {
                Some(raw) => parse_port("gotify_port", &raw)?,
                None => defaults.gotify_port,
            },
            gotify_server: lookup("gotify_server")?.unwrap_or(defaults.gotify_server),
            gotify_timeout: match lookup("gotify_timeout")? {
                Some(raw) => parse_seconds("gotify_timeout", &raw)?,
                None => defaults.gotify_timeout,
            },
            listen_port: match lookup("listen_port")? {
                Some(raw) => parse_port("listen_port", &raw)?,
                None => defaults.listen_port,
            },
            verbose: match lookup("verbose")? {
                Some(raw) => parse_bool("verbose", &raw)?,
                None => defaults.verbose,
            },
        })
    }

    pub fn policy(&self) -> Policy {
        Policy {
            disable_resolved: self.disable_resolved,
            delete_on_resolve: self.delete_onresolve,
        }
    }

    /// Sending is impossible without the application key.
    pub fn has_app_key(&self) -> bool {
        !self.gotify_key.is_empty()
    }

    /// `gotify_server` may carry its own scheme; plain HTTP otherwise.
    pub fn gotify_base_url(&self) -> String {
        let server = self.gotify_server.trim_end_matches('/');
        if server.contains("://") {
            format!("{}:{}", server, self.gotify_port)
        } else {
            format!("http://{}:{}", server, self.gotify_port)
        }
    }

    /// `(ENV_NAME, default)` for every key, in key order.
    pub fn env_defaults() -> Vec<(String, String)> {
        let d = Self::default();
        let show = |s: &str| if s.is_empty() { "None".to_string() } else { s.to_string() };
        vec![
            ("DELETE_ONRESOLVE".into(), d.delete_onresolve.to_string()),
            ("DISABLE_RESOLVED".into(), d.disable_resolved.to_string()),
            ("GOTIFY_CLIENT".into(), show(&d.gotify_client)),
            ("GOTIFY_KEY".into(), show(&d.gotify_key)),
            ("GOTIFY_PORT".into(), d.gotify_port.to_string()),
            ("GOTIFY_SERVER".into(), show(&d.gotify_server)),
            ("GOTIFY_TIMEOUT".into(), d.gotify_timeout.to_string()),
            ("LISTEN_PORT".into(), d.listen_port.to_string()),
            ("VERBOSE".into(), d.verbose.to_string()),
        ]
    }
}

fn parse_yaml(content: &str) -> Result<HashMap<String, Value>, AppError> {
    if content.trim().is_empty() {
        return Ok(HashMap::new());
    }
    serde_yaml::from_str::<Option<HashMap<String, Value>>>(content)
        .map(Option::unwrap_or_default)
        .map_err(|err| AppError::Config(format!("Failed to parse config: {}", err)))
}

fn scalar(key: &str, value: &Value) -> Result<Option<String>, AppError> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::String(s) => Ok(Some(s.clone())),
        _ => Err(AppError::Config(format!("{} must be a scalar value", key))),
    }
}

/// Accepts the usual truthy/falsy spellings, case-insensitively.
pub fn parse_bool(key: &str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Ok(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Ok(false),
        _ => Err(AppError::Config(format!(
            "{} must be a boolean, got '{}'",
            key, raw
        ))),
    }
}

fn parse_port(key: &str, raw: &str) -> Result<u16, AppError> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(AppError::Config(format!(
            "{} must be a valid port, got '{}'",
            key, raw
        ))),
    }
}

fn parse_seconds(key: &str, raw: &str) -> Result<u64, AppError> {
    match raw.trim().parse::<u64>() {
        Ok(seconds) if seconds > 0 => Ok(seconds),
        _ => Err(AppError::Config(format!(
            "{} must be a positive number of seconds, got '{}'",
            key, raw
        ))),
    }
}
