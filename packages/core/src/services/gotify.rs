use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method};
use serde::Deserialize;
use serde_json::Value;

use crate::alerts::translate::OutboundNotification;
use crate::config::Config;
use crate::error::AppError;

pub const GOTIFY_KEY_HEADER: &str = "X-Gotify-Key";

/// Outcome of one call to Gotify.
///
/// HTTP error statuses are ordinary values here; only transport failures
/// flip `reachable` to false.
#[derive(Debug, Clone, PartialEq)]
pub struct GotifyResponse {
    pub status: u16,
    pub reason: String,
    pub json: Option<Value>,
    pub reachable: bool,
}

impl GotifyResponse {
    pub fn is_success(&self) -> bool {
        self.reachable && (200..300).contains(&self.status)
    }

    fn transport_failure(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self {
                status: 504,
                reason: format!("timed out: {}", err),
                json: None,
                reachable: false,
            };
        }

        // Surface the OS error (code + message) when there is one.
        let mut source = std::error::Error::source(err);
        while let Some(inner) = source {
            if let Some(io) = inner.downcast_ref::<std::io::Error>() {
                return Self {
                    status: 502,
                    reason: io.to_string(),
                    json: None,
                    reachable: false,
                };
            }
            source = inner.source();
        }

        Self {
            status: 502,
            reason: err.to_string(),
            json: None,
            reachable: false,
        }
    }
}

/// A message already stored on the Gotify server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteNotification {
    pub id: i64,
    #[serde(default)]
    pub extras: Option<Value>,
}

impl RemoteNotification {
    /// `extras.alertify.fingerprint`, if this message was sent by us.
    pub fn fingerprint(&self) -> Option<&str> {
        self.extras.as_ref()?.get("alertify")?.get("fingerprint")?.as_str()
    }
}

#[derive(Debug, Deserialize)]
struct PagedMessages {
    #[serde(default)]
    messages: Vec<RemoteNotification>,
}

/// Everything the dispatch loop and health reporter need from Gotify.
#[async_trait]
pub trait NotificationBackend: Send + Sync {
    async fn send(&self, payload: &OutboundNotification) -> GotifyResponse;

    async fn delete(&self, id: i64) -> GotifyResponse;

    /// All stored messages. Empty when no client key is configured or the
    /// call fails.
    async fn list(&self) -> Vec<RemoteNotification>;

    async fn check_live(&self) -> GotifyResponse;

    /// Whether a client (read) key is configured. Listing and deleting
    /// both need it.
    fn can_list(&self) -> bool;
}

#[derive(Clone)]
pub struct GotifyClient {
    base_url: String,
    app_key: String,
    client_key: String,
    http: Client,
}

impl GotifyClient {
    pub fn new(
        base_url: impl Into<String>,
        app_key: impl Into<String>,
        client_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Network(err.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            app_key: app_key.into(),
            client_key: client_key.into(),
            http,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            config.gotify_base_url(),
            config.gotify_key.clone(),
            config.gotify_client.clone(),
            Duration::from_secs(config.gotify_timeout),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Reads and deletes use the client key, everything else the app key.
    fn key_for(&self, method: &Method) -> &str {
        if *method == Method::GET || *method == Method::DELETE {
            &self.client_key
        } else {
            &self.app_key
        }
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&OutboundNotification>,
    ) -> GotifyResponse {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json");

        let key = self.key_for(&method);
        if !key.is_empty() {
            request = request.header(GOTIFY_KEY_HEADER, key);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!("{} {} failed: {}", method, url, err);
                return GotifyResponse::transport_failure(&err);
            }
        };

        let status = response.status();
        let raw = match response.bytes().await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!("Failed to read Gotify response body: {}", err);
                Default::default()
            }
        };

        let json = if raw.is_empty() {
            None
        } else {
            match serde_json::from_slice::<Value>(&raw) {
                Ok(json) => Some(json),
                Err(err) => {
                    tracing::warn!("Gotify returned a non-JSON body: {}", err);
                    None
                }
            }
        };

        let result = GotifyResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            json,
            reachable: true,
        };
        tracing::debug!(
            "{} {} -> Status: {}, Reason: {}",
            method,
            path,
            result.status,
            result.reason
        );
        result
    }
}

#[async_trait]
impl NotificationBackend for GotifyClient {
    async fn send(&self, payload: &OutboundNotification) -> GotifyResponse {
        tracing::debug!(
            "Sending to Gotify:\n{}",
            serde_json::to_string_pretty(payload).unwrap_or_default()
        );
        self.call(Method::POST, "/message", Some(payload)).await
    }

    async fn delete(&self, id: i64) -> GotifyResponse {
        tracing::debug!("Deleting message ID {}", id);
        self.call(Method::DELETE, &format!("/message/{}", id), None).await
    }

    async fn list(&self) -> Vec<RemoteNotification> {
        if !self.can_list() {
            tracing::debug!("No client key is configured. No messages could be retrieved.");
            return Vec::new();
        }

        tracing::debug!("Fetching existing messages from Gotify");
        let response = self.call(Method::GET, "/message", None).await;
        if !response.is_success() {
            tracing::warn!(
                "Listing messages failed: {} {}",
                response.status,
                response.reason
            );
            return Vec::new();
        }

        match response.json.map(serde_json::from_value::<PagedMessages>) {
            Some(Ok(page)) => page.messages,
            Some(Err(err)) => {
                tracing::warn!("Unexpected message list from Gotify: {}", err);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    async fn check_live(&self) -> GotifyResponse {
        self.call(Method::GET, "/health", None).await
    }

    fn can_list(&self) -> bool {
        !self.client_key.is_empty()
    }
}
