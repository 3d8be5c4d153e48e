//! Health reporting for orchestration probes.

use std::sync::Arc;

use crate::services::gotify::{GotifyResponse, NotificationBackend};

pub struct Healthcheck {
    backend: Arc<dyn NotificationBackend>,
}

impl Healthcheck {
    pub fn new(backend: Arc<dyn NotificationBackend>) -> Self {
        Self { backend }
    }

    /// Raw result of Gotify's liveness endpoint.
    pub async fn gotify_alive(&self) -> GotifyResponse {
        self.backend.check_live().await
    }

    /// True when Gotify answered at all. Any HTTP status counts, since even
    /// a 401 proves the server is reachable.
    pub async fn report(&self) -> bool {
        let response = self.gotify_alive().await;
        if !response.reachable {
            tracing::error!("Gotify is unreachable: {}", response.reason);
        }
        response.reachable
    }
}
