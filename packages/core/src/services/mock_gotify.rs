//! In-memory Gotify used by the dispatch and resolver tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::alerts::translate::OutboundNotification;
use crate::services::gotify::{GotifyResponse, NotificationBackend, RemoteNotification};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Send(OutboundNotification),
    Delete(i64),
    List,
    CheckLive,
}

pub struct MockGotify {
    stored: Vec<RemoteNotification>,
    client_key: bool,
    send_status: u16,
    delete_status: HashMap<i64, u16>,
    live: bool,
    calls: Mutex<Vec<Call>>,
}

fn response(status: u16) -> GotifyResponse {
    GotifyResponse {
        status,
        reason: reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("")
            .to_string(),
        json: None,
        reachable: true,
    }
}

impl MockGotify {
    pub fn new() -> Self {
        Self {
            stored: Vec::new(),
            client_key: true,
            send_status: 200,
            delete_status: HashMap::new(),
            live: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Store a message carrying `fingerprint` in its extras.
    pub fn with_message(mut self, id: i64, fingerprint: Option<&str>) -> Self {
        let extras = fingerprint
            .map(|fp| serde_json::json!({ "alertify": { "fingerprint": fp } }));
        self.stored.push(RemoteNotification { id, extras });
        self
    }

    pub fn without_client_key(mut self) -> Self {
        self.client_key = false;
        self
    }

    pub fn with_send_status(mut self, status: u16) -> Self {
        self.send_status = status;
        self
    }

    pub fn with_delete_status(mut self, id: i64, status: u16) -> Self {
        self.delete_status.insert(id, status);
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.live = false;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl NotificationBackend for MockGotify {
    async fn send(&self, payload: &OutboundNotification) -> GotifyResponse {
        self.record(Call::Send(payload.clone()));
        response(self.send_status)
    }

    async fn delete(&self, id: i64) -> GotifyResponse {
        self.record(Call::Delete(id));
        response(self.delete_status.get(&id).copied().unwrap_or(200))
    }

    async fn list(&self) -> Vec<RemoteNotification> {
        self.record(Call::List);
        if self.client_key {
            self.stored.clone()
        } else {
            Vec::new()
        }
    }

    async fn check_live(&self) -> GotifyResponse {
        self.record(Call::CheckLive);
        if self.live {
            response(200)
        } else {
            GotifyResponse {
                status: 502,
                reason: "Connection refused (os error 111)".to_string(),
                json: None,
                reachable: false,
            }
        }
    }

    fn can_list(&self) -> bool {
        self.client_key
    }
}
