//! `POST /alert` — Alertmanager's webhook receiver.

use axum::{body::Bytes, extract::State, response::Response};
use serde_json::Value;

use super::{plain_response, AppState};
use crate::alerts::model::AlertBatch;
use crate::error::TranslateError;

/// Parse the webhook body and run it through the dispatcher.
///
/// The body is parsed by hand rather than with `Json<_>` so that every
/// malformed payload answers `400 Bad JSON: <detail>`.
pub async fn receive_alerts(State(state): State<AppState>, body: Bytes) -> Response {
    if !state.configured {
        tracing::error!("Gotify app key is not set; check requirements");
        return plain_response(500, "Server not configured correctly");
    }

    let message: Value = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(err) => return bad_json(err),
    };

    tracing::debug!(
        "Received from Alertmanager:\n{}",
        serde_json::to_string_pretty(&message).unwrap_or_default()
    );

    let batch: AlertBatch = match serde_json::from_value(message) {
        Ok(batch) => batch,
        Err(err) => return bad_json(err),
    };

    let Some(alerts) = batch.alerts else {
        let err = TranslateError::missing("alerts");
        tracing::error!("{}", err);
        return plain_response(400, err.to_string());
    };

    let result = state.dispatcher.handle_batch(&alerts).await;
    plain_response(result.status, result.reason)
}

fn bad_json(err: serde_json::Error) -> Response {
    tracing::error!("Bad JSON: {}", err);
    plain_response(400, format!("Bad JSON: {}", err))
}
