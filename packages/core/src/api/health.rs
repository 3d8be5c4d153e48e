use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use super::AppState;

/// `GET /healthcheck` — `200 OK` while Gotify is reachable, `500 ERR` otherwise.
pub async fn healthcheck(State(state): State<AppState>) -> Response {
    let (status, body) = if state.healthcheck.report().await {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "ERR")
    };

    (
        status,
        [(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))],
        body,
    )
        .into_response()
}
