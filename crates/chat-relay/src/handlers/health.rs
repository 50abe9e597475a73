use axum::extract::State;
use axum::http::StatusCode;

use crate::server::AppState;

pub async fn livez() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Ready only once a provider API key is configured.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if state.relay.is_ready() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "provider not configured")
    }
}
