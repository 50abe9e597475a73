//! Chat relay HTTP handler.

use axum::extract::State;
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::server::AppState;

/// ANY /chat
///
/// Routed for every method so that the relay itself answers non-POST calls
/// with 405. The body is taken raw; an unparsable body is a 400, not an
/// extractor rejection.
///
/// Request body: `{"message": "..."}`
/// Response body: `{"reply": "..."}` or `{"error": "..."}`
pub async fn chat(State(state): State<AppState>, method: Method, body: Bytes) -> Response {
    match state.relay.handle(&method, &body).await {
        Ok(reply) => reply.into_response(),
        Err(e) => e.into_response(),
    }
}
