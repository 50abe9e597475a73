//! HTTP response shaping for relay results.
//!
//! All failure paths go through [`IntoResponse for RelayError`](RelayError) so
//! every error carries the same body shape and headers.

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::relay::{ChatReply, RelayError};

/// JSON error body: `{"error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

impl IntoResponse for ChatReply {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match self {
            RelayError::MethodNotAllowed => {
                (status, [(header::ALLOW, "POST")], "Method Not Allowed").into_response()
            }
            other => error(status, other.to_string()).into_response(),
        }
    }
}
