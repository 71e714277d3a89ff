//! HTTP API handlers.

pub mod generate;
pub mod health;

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

/// Plain-text error response.
pub fn err_text(status: u16, message: &str) -> Response {
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        message.to_string(),
    )
        .into_response()
}
