//! Turns handler panics into failure envelopes.

use crate::error::FailureEnvelope;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;

/// Layer that converts a panic anywhere below it into HTTP 500 with
/// `{"success": false, "error": <panic message>}`.
pub fn catch_panic_layer() -> CatchPanicLayer<fn(Box<dyn Any + Send + 'static>) -> Response> {
    CatchPanicLayer::custom(panic_to_response as fn(Box<dyn Any + Send + 'static>) -> Response)
}

fn panic_to_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(err.as_ref());
    tracing::error!(panic = %message, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(FailureEnvelope::new(message)),
    )
        .into_response()
}

fn panic_message(err: &(dyn Any + Send)) -> String {
    if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    }
}
