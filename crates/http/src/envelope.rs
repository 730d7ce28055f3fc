//! The `{status, message, data}` wrapper returned by every book endpoint.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

pub const SUCCESS_MESSAGE: &str = "success";
pub const ERROR_MESSAGE: &str = "error";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// Numeric HTTP status, repeated in the body.
    pub status: u16,
    pub message: String,
    /// Operation-specific payload; serialized as `null` when absent.
    pub data: Option<Value>,
}

impl Envelope {
    pub fn success(status: StatusCode, data: Option<Value>) -> Self {
        Self {
            status: status.as_u16(),
            message: SUCCESS_MESSAGE.to_string(),
            data,
        }
    }

    /// Error envelope; the raw error text travels under `data.data`.
    pub fn error(status: StatusCode, text: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            message: ERROR_MESSAGE.to_string(),
            data: Some(json!({ "data": text.into() })),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}
