//! Error handling for the HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use uuid::Uuid;

use crate::envelope::Envelope;

/// Application error types that map to HTTP responses.
///
/// The underlying error text is returned to the caller unchanged.
#[derive(Error, Debug)]
pub enum AppError {
    /// The request could not be read: unparsable body or path parameter.
    #[error("{message}")]
    BadRequest { message: String },

    /// The request was readable but its content was rejected.
    #[error("{message}")]
    Validation { message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } | AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let status = self.status();

        let (error_code, message) = match self {
            AppError::BadRequest { message } => ("bad_request", message),
            AppError::Validation { message } => ("validation_error", message),
            AppError::Internal(e) => ("internal_error", format!("{:#}", e)),
        };

        if status.is_server_error() {
            tracing::error!(
                error_id = %error_id,
                error_code,
                status_code = %status.as_u16(),
                error = %message,
                "Request error"
            );
        } else {
            tracing::warn!(
                error_id = %error_id,
                error_code,
                status_code = %status.as_u16(),
                error = %message,
                "Request rejected"
            );
        }

        Envelope::error(status, message).into_response()
    }
}
