use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use grantwatch_core::AppError;

use crate::api_config::FailureResponseMode;

/// Plain-text body of every successfully handled event.
pub const SUCCESS_MESSAGE: &str = "PAM Grant Summary Processed Successfully";

/// HTTP error wrapper around core application errors.
///
/// Only malformed envelopes are reported as client errors. Every other
/// failure is acknowledged unless redelivery is enabled and the failure was
/// transient.
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    mode: FailureResponseMode,
}

impl ApiError {
    pub fn new(error: AppError, mode: FailureResponseMode) -> Self {
        Self { error, mode }
    }

    fn status(&self) -> StatusCode {
        match (&self.error, self.mode) {
            (AppError::MalformedEvent(_), _) => StatusCode::BAD_REQUEST,
            (error, FailureResponseMode::Redeliver) if error.is_transient() => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::OK,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match (&self.error, status) {
            (AppError::MalformedEvent(reason), _) => format!("Bad Request: {reason}"),
            (_, StatusCode::OK) => SUCCESS_MESSAGE.to_owned(),
            (error, _) => format!("Service Unavailable: {error}"),
        };

        (status, body).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
