use super::response::ApiResponse;
use crate::error::LoanError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use validator::ValidationErrors;

/// Maps every engine error kind to exactly one HTTP status.
pub fn status_for(err: &LoanError) -> StatusCode {
    match err {
        LoanError::NotFound { .. } => StatusCode::NOT_FOUND,
        LoanError::InvalidState { .. }
        | LoanError::InvalidArgument(_)
        | LoanError::Overfunding { .. }
        | LoanError::ValidationError(_) => StatusCode::BAD_REQUEST,
        LoanError::Notification { .. } => StatusCode::BAD_GATEWAY,
        LoanError::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Error returned by HTTP handlers, rendered as an [`ApiResponse`] envelope.
#[derive(Debug)]
pub enum ApiError {
    /// The body could not be parsed as the expected JSON.
    InvalidBody(String),
    /// The body parsed but failed field validation.
    Validation(String),
    /// The engine rejected the call; `message` describes the operation.
    Engine {
        message: &'static str,
        source: LoanError,
    },
}

impl ApiError {
    /// Wraps an engine error with a handler-specific message.
    pub fn context(message: &'static str) -> impl FnOnce(LoanError) -> ApiError {
        move |source| ApiError::Engine { message, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidBody(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Engine { source, .. } => status_for(source),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

impl From<LoanError> for ApiError {
    fn from(err: LoanError) -> Self {
        match err {
            LoanError::ValidationError(msg) => ApiError::Validation(msg),
            other => ApiError::Engine {
                message: "Request failed",
                source: other,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, errors) = match self {
            ApiError::InvalidBody(detail) => ("Invalid request body", detail),
            ApiError::Validation(detail) => ("Validation error", detail),
            ApiError::Engine { message, source } => {
                if status.is_server_error() {
                    tracing::error!(error = %source, "request failed");
                }
                (message, error_chain(&source))
            }
        };
        ApiResponse::<()>::failure(status, message, errors).into_response()
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
