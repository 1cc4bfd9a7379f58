use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// JSON envelope shared by every loan endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub errors: Option<String>,
    pub code: u16,
}

impl<T> ApiResponse<T> {
    pub fn success(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            errors: None,
            code: status.as_u16(),
        }
    }

    pub fn failure(status: StatusCode, message: impl Into<String>, errors: String) -> Self {
        Self {
            message: message.into(),
            data: None,
            errors: Some(errors),
            code: status.as_u16(),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
