//! Response envelope and error mapping.
//!
//! Every admin endpoint answers `{success, message?, data?}`. Failures carry
//! `message` as a list of strings and a status derived from the error kind.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::AdminError;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self { success: true, message: None, data: Some(data) })
    }

    pub fn ok_with_message(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self { success: true, message: Some(vec![message.into()]), data: Some(data) })
    }
}

impl ApiResponse<()> {
    pub fn failure(messages: Vec<String>) -> Json<Self> {
        Json(Self { success: false, message: Some(messages), data: None })
    }
}

pub fn status_for(err: &AdminError) -> StatusCode {
    match err {
        AdminError::Validation(_) | AdminError::HealthCheckFailed { .. } => StatusCode::BAD_REQUEST,
        AdminError::NotFound(_) => StatusCode::NOT_FOUND,
        AdminError::Conflict(_) => StatusCode::CONFLICT,
        AdminError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            tracing::error!(error = %self, "Admin request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "Admin request rejected");
        }
        (status, ApiResponse::<()>::failure(vec![self.to_string()])).into_response()
    }
}

pub fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        ApiResponse::<()>::failure(vec!["missing or invalid API key".to_string()]),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&AdminError::validation("x")), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&AdminError::HealthCheckFailed { url: "u".into(), reason: "r".into() }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_for(&AdminError::not_found("x")), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&AdminError::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(status_for(&AdminError::Internal("x".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_envelope_shape() {
        let Json(body) = ApiResponse::<()>::failure(vec!["nope".into()]);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "message": ["nope"]}));
    }
}
