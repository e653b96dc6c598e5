use actix_web::{
    error::JsonPayloadError,
    http::StatusCode,
    HttpResponse,
    ResponseError,
};
use serde_json::json;

use crate::constants::MSG_INVALID_BODY;

/// Body extraction failure, reported in the same `{ "error", "details" }`
/// shape as the other API errors.
#[derive(Debug)]
pub struct JsonError {
    detail: String,
    status: StatusCode
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JSON payload error: {}", self.detail)
    }
}

impl ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status).json(json!({
            "error": MSG_INVALID_BODY,
            "details": self.detail,
        }))
    }
}

impl From<JsonPayloadError> for JsonError {
    fn from(err: JsonPayloadError) -> Self {
        let status = match &err {
            JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            JsonPayloadError::ContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        };

        tracing::debug!("Rejected request body: {}", err);
        JsonError {
            detail: err.to_string(),
            status,
        }
    }
}
