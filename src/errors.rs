use actix_web::{
    error::ResponseError,
    http::{header, StatusCode},
    HttpResponse
};
use derive_more::Display;
use serde_json::{json, Value};
use validator::ValidationErrors;

use crate::constants::{
    MSG_DISPATCH_FAILED, MSG_INVALID_EMAIL, MSG_MISSING_FIELD, MSG_RATE_LIMITED, MSG_UNEXPECTED,
};

/// Every way a contact submission can fail. The `Display` text is what the
/// contact form shows to the visitor.
#[derive(Debug, Display)]
pub enum ContactError {
    #[display("{}", MSG_MISSING_FIELD)]
    MissingField,

    #[display("{}", MSG_INVALID_EMAIL)]
    InvalidEmail,

    #[display("{}", MSG_RATE_LIMITED)]
    RateLimited { retry_after_secs: u64 },

    #[display("{}", MSG_DISPATCH_FAILED)]
    Dispatch(DispatchError),

    #[display("{}", MSG_UNEXPECTED)]
    Unexpected(String),
}

impl ResponseError for ContactError {
    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());

        match self {
            ContactError::RateLimited { retry_after_secs } => response
                .insert_header((header::RETRY_AFTER, retry_after_secs.to_string()))
                .json(json!({ "error": self.to_string() })),
            ContactError::Dispatch(err) => response.json(json!({
                "error": self.to_string(),
                "details": err.details()
            })),
            ContactError::Unexpected(detail) => response.json(json!({
                "error": self.to_string(),
                "details": detail
            })),
            _ => response.json(json!({ "error": self.to_string() })),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ContactError::MissingField => StatusCode::BAD_REQUEST,
            ContactError::InvalidEmail => StatusCode::BAD_REQUEST,
            ContactError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ContactError::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ContactError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// The sender pattern is the only rule carried by `ContactRequest`.
impl From<ValidationErrors> for ContactError {
    fn from(_: ValidationErrors) -> Self {
        ContactError::InvalidEmail
    }
}

impl From<DispatchError> for ContactError {
    fn from(err: DispatchError) -> Self {
        ContactError::Dispatch(err)
    }
}

impl From<StoreError> for ContactError {
    fn from(err: StoreError) -> Self {
        ContactError::Unexpected(err.to_string())
    }
}

/// Failures talking to the transactional email provider.
#[derive(Debug, Display)]
pub enum DispatchError {
    #[display("Email provider unreachable: {_0}")]
    Transport(String),

    #[display("Email provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: Value },

    #[display("Malformed response from email provider: {_0}")]
    MalformedResponse(String),
}

impl DispatchError {
    /// Best-effort diagnostic payload returned to the caller.
    pub fn details(&self) -> Value {
        match self {
            DispatchError::Transport(message) => json!({
                "kind": "transport",
                "message": message
            }),
            DispatchError::Rejected { status, body } => json!({
                "kind": "rejected",
                "status": status,
                "body": body
            }),
            DispatchError::MalformedResponse(message) => json!({
                "kind": "malformed_response",
                "message": message
            }),
        }
    }
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DispatchError::MalformedResponse(err.to_string())
        } else if err.is_timeout() {
            DispatchError::Transport(format!("request timed out: {}", err))
        } else {
            DispatchError::Transport(err.to_string())
        }
    }
}

/// Failures of the shared rate-limit counter store.
#[derive(Debug, Display)]
pub enum StoreError {
    #[display("Redis connection failed: {_0}")]
    Connection(String),

    #[display("Redis operation failed: {_0}")]
    Operation(String),
}

impl From<deadpool_redis::PoolError> for StoreError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        StoreError::Connection(err.to_string())
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Operation(err.to_string())
    }
}
