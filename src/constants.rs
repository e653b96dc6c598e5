use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Upper bound for JSON request bodies accepted by the API.
pub const MAX_JSON_BODY_BYTES: usize = 64 * 1024;

/// Key namespace for rate-limit counters kept in Redis.
pub const RATE_LIMIT_KEY_PREFIX: &str = "rl:contact";

// Messages shown inline by the contact form, in the form's display language.
pub const MSG_MISSING_FIELD: &str = "모든 필드를 입력해주세요.";
pub const MSG_INVALID_EMAIL: &str = "유효한 이메일 주소를 입력해주세요.";
pub const MSG_RATE_LIMITED: &str = "시간당 전송 한도를 초과했습니다. 잠시 후 다시 시도해주세요.";
pub const MSG_DISPATCH_FAILED: &str = "이메일 전송 중 오류가 발생했습니다.";
pub const MSG_INVALID_BODY: &str = "요청 형식이 올바르지 않습니다.";
pub const MSG_UNEXPECTED: &str = "요청을 처리하는 중 오류가 발생했습니다.";
