use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::ContactError;

/// `local@domain.tld` shape check. Deliberately loose: no RFC 5322 parsing.
pub static EMAIL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email shape pattern is valid")
});

/// Contact form body as posted by the browser. Every field is optional on the
/// wire so an absent or `null` field surfaces as a missing-field error.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContactForm {
    pub sender: Option<String>,
    pub subject: Option<String>,
    pub content: Option<String>,
    pub fingerprint: Option<String>,
}

/// A submission that passed presence and email-shape checks.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct ContactRequest {
    #[validate(regex(path = *EMAIL_SHAPE, message = "Invalid email format"))]
    pub sender: String,

    pub subject: String,

    pub content: String,

    /// Opaque client identifier produced by the browser; the rate-limit key.
    pub fingerprint: String,
}

impl TryFrom<ContactForm> for ContactRequest {
    type Error = ContactError;

    fn try_from(form: ContactForm) -> Result<Self, Self::Error> {
        let request = ContactRequest {
            sender: required(form.sender)?,
            subject: required(form.subject)?,
            content: required(form.content)?,
            fingerprint: required(form.fingerprint)?,
        };

        request.validate()?;
        Ok(request)
    }
}

fn required(value: Option<String>) -> Result<String, ContactError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ContactError::MissingField)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub success: bool,
    pub email_id: String,
}
