use std::{fmt, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use url::Url;
use zeroize::Zeroizing;

use crate::{
    entities::email::OutgoingEmail,
    errors::DispatchError,
    repositories::mailer::EmailSender,
    settings::AppConfig,
};

#[derive(Debug, Deserialize)]
struct SentEmail {
    id: String,
}

/// Client for a Resend-compatible `POST /emails` API.
#[derive(Clone)]
pub struct ResendClient {
    http: Client,
    endpoint: Url,
    api_key: Zeroizing<String>,
}

impl ResendClient {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.email_timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build email HTTP client")?;

        let base = config.email_api_base_url.as_str().trim_end_matches('/');
        let endpoint = Url::parse(&format!("{base}/emails"))
            .context("Invalid email API base URL")?;

        Ok(ResendClient {
            http,
            endpoint,
            api_key: Zeroizing::new(config.email_api_key.clone()),
        })
    }
}

#[async_trait]
impl EmailSender for ResendClient {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, DispatchError> {
        let response = self.http
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.as_str())
            .json(email)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            return Err(DispatchError::Rejected { status: status.as_u16(), body });
        }

        let sent: SentEmail = response
            .json()
            .await
            .map_err(|e| DispatchError::MalformedResponse(e.to_string()))?;

        if sent.id.trim().is_empty() {
            return Err(DispatchError::MalformedResponse("empty message id".to_string()));
        }

        Ok(sent.id)
    }
}

impl fmt::Debug for ResendClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResendClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
