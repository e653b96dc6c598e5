use chrono::{DateTime, Utc};

use crate::{
    clock::Clock,
    entities::contact::{ContactForm, ContactRequest, ContactResponse},
    errors::ContactError,
    mail::template::EmailTemplate,
    repositories::{
        mailer::EmailSender,
        rate_limit::{RateDecision, RateLimitStore},
    },
};

pub struct ContactHandler<L, M, C>
where
    L: RateLimitStore,
    M: EmailSender,
    C: Clock,
{
    pub rate_limiter: L,
    pub mailer: M,
    pub clock: C,
    pub template: EmailTemplate,
}

impl<L, M, C> ContactHandler<L, M, C>
where
    L: RateLimitStore,
    M: EmailSender,
    C: Clock,
{
    pub fn new(rate_limiter: L, mailer: M, clock: C, template: EmailTemplate) -> Self {
        ContactHandler {
            rate_limiter,
            mailer,
            clock,
            template,
        }
    }

    /// Validates, rate-limits and dispatches one contact form submission.
    ///
    /// Quota is consumed before the send is attempted, so a failed dispatch
    /// still counts against the fingerprint.
    pub async fn submit_contact(&self, form: ContactForm) -> Result<ContactResponse, ContactError> {
        let request = ContactRequest::try_from(form)
            .inspect_err(|e| tracing::debug!("Rejected contact submission: {:?}", e))?;

        let now = self.clock.now();
        match self.rate_limiter.check_and_increment(&request.fingerprint, now).await? {
            RateDecision::Allowed { count, .. } => {
                tracing::debug!(count, "Contact quota consumed");
            }
            RateDecision::Limited { reset_at } => {
                tracing::warn!(%reset_at, "Contact rate limit exceeded");
                return Err(ContactError::RateLimited {
                    retry_after_secs: retry_after_secs(now, reset_at),
                });
            }
        }

        let email = self.template.compose(&request, now);

        let email_id = self.mailer.send(&email).await.map_err(|e| {
            tracing::error!("Email sending failed: {}", e);
            ContactError::Dispatch(e)
        })?;

        tracing::info!(%email_id, "Contact email sent");
        Ok(ContactResponse {
            success: true,
            email_id,
        })
    }
}

/// Whole seconds until the window reopens, never less than one.
fn retry_after_secs(now: DateTime<Utc>, reset_at: DateTime<Utc>) -> u64 {
    let millis = (reset_at - now).num_milliseconds().max(0) as u64;
    millis.div_ceil(1000).max(1)
}
