use async_trait::async_trait;

use crate::{entities::email::OutgoingEmail, errors::DispatchError};

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Hands the message to the provider and returns the provider-assigned id.
    async fn send(&self, email: &OutgoingEmail) -> Result<String, DispatchError>;
}
