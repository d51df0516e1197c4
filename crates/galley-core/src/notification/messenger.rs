//! Outbound messaging collaborator.

use crate::error::Result;
use async_trait::async_trait;

/// Sends a rendered message to one recipient (SMS gateway, pager, ...).
#[async_trait]
pub trait OutboundMessenger: Send + Sync {
    /// # Errors
    ///
    /// Returns [`GalleyError::Messaging`](crate::error::GalleyError::Messaging)
    /// when the transport rejects or cannot deliver the message.
    async fn send(&self, recipient: &str, message: &str) -> Result<()>;
}
