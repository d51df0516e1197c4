//! Outbound messenger that logs instead of sending.
//!
//! Used by the CLI simulator: every message is written to the tracing log and
//! kept in an outbox the caller can drain and print.

use async_trait::async_trait;
use galley_core::error::Result;
use galley_core::notification::OutboundMessenger;
use tokio::sync::Mutex;

/// A message accepted by [`LoggingMessenger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxEntry {
    pub recipient: String,
    pub message: String,
}

#[derive(Default)]
pub struct LoggingMessenger {
    outbox: Mutex<Vec<OutboxEntry>>,
}

impl LoggingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns everything sent since the last drain.
    pub async fn drain(&self) -> Vec<OutboxEntry> {
        std::mem::take(&mut *self.outbox.lock().await)
    }
}

#[async_trait]
impl OutboundMessenger for LoggingMessenger {
    async fn send(&self, recipient: &str, message: &str) -> Result<()> {
        tracing::info!(recipient, "[LoggingMessenger] {message}");
        self.outbox.lock().await.push(OutboxEntry {
            recipient: recipient.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}
