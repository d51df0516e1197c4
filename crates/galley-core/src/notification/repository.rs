//! Notification log repository trait.

use super::model::NotificationRecord;
use crate::error::Result;
use async_trait::async_trait;

/// Append-only store of delivery attempts.
#[async_trait]
pub trait NotificationLogRepository: Send + Sync {
    async fn append(&self, record: &NotificationRecord) -> Result<()>;

    /// Records for one order, oldest first.
    async fn list_for_order(&self, order_id: &str) -> Result<Vec<NotificationRecord>>;
}
