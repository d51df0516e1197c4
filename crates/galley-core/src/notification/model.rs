//! Notification intents and log records.

use crate::order::{Order, OrderId, OrderStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum::{Display, EnumIter, EnumString};

/// Notification target class.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Audience {
    Guest,
    Kitchen,
    Delivery,
    Management,
}

/// "Tell `audience` that `order` reached `status`", not yet rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationIntent {
    /// Snapshot of the order after the transition.
    pub order: Order,
    pub status: OrderStatus,
    pub audience: Audience,
    /// Send after this delay instead of immediately.
    pub delay: Option<Duration>,
    /// Selects the follow-up template for the status.
    pub follow_up: bool,
}

impl NotificationIntent {
    pub fn immediate(order: &Order, audience: Audience) -> Self {
        Self {
            order: order.clone(),
            status: order.status,
            audience,
            delay: None,
            follow_up: false,
        }
    }

    pub fn follow_up(order: &Order, audience: Audience, delay: Duration) -> Self {
        Self {
            order: order.clone(),
            status: order.status,
            audience,
            delay: Some(delay),
            follow_up: true,
        }
    }

    /// Template key such as `"ready.delivery"` or `"delivered.guest.follow_up"`.
    pub fn template_key(&self) -> String {
        if self.follow_up {
            format!("{}.{}.follow_up", self.status, self.audience)
        } else {
            format!("{}.{}", self.status, self.audience)
        }
    }
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Sent,
    Failed(String),
    RecipientUnresolved,
}

/// Append-only log entry, one per attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub order_id: OrderId,
    pub audience: Audience,
    pub message: String,
    pub recipient: Option<String>,
    pub sent_at: DateTime<Utc>,
    pub outcome: DeliveryOutcome,
}
