//! Notification fan-out.

use super::templates::MessageTemplates;
use chrono::Utc;
use futures::future::join_all;
use galley_core::config::NotificationConfig;
use galley_core::error::{GalleyError, Result};
use galley_core::notification::{
    Audience, DeliveryOutcome, NotificationIntent, NotificationLogRepository, NotificationRecord,
    OutboundMessenger,
};
use galley_core::room::RoomRepository;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// What happened to one intent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    pub message: String,
    /// One record per attempt, including unresolved audiences.
    pub records: Vec<NotificationRecord>,
}

impl DispatchReport {
    pub fn sent(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::Sent))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::Failed(_)))
    }

    pub fn unresolved(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::RecipientUnresolved))
    }

    fn count(&self, pred: impl Fn(&DeliveryOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Renders intents, resolves recipients and sends to each one concurrently.
///
/// Never fails: unresolved recipients and messaging errors become
/// [`NotificationRecord`] outcomes, and log-append failures are only logged.
/// Cloning shares the collaborators and the shutdown token.
#[derive(Clone)]
pub struct NotificationDispatcher {
    messenger: Arc<dyn OutboundMessenger>,
    rooms: Arc<dyn RoomRepository>,
    log: Arc<dyn NotificationLogRepository>,
    config: Arc<NotificationConfig>,
    templates: Arc<MessageTemplates>,
    shutdown: CancellationToken,
}

impl NotificationDispatcher {
    pub fn new(
        messenger: Arc<dyn OutboundMessenger>,
        rooms: Arc<dyn RoomRepository>,
        log: Arc<dyn NotificationLogRepository>,
        config: NotificationConfig,
        currency_symbol: &str,
    ) -> Self {
        let templates = MessageTemplates::new(config.templates.clone(), currency_symbol);
        Self {
            messenger,
            rooms,
            log,
            config: Arc::new(config),
            templates: Arc::new(templates),
            shutdown: CancellationToken::new(),
        }
    }

    /// Sends `intent` now.
    pub async fn dispatch(&self, intent: &NotificationIntent) -> DispatchReport {
        let message = self.templates.render(intent);
        let order_id = intent.order.id.clone();
        let records = match self.resolve_recipients(intent).await {
            Err(e) => {
                tracing::warn!(
                    order_id = %order_id,
                    "[NotificationDispatcher] {e}; skipping"
                );
                vec![NotificationRecord {
                    order_id,
                    audience: intent.audience,
                    message: message.clone(),
                    recipient: None,
                    sent_at: Utc::now(),
                    outcome: DeliveryOutcome::RecipientUnresolved,
                }]
            }
            Ok(recipients) => {
                let sends = recipients.into_iter().map(|recipient| {
                    let messenger = self.messenger.clone();
                    let message = message.clone();
                    let order_id = order_id.clone();
                    let audience = intent.audience;
                    async move {
                        let outcome = match messenger.send(&recipient, &message).await {
                            Ok(()) => DeliveryOutcome::Sent,
                            Err(e) => {
                                tracing::warn!(
                                    order_id = %order_id,
                                    recipient = %recipient,
                                    "[NotificationDispatcher] send failed: {e}"
                                );
                                DeliveryOutcome::Failed(e.to_string())
                            }
                        };
                        NotificationRecord {
                            order_id,
                            audience,
                            message,
                            recipient: Some(recipient),
                            sent_at: Utc::now(),
                            outcome,
                        }
                    }
                });
                join_all(sends).await
            }
        };

        for record in &records {
            if let Err(e) = self.log.append(record).await {
                tracing::warn!(
                    order_id = %record.order_id,
                    "[NotificationDispatcher] failed to append notification record: {e}"
                );
            }
        }

        tracing::debug!(
            order_id = %intent.order.id,
            key = %intent.template_key(),
            attempts = records.len(),
            "[NotificationDispatcher] dispatched"
        );
        DispatchReport { message, records }
    }

    /// Dispatches immediate intents in order and schedules delayed ones.
    pub async fn dispatch_all(&self, intents: Vec<NotificationIntent>) -> Vec<DispatchReport> {
        let mut reports = Vec::new();
        for intent in intents {
            match intent.delay {
                Some(delay) => self.schedule_delayed(intent, delay),
                None => reports.push(self.dispatch(&intent).await),
            }
        }
        reports
    }

    /// Sends `intent` after `delay` on a background task.
    ///
    /// The task is dropped if [`NotificationDispatcher::shutdown`] runs
    /// before the delay elapses.
    pub fn schedule_delayed(&self, intent: NotificationIntent, delay: Duration) {
        let dispatcher = self.clone();
        let token = self.shutdown.clone();
        tracing::debug!(
            order_id = %intent.order.id,
            delay_secs = delay.as_secs(),
            "[NotificationDispatcher] scheduled {}",
            intent.template_key()
        );
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(
                        order_id = %intent.order.id,
                        "[NotificationDispatcher] delayed notification cancelled"
                    );
                }
                _ = tokio::time::sleep(delay) => {
                    dispatcher.dispatch(&intent).await;
                }
            }
        });
    }

    /// Cancels every pending delayed notification.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Recipients for the intent's audience; never an empty list.
    async fn resolve_recipients(&self, intent: &NotificationIntent) -> Result<Vec<String>> {
        let recipients: Vec<String> = match intent.audience {
            Audience::Guest => {
                let room_number = &intent.order.room_number;
                match self.rooms.find_by_phone_or_number(room_number).await {
                    Ok(Some(room)) => room.phone.into_iter().collect(),
                    Ok(None) => Vec::new(),
                    Err(e) => {
                        tracing::warn!(
                            room = %room_number,
                            "[NotificationDispatcher] guest lookup failed: {e}"
                        );
                        Vec::new()
                    }
                }
            }
            staff => self.config.staff_recipients(staff).to_vec(),
        };

        if recipients.is_empty() {
            return Err(GalleyError::recipient_unresolved(intent.audience));
        }
        Ok(recipients)
    }
}

#[cfg(test)]
#[path = "dispatcher_test.rs"]
mod tests;
