//! Order status state machine.
//!
//! The lifecycle owns status changes. Every successful change is persisted
//! first and then described as a list of [`NotificationIntent`]s; sending
//! them is somebody else's job, and a failed send never rolls a status back.

use super::model::{Order, OrderId, OrderLine, OrderSource, OrderStatus, lines_total, merge_lines};
use super::repository::OrderRepository;
use crate::error::{GalleyError, Result};
use crate::notification::{Audience, NotificationIntent};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Input for [`OrderLifecycle::create`].
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub room_number: String,
    pub lines: Vec<OrderLine>,
    pub special_instructions: Option<String>,
    pub source: OrderSource,
}

/// Result of a successful create or transition.
#[derive(Debug, Clone)]
pub struct Transition {
    /// The order after the change.
    pub order: Order,
    /// `None` when the order was just created.
    pub previous: Option<OrderStatus>,
    pub intents: Vec<NotificationIntent>,
}

/// Audiences told about an order entering `status`.
pub fn audiences_for(status: OrderStatus, previous: Option<OrderStatus>) -> Vec<Audience> {
    use Audience::*;
    match status {
        OrderStatus::Pending => vec![Guest, Management],
        OrderStatus::Confirmed => vec![Guest, Kitchen],
        OrderStatus::Preparing => vec![Guest],
        OrderStatus::Ready => vec![Guest, Delivery],
        OrderStatus::Delivered => vec![Guest],
        OrderStatus::Cancelled => {
            let mut audiences = vec![Guest, Kitchen, Management];
            if previous == Some(OrderStatus::Ready) {
                audiences.push(Delivery);
            }
            audiences
        }
    }
}

/// Creates orders and applies validated status transitions.
///
/// Transitions for one order are serialized; different orders proceed in
/// parallel.
pub struct OrderLifecycle {
    repository: Arc<dyn OrderRepository>,
    follow_up_delay: Duration,
    locks: Mutex<HashMap<OrderId, Arc<tokio::sync::Mutex<()>>>>,
}

impl OrderLifecycle {
    pub fn new(repository: Arc<dyn OrderRepository>, follow_up_delay: Duration) -> Self {
        Self {
            repository,
            follow_up_delay,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an order in `pending`. The only way into the lifecycle.
    ///
    /// Duplicate lines are merged and the total is computed once here.
    ///
    /// # Errors
    ///
    /// - `InvalidOrder` for no lines, a zero quantity or an empty room
    /// - `Storage` if the order could not be stored
    pub async fn create(&self, new_order: NewOrder) -> Result<Transition> {
        let room_number = new_order.room_number.trim().to_string();
        if room_number.is_empty() {
            return Err(GalleyError::invalid_order("room number is required"));
        }
        if new_order.lines.iter().any(|l| l.quantity == 0) {
            return Err(GalleyError::invalid_order("line quantity must be at least 1"));
        }
        let lines = merge_lines(new_order.lines);
        if lines.is_empty() {
            return Err(GalleyError::invalid_order("order has no lines"));
        }

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            room_number,
            total: lines_total(&lines),
            lines,
            status: OrderStatus::Pending,
            special_instructions: new_order
                .special_instructions
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            source: new_order.source,
            created_at: now,
            updated_at: now,
        };

        self.repository.create(&order).await?;
        tracing::info!(
            order_id = %order.id,
            room = %order.room_number,
            total = %order.total,
            "[OrderLifecycle] order created"
        );

        let intents = self.intents_for(&order, None);
        Ok(Transition {
            order,
            previous: None,
            intents,
        })
    }

    /// Moves an order to `next`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the order does not exist
    /// - `InvalidTransition` if `next` is not an allowed successor
    /// - `Storage` if the new status could not be persisted (status unchanged)
    pub async fn transition(&self, order_id: &str, next: OrderStatus) -> Result<Transition> {
        let lock = self.lock_for(order_id);
        let _guard = lock.lock().await;

        let mut order = self
            .repository
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| GalleyError::order_not_found(order_id))?;

        let previous = order.status;
        if !previous.can_transition_to(next) {
            tracing::debug!(
                order_id,
                from = %previous,
                to = %next,
                "[OrderLifecycle] rejected transition"
            );
            return Err(GalleyError::InvalidTransition {
                order_id: order_id.to_string(),
                from: previous.to_string(),
                to: next.to_string(),
            });
        }

        let now = Utc::now();
        self.repository.update_status(order_id, next, now).await?;
        order.status = next;
        order.updated_at = now;

        tracing::info!(
            order_id,
            from = %previous,
            to = %next,
            "[OrderLifecycle] status changed"
        );

        if next.is_terminal() {
            // Late waiters on the old lock still re-read the terminal status
            self.release(order_id);
        }

        let intents = self.intents_for(&order, Some(previous));
        Ok(Transition {
            order,
            previous: Some(previous),
            intents,
        })
    }

    pub async fn find(&self, order_id: &str) -> Result<Order> {
        self.repository
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| GalleyError::order_not_found(order_id))
    }

    pub async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>> {
        self.repository.list_by_status(status).await
    }

    fn intents_for(&self, order: &Order, previous: Option<OrderStatus>) -> Vec<NotificationIntent> {
        let mut intents: Vec<_> = audiences_for(order.status, previous)
            .into_iter()
            .map(|audience| NotificationIntent::immediate(order, audience))
            .collect();

        if order.status == OrderStatus::Delivered {
            intents.push(NotificationIntent::follow_up(
                order,
                Audience::Guest,
                self.follow_up_delay,
            ));
        }
        intents
    }

    fn lock_for(&self, order_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(order_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    fn release(&self, order_id: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.remove(order_id);
    }
}

#[cfg(test)]
#[path = "lifecycle_test.rs"]
mod tests;
