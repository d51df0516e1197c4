//! Order repository trait.

use super::model::{Order, OrderStatus};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Persistence contract for orders.
///
/// Only `create` is required to be atomic: an order and its lines are
/// stored together or not at all.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Stores a new order with all of its lines.
    async fn create(&self, order: &Order) -> Result<()>;

    /// Persists a status change.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: status stored
    /// - `Err(GalleyError::NotFound)`: no such order
    /// - `Err(_)`: storage failure
    async fn update_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;

    async fn find_by_id(&self, order_id: &str) -> Result<Option<Order>>;

    /// Orders currently in `status`, oldest first.
    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>>;
}
