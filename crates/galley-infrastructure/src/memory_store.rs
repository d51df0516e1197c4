//! In-memory persistence for every repository trait.
//!
//! Suitable for the CLI simulator and tests. Orders are stored as whole
//! values, so `create` is atomic: an order and its lines appear together or
//! not at all.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use galley_core::catalog::{CatalogItem, CatalogRepository};
use galley_core::error::{GalleyError, Result};
use galley_core::notification::{NotificationLogRepository, NotificationRecord};
use galley_core::order::{Order, OrderId, OrderRepository, OrderStatus};
use galley_core::room::{Room, RoomRepository};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryStore {
    items: RwLock<Vec<CatalogItem>>,
    rooms: RwLock<Vec<Room>>,
    orders: RwLock<HashMap<OrderId, Order>>,
    notifications: RwLock<Vec<NotificationRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with catalog items and rooms.
    pub fn seeded(items: Vec<CatalogItem>, rooms: Vec<Room>) -> Self {
        Self {
            items: RwLock::new(items),
            rooms: RwLock::new(rooms),
            ..Self::default()
        }
    }

    /// Replaces the catalog; takes effect on the next index refresh.
    pub async fn set_items(&self, items: Vec<CatalogItem>) {
        *self.items.write().await = items;
    }

    pub async fn add_room(&self, room: Room) {
        self.rooms.write().await.push(room);
    }

    /// Every notification record, oldest first.
    pub async fn notification_log(&self) -> Vec<NotificationRecord> {
        self.notifications.read().await.clone()
    }
}

#[async_trait]
impl CatalogRepository for InMemoryStore {
    async fn available_items(&self) -> Result<Vec<CatalogItem>> {
        Ok(self.items.read().await.clone())
    }
}

#[async_trait]
impl RoomRepository for InMemoryStore {
    async fn find_by_phone_or_number(&self, phone_or_number: &str) -> Result<Option<Room>> {
        Ok(self
            .rooms
            .read()
            .await
            .iter()
            .find(|room| room.matches(phone_or_number))
            .cloned())
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn create(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(GalleyError::storage(format!(
                "order '{}' already exists",
                order.id
            )));
        }
        orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn update_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(order_id)
            .ok_or_else(|| GalleyError::order_not_found(order_id))?;
        order.status = status;
        order.updated_at = updated_at;
        Ok(())
    }

    async fn find_by_id(&self, order_id: &str) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(order_id).cloned())
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>> {
        let mut matching: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.status == status)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(matching)
    }
}

#[async_trait]
impl NotificationLogRepository for InMemoryStore {
    async fn append(&self, record: &NotificationRecord) -> Result<()> {
        self.notifications.write().await.push(record.clone());
        Ok(())
    }

    async fn list_for_order(&self, order_id: &str) -> Result<Vec<NotificationRecord>> {
        Ok(self
            .notifications
            .read()
            .await
            .iter()
            .filter(|r| r.order_id == order_id)
            .cloned()
            .collect())
    }
}
