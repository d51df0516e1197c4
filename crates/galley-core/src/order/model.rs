//! Order domain model.

use crate::catalog::{CatalogItem, ItemId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Order identifier (UUID v4 string).
pub type OrderId = String;

/// Fulfillment status of an order.
///
/// ```text
/// pending -> confirmed -> preparing -> ready -> delivered
///    \___________\____________\__________\_____> cancelled
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Statuses reachable in one step from `self`.
    pub fn allowed_successors(self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[Preparing, Cancelled],
            Preparing => &[Ready, Cancelled],
            Ready => &[Delivered, Cancelled],
            Delivered | Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.allowed_successors().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_successors().is_empty()
    }
}

/// One quantified item of an order.
///
/// The unit price is captured when the line is built, so later catalog
/// price changes never touch existing orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl OrderLine {
    pub fn from_item(item: &CatalogItem, quantity: u32) -> Self {
        Self {
            item_id: item.id,
            name: item.name.clone(),
            quantity,
            unit_price: item.price,
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Merges lines for the same item by summing quantities, keeping the order
/// of first appearance and the first captured price.
pub fn merge_lines(lines: impl IntoIterator<Item = OrderLine>) -> Vec<OrderLine> {
    let mut merged: Vec<OrderLine> = Vec::new();
    for line in lines {
        match merged.iter_mut().find(|l| l.item_id == line.item_id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
            None => merged.push(line),
        }
    }
    merged
}

/// Where an order came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderSource {
    /// Placed through a conversation session.
    Conversation { session_key: String },
    /// Entered directly by staff or another system.
    Direct,
}

/// A room-service order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub room_number: String,
    pub lines: Vec<OrderLine>,
    /// Sum of line totals, frozen at creation.
    pub total: Decimal,
    pub status: OrderStatus,
    pub special_instructions: Option<String>,
    pub source: OrderSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Short id used in guest-facing messages.
    pub fn short_id(&self) -> &str {
        let end = self
            .id
            .char_indices()
            .nth(8)
            .map(|(idx, _)| idx)
            .unwrap_or(self.id.len());
        &self.id[..end]
    }

    /// "2 x Coffee, 1 x Caesar Salad"
    pub fn item_summary(&self) -> String {
        summarize_lines(&self.lines)
    }
}

pub fn summarize_lines(lines: &[OrderLine]) -> String {
    lines
        .iter()
        .map(|l| format!("{} x {}", l.quantity, l.name))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn lines_total(lines: &[OrderLine]) -> Decimal {
    lines.iter().map(OrderLine::line_total).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    fn line(id: i64, qty: u32, cents: i64) -> OrderLine {
        OrderLine {
            item_id: id,
            name: format!("item-{id}"),
            quantity: qty,
            unit_price: Decimal::new(cents, 2),
        }
    }

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!(OrderStatus::from_str("READY").unwrap(), OrderStatus::Ready);
        assert_eq!(OrderStatus::Preparing.to_string(), "preparing");
        assert!(OrderStatus::from_str("teleported").is_err());
    }

    #[test]
    fn test_cancel_reachable_from_every_non_terminal_status() {
        for status in OrderStatus::iter() {
            if status.is_terminal() {
                assert!(!status.can_transition_to(OrderStatus::Cancelled));
            } else {
                assert!(status.can_transition_to(OrderStatus::Cancelled), "{status}");
            }
        }
    }

    #[test]
    fn test_only_delivered_and_cancelled_are_terminal() {
        let terminal: Vec<_> = OrderStatus::iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(terminal, vec![OrderStatus::Delivered, OrderStatus::Cancelled]);
    }

    #[test]
    fn test_merge_lines_sums_duplicates_in_first_seen_order() {
        let merged = merge_lines(vec![line(8, 2, 399), line(1, 1, 1299), line(8, 1, 399)]);
        assert_eq!(merged.len(), 2);
        assert_eq!((merged[0].item_id, merged[0].quantity), (8, 3));
        assert_eq!((merged[1].item_id, merged[1].quantity), (1, 1));
    }

    #[test]
    fn test_lines_total_is_exact() {
        let total = lines_total(&[line(8, 2, 399), line(1, 1, 1299)]);
        assert_eq!(total, Decimal::new(2097, 2));
    }
}
