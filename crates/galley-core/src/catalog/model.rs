//! Catalog item model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalog item identifier.
pub type ItemId = i64;

/// An orderable menu item.
///
/// Prices are fixed-point decimals; floating point never touches money.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,
    pub price: Decimal,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_available() -> bool {
    true
}

impl CatalogItem {
    pub fn new(id: ItemId, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            available: true,
            category: None,
            description: None,
        }
    }

    /// Lowercased, whitespace-collapsed name used for every comparison.
    pub fn match_key(&self) -> String {
        normalize_name(&self.name)
    }
}

pub(crate) fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
