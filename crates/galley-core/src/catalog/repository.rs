//! Catalog repository trait.

use super::model::CatalogItem;
use crate::error::Result;
use async_trait::async_trait;

/// Source of orderable items.
///
/// Implementations may return unavailable items; the index filters them.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Returns all catalog items in the store's natural order.
    ///
    /// That order is the iteration order the matcher uses for tie-breaks.
    async fn available_items(&self) -> Result<Vec<CatalogItem>>;
}
