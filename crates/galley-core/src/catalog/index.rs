//! In-memory catalog index.
//!
//! The index holds an `Arc` to an immutable [`CatalogSnapshot`]. A refresh
//! builds a complete new snapshot and swaps the pointer, so readers see
//! either the old catalog or the new one, never a mix.

use super::model::{CatalogItem, ItemId, normalize_name};
use super::repository::CatalogRepository;
use crate::error::{GalleyError, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// An immutable view of the orderable items at one point in time.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    items: Vec<CatalogItem>,
    by_name: HashMap<String, usize>,
    by_id: HashMap<ItemId, usize>,
    loaded_at: Option<DateTime<Utc>>,
}

impl CatalogSnapshot {
    /// Builds a snapshot from available items only, preserving input order.
    pub fn from_items(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        let items: Vec<CatalogItem> = items.into_iter().filter(|i| i.available).collect();

        let mut by_name = HashMap::with_capacity(items.len());
        let mut by_id = HashMap::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            // First entry wins for duplicate names or ids
            by_name.entry(item.match_key()).or_insert(idx);
            by_id.entry(item.id).or_insert(idx);
        }

        Self {
            items,
            by_name,
            by_id,
            loaded_at: Some(Utc::now()),
        }
    }

    /// Items in catalog iteration order.
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    /// Case-insensitive exact name lookup.
    pub fn lookup_exact(&self, name: &str) -> Option<&CatalogItem> {
        self.by_name
            .get(&normalize_name(name))
            .map(|&idx| &self.items[idx])
    }

    pub fn get(&self, id: ItemId) -> Option<&CatalogItem> {
        self.by_id.get(&id).map(|&idx| &self.items[idx])
    }
}

/// Shared catalog index refreshed on demand.
pub struct CatalogIndex {
    repository: Arc<dyn CatalogRepository>,
    current: RwLock<Arc<CatalogSnapshot>>,
}

impl CatalogIndex {
    /// Creates an empty index; nothing is loaded until [`CatalogIndex::load`].
    pub fn new(repository: Arc<dyn CatalogRepository>) -> Self {
        Self {
            repository,
            current: RwLock::new(Arc::new(CatalogSnapshot::default())),
        }
    }

    /// Returns the current snapshot. Cheap: clones an `Arc`.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Whether any refresh has succeeded yet.
    pub fn is_loaded(&self) -> bool {
        self.snapshot().loaded_at().is_some()
    }

    /// Case-insensitive exact lookup against the current snapshot.
    pub fn lookup_exact(&self, name: &str) -> Option<CatalogItem> {
        self.snapshot().lookup_exact(name).cloned()
    }

    /// Reloads from the repository and swaps in the new snapshot.
    ///
    /// On failure the previous snapshot stays in place and
    /// [`GalleyError::CatalogUnavailable`] is returned; callers treat it as a
    /// warning.
    pub async fn load(&self) -> Result<Vec<CatalogItem>> {
        let items = match self.repository.available_items().await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    kept_items = self.snapshot().len(),
                    "[CatalogIndex] refresh failed, keeping previous snapshot"
                );
                return Err(GalleyError::CatalogUnavailable(e.to_string()));
            }
        };

        let snapshot = Arc::new(CatalogSnapshot::from_items(items));
        let loaded = snapshot.items().to_vec();
        self.swap(snapshot);

        tracing::info!(items = loaded.len(), "[CatalogIndex] catalog refreshed");
        Ok(loaded)
    }

    fn swap(&self, snapshot: Arc<CatalogSnapshot>) {
        match self.current.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }
}
