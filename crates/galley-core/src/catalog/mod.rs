//! Catalog domain module.
//!
//! # Module Structure
//!
//! - `model`: Orderable item (`CatalogItem`)
//! - `repository`: Source of catalog items (`CatalogRepository`)
//! - `index`: Snapshot-and-swap in-memory index (`CatalogIndex`)
//! - `matcher`: Phrase to item resolution (`FuzzyMatcher`)

mod index;
mod matcher;
mod model;
mod repository;

pub use index::{CatalogIndex, CatalogSnapshot};
pub use matcher::{FuzzyMatcher, MatchKind, MatchResult};
pub use model::{CatalogItem, ItemId};
pub use repository::CatalogRepository;
