//! TOML-file catalog and room source.
//!
//! ```toml
//! [[item]]
//! id = 1
//! name = "Caesar Salad"
//! price = "12.99"
//! category = "Salads"
//!
//! [[room]]
//! number = "412"
//! guest_name = "Ada Lovelace"
//! phone = "+15550100412"
//! ```
//!
//! The file is re-read on every call so a catalog refresh picks up edits.

use async_trait::async_trait;
use galley_core::catalog::{CatalogItem, CatalogRepository};
use galley_core::error::{GalleyError, Result};
use galley_core::room::{Room, RoomRepository};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "item")]
    items: Vec<CatalogItem>,
    #[serde(default, rename = "room")]
    rooms: Vec<Room>,
}

pub struct TomlCatalogRepository {
    path: PathBuf,
}

impl TomlCatalogRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<CatalogFile> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            GalleyError::storage(format!(
                "Failed to read catalog file at {}: {e}",
                self.path.display()
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            GalleyError::storage(format!(
                "Failed to parse catalog file at {}: {e}",
                self.path.display()
            ))
        })
    }
}

#[async_trait]
impl CatalogRepository for TomlCatalogRepository {
    async fn available_items(&self) -> Result<Vec<CatalogItem>> {
        let file = self.read().await?;
        tracing::debug!(
            "[TomlCatalogRepository] read {} items from {}",
            file.items.len(),
            self.path.display()
        );
        Ok(file.items)
    }
}

#[async_trait]
impl RoomRepository for TomlCatalogRepository {
    async fn find_by_phone_or_number(&self, phone_or_number: &str) -> Result<Option<Room>> {
        let file = self.read().await?;
        Ok(file.rooms.into_iter().find(|room| room.matches(phone_or_number)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MENU: &str = r#"
[[item]]
id = 1
name = "Caesar Salad"
price = "12.99"
category = "Salads"

[[item]]
id = 8
name = "Coffee"
price = "3.99"

[[item]]
id = 9
name = "Lobster Bisque"
price = "18.00"
available = false

[[room]]
number = "412"
guest_name = "Ada Lovelace"
phone = "+15550100412"
"#;

    fn menu_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_reads_items_in_file_order() {
        let file = menu_file(MENU);
        let repo = TomlCatalogRepository::new(file.path());

        let items = repo.available_items().await.unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].name, "Caesar Salad");
        assert_eq!(items[0].price, Decimal::new(1299, 2));
        assert_eq!(items[0].category.as_deref(), Some("Salads"));
        assert!(items[1].available);
        assert!(!items[2].available);
    }

    #[tokio::test]
    async fn test_rooms_by_phone_or_number() {
        let file = menu_file(MENU);
        let repo = TomlCatalogRepository::new(file.path());

        let by_phone = repo.find_by_phone_or_number("+15550100412").await.unwrap();
        assert_eq!(by_phone.unwrap().number, "412");
        let by_number = repo.find_by_phone_or_number("412").await.unwrap();
        assert_eq!(by_number.unwrap().guest_name.as_deref(), Some("Ada Lovelace"));
        assert!(repo.find_by_phone_or_number("999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_edits_are_visible_on_next_read() {
        let file = menu_file(MENU);
        let repo = TomlCatalogRepository::new(file.path());
        assert_eq!(repo.available_items().await.unwrap().len(), 3);

        std::fs::write(
            file.path(),
            "[[item]]\nid = 2\nname = \"Club Sandwich\"\nprice = \"14.50\"\n",
        )
        .unwrap();
        let items = repo.available_items().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Club Sandwich");
    }

    #[tokio::test]
    async fn test_missing_or_malformed_file_is_storage_error() {
        let missing = TomlCatalogRepository::new("/nonexistent/galley/menu.toml");
        assert!(missing.available_items().await.unwrap_err().is_storage());

        let file = menu_file("[[item]]\nid = \"not a number\"\n");
        let malformed = TomlCatalogRepository::new(file.path());
        assert!(malformed.available_items().await.unwrap_err().is_storage());
    }
}
