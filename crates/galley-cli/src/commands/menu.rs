use anyhow::{Context, Result};
use galley_core::catalog::CatalogIndex;
use galley_infrastructure::TomlCatalogRepository;
use std::path::Path;
use std::sync::Arc;

pub async fn run(catalog: &Path) -> Result<()> {
    let index = CatalogIndex::new(Arc::new(TomlCatalogRepository::new(catalog)));
    let items = index.load().await.context("Failed to load catalog")?;

    for item in items {
        match &item.category {
            Some(category) => println!(
                "{:>4}  {:<30} {:>8}  [{category}]",
                item.id,
                item.name,
                item.price.to_string()
            ),
            None => println!(
                "{:>4}  {:<30} {:>8}",
                item.id,
                item.name,
                item.price.to_string()
            ),
        }
    }
    Ok(())
}
