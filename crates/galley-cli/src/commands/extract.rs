use super::utils::{channel, load_config};
use anyhow::{Context, Result};
use galley_core::catalog::{CatalogIndex, FuzzyMatcher};
use galley_core::extraction::OrderExtractor;
use galley_infrastructure::TomlCatalogRepository;
use std::path::Path;
use std::sync::Arc;

pub async fn run(catalog: &Path, config: Option<&Path>, voice: bool, text: &str) -> Result<()> {
    let config = load_config(config)?;
    let index = CatalogIndex::new(Arc::new(TomlCatalogRepository::new(catalog)));
    index.load().await.context("Failed to load catalog")?;

    let extractor = OrderExtractor::new(FuzzyMatcher::new(&config.matching));
    let report = extractor.extract_detailed(text, channel(voice), &index.snapshot());

    let output = serde_json::json!({
        "lines": report.lines,
        "unresolved": report.unresolved,
        "used_fallback": report.used_fallback,
        "instructions": report.instructions,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
