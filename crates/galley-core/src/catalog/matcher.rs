//! Phrase to catalog item resolution.
//!
//! Stages, in priority order:
//! 1. exact case-insensitive name
//! 2. substring containment in either direction
//! 3. normalized edit-distance similarity at or above the threshold
//!
//! Within a stage the first item in catalog iteration order wins. That
//! tie-break is arbitrary but deterministic.

use super::index::CatalogSnapshot;
use super::model::CatalogItem;
use crate::config::MatchingConfig;
use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_FILLER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?:the|some|more|of|(?:orders?|plates?|cups?|glasses?|bottles?|servings?|bowls?|pieces?|slices?) of)\s+)+",
    )
    .expect("leading filler pattern is valid")
});

static TRAILING_FILLER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\s+(?:please|thanks|thank you))+$").expect("trailing filler pattern is valid")
});

/// Which stage produced a match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchKind {
    Exact,
    Contained,
    Similar { score: f64 },
}

/// Outcome of matching one phrase.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    Matched { item: CatalogItem, kind: MatchKind },
    Unresolved,
}

impl MatchResult {
    pub fn item(&self) -> Option<&CatalogItem> {
        match self {
            Self::Matched { item, .. } => Some(item),
            Self::Unresolved => None,
        }
    }

    pub fn into_item(self) -> Option<CatalogItem> {
        match self {
            Self::Matched { item, .. } => Some(item),
            Self::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

/// Resolves free-text phrases against a catalog snapshot.
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    threshold: f64,
    min_containment_len: usize,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new(&MatchingConfig::default())
    }
}

impl FuzzyMatcher {
    pub fn new(config: &MatchingConfig) -> Self {
        Self {
            threshold: config.similarity_threshold,
            min_containment_len: config.min_containment_len,
        }
    }

    /// Returns the best catalog item for `phrase`, or `Unresolved`.
    pub fn resolve(&self, phrase: &str, catalog: &CatalogSnapshot) -> MatchResult {
        let cleaned = clean_phrase(phrase);
        if cleaned.is_empty() || catalog.is_empty() {
            return MatchResult::Unresolved;
        }

        let result = self.resolve_cleaned(&cleaned, catalog);
        if result.is_resolved() {
            return result;
        }

        // "coffees" and "sandwiches" fall back to a naive singular
        for singular in singular_forms(&cleaned) {
            let retry = self.resolve_cleaned(&singular, catalog);
            if retry.is_resolved() {
                return retry;
            }
        }

        MatchResult::Unresolved
    }

    fn resolve_cleaned(&self, phrase: &str, catalog: &CatalogSnapshot) -> MatchResult {
        if let Some(item) = catalog.lookup_exact(phrase) {
            return MatchResult::Matched {
                item: item.clone(),
                kind: MatchKind::Exact,
            };
        }

        if let Some(item) = self.find_contained(phrase, catalog) {
            return MatchResult::Matched {
                item: item.clone(),
                kind: MatchKind::Contained,
            };
        }

        self.find_similar(phrase, catalog)
    }

    fn find_contained<'a>(
        &self,
        phrase: &str,
        catalog: &'a CatalogSnapshot,
    ) -> Option<&'a CatalogItem> {
        let phrase_len = phrase.chars().count();
        catalog.items().iter().find(|item| {
            let name = item.match_key();
            phrase.contains(name.as_str())
                || (phrase_len >= self.min_containment_len && name.contains(phrase))
        })
    }

    fn find_similar(&self, phrase: &str, catalog: &CatalogSnapshot) -> MatchResult {
        let mut best: Option<(&CatalogItem, f64)> = None;

        for item in catalog.items() {
            let score = similarity(phrase, &item.match_key());
            if score < self.threshold {
                continue;
            }
            // Strictly greater keeps the earliest item on ties
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((item, score)),
            }
        }

        match best {
            Some((item, score)) => MatchResult::Matched {
                item: item.clone(),
                kind: MatchKind::Similar { score },
            },
            None => MatchResult::Unresolved,
        }
    }
}

/// `(maxLen - editDistance) / maxLen`, counted in characters.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = strsim::levenshtein(a, b);
    (max_len - distance.min(max_len)) as f64 / max_len as f64
}

fn clean_phrase(phrase: &str) -> String {
    let collapsed = phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let trimmed = collapsed.trim_matches(|c: char| !c.is_alphanumeric());
    let without_lead = LEADING_FILLER.replace(trimmed, "");
    TRAILING_FILLER
        .replace(&without_lead, "")
        .trim()
        .to_string()
}

fn singular_forms(phrase: &str) -> Vec<String> {
    let mut forms = Vec::new();
    if let Some(stem) = phrase.strip_suffix("es") {
        forms.push(stem.to_string());
    }
    if let Some(stem) = phrase.strip_suffix('s') {
        if !stem.ends_with('s') {
            forms.push(stem.to_string());
        }
    }
    forms.retain(|f| !f.is_empty());
    forms
}
