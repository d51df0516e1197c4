//! Utterance to order-line extraction.

use super::grammar::{Channel, Grammar};
use crate::catalog::{CatalogItem, CatalogSnapshot, FuzzyMatcher, ItemId, MatchResult};
use crate::order::OrderLine;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// "with extra pickles", "without onions", up to the next item or sentence.
static INSTRUCTION_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?P<kind>with|without)\s+(?P<what>[a-z][a-z' \-]*?)(?:\s+(?:and|please|then|plus)\b|\s*[,.;!?\n]|\s*$)",
    )
    .expect("instruction clause pattern is valid")
});

/// Full result of one extraction pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionReport {
    /// Aggregated lines in order of first appearance.
    pub lines: Vec<OrderLine>,
    /// Phrases a pattern found but the matcher could not resolve.
    pub unresolved: Vec<String>,
    /// Whether the lines came from the whole-catalog fallback scan.
    pub used_fallback: bool,
    /// Preparation requests such as "extra pickles" or "no onions".
    pub instructions: Vec<String>,
}

impl ExtractionReport {
    /// Nothing understood: callers ask again or hand off.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Turns utterances into quantified catalog selections.
///
/// Pure computation over a catalog snapshot; never fails. An empty result is
/// the "no match" outcome.
#[derive(Debug, Clone, Default)]
pub struct OrderExtractor {
    matcher: FuzzyMatcher,
}

impl OrderExtractor {
    pub fn new(matcher: FuzzyMatcher) -> Self {
        Self { matcher }
    }

    pub fn extract(
        &self,
        text: &str,
        channel: Channel,
        catalog: &CatalogSnapshot,
    ) -> Vec<OrderLine> {
        self.extract_detailed(text, channel, catalog).lines
    }

    pub fn extract_detailed(
        &self,
        text: &str,
        channel: Channel,
        catalog: &CatalogSnapshot,
    ) -> ExtractionReport {
        let normalized = text.trim().to_lowercase();
        if normalized.is_empty() || catalog.is_empty() {
            return ExtractionReport::default();
        }

        let mut aggregate = LineAggregate::default();
        let mut unresolved = Vec::new();

        for candidate in Grammar::for_channel(channel).candidates(&normalized) {
            match self.matcher.resolve(&candidate.phrase, catalog) {
                MatchResult::Matched { item, kind } => {
                    tracing::debug!(
                        phrase = %candidate.phrase,
                        item = %item.name,
                        quantity = candidate.quantity,
                        ?kind,
                        "resolved phrase"
                    );
                    aggregate.add(&item, candidate.quantity);
                }
                MatchResult::Unresolved => {
                    tracing::debug!(phrase = %candidate.phrase, "dropping unresolved phrase");
                    unresolved.push(candidate.phrase);
                }
            }
        }

        let instructions = instruction_clauses(&normalized);

        if !aggregate.is_empty() {
            return ExtractionReport {
                lines: aggregate.into_lines(),
                unresolved,
                used_fallback: false,
                instructions,
            };
        }

        let mut fallback = LineAggregate::default();
        for item in scan_for_names(&normalized, catalog) {
            fallback.add(item, 1);
        }

        ExtractionReport {
            used_fallback: !fallback.is_empty(),
            lines: fallback.into_lines(),
            unresolved,
            instructions,
        }
    }
}

/// Sums quantities per item, keeping first-appearance order.
#[derive(Default)]
struct LineAggregate {
    lines: Vec<OrderLine>,
    positions: HashMap<ItemId, usize>,
}

impl LineAggregate {
    fn add(&mut self, item: &CatalogItem, quantity: u32) {
        match self.positions.get(&item.id) {
            Some(&idx) => {
                let line = &mut self.lines[idx];
                line.quantity = line.quantity.saturating_add(quantity);
            }
            None => {
                self.positions.insert(item.id, self.lines.len());
                self.lines.push(OrderLine::from_item(item, quantity));
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn into_lines(self) -> Vec<OrderLine> {
        self.lines
    }
}

/// Finds catalog items whose full name occurs on word boundaries.
///
/// Longer names claim their words first, so "iced coffee" does not also
/// yield "coffee". Results are ordered by position in the text.
fn scan_for_names<'a>(text: &str, catalog: &'a CatalogSnapshot) -> Vec<&'a CatalogItem> {
    let haystack = format!(" {} ", words_only(text));

    let mut by_length: Vec<(&CatalogItem, String)> = catalog
        .items()
        .iter()
        .map(|item| (item, words_only(&item.name)))
        .filter(|(_, name)| !name.is_empty())
        .collect();
    // Stable sort keeps catalog order among equal lengths
    by_length.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut found: Vec<(usize, &CatalogItem)> = Vec::new();

    for (item, name) in by_length {
        let hit = [format!(" {name} "), format!(" {name}s "), format!(" {name}es ")]
            .iter()
            .find_map(|needle| haystack.find(needle.as_str()).map(|pos| (pos, pos + needle.len())));

        if let Some((start, end)) = hit {
            if claimed.iter().any(|&(s, e)| start < e - 1 && s < end - 1) {
                continue;
            }
            claimed.push((start, end));
            found.push((start, item));
        }
    }

    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, item)| item).collect()
}

fn instruction_clauses(text: &str) -> Vec<String> {
    INSTRUCTION_CLAUSE
        .captures_iter(text)
        .filter_map(|caps| {
            let what = caps.name("what")?.as_str().trim();
            match caps.name("kind")?.as_str() {
                "without" => Some(format!("no {what}")),
                _ => Some(what.to_string()),
            }
        })
        .collect()
}

fn words_only(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '\'' { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[path = "extractor_test.rs"]
mod tests;
