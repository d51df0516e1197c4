//! Quantity-phrase patterns.
//!
//! Each pattern turns a piece of normalized text into `(quantity, phrase)`
//! candidates with byte spans. Patterns know nothing about the catalog.

use regex::Regex;
use std::ops::Range;

/// A quantity and the item phrase it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub quantity: u32,
    pub phrase: String,
    /// Byte range of the whole match within the searched text.
    pub span: Range<usize>,
}

impl Candidate {
    pub fn overlaps(&self, other: &Range<usize>) -> bool {
        self.span.start < other.end && other.start < self.span.end
    }
}

/// One rule of a grammar's pattern table.
pub trait QuantityPattern: Send + Sync {
    fn name(&self) -> &'static str;

    /// Finds every non-overlapping candidate in `text`.
    fn candidates(&self, text: &str) -> Vec<Candidate>;
}

/// Regex-backed pattern with named `qty` and `item` groups.
pub struct RegexPattern {
    name: &'static str,
    regex: Regex,
}

impl RegexPattern {
    /// Panics if `pattern` is invalid or lacks the `qty`/`item` groups; the
    /// pattern tables are static.
    pub fn new(name: &'static str, pattern: &str) -> Self {
        let regex = Regex::new(pattern).unwrap_or_else(|e| panic!("pattern '{name}': {e}"));
        let groups: Vec<_> = regex.capture_names().flatten().collect();
        assert!(
            groups.contains(&"qty") && groups.contains(&"item"),
            "pattern '{name}' needs qty and item groups"
        );
        Self { name, regex }
    }
}

impl QuantityPattern for RegexPattern {
    fn name(&self) -> &'static str {
        self.name
    }

    fn candidates(&self, text: &str) -> Vec<Candidate> {
        let mut found = Vec::new();
        let mut pos = 0;

        while let Some(caps) = self.regex.captures_at(text, pos) {
            let Some(whole) = caps.get(0) else {
                break;
            };
            // A captured `next` belongs to the following candidate
            let end = caps.name("next").map_or(whole.end(), |m| m.start());
            if end <= pos {
                break;
            }

            let quantity = caps.name("qty").and_then(|m| parse_quantity(m.as_str()));
            let phrase = caps.name("item").map(|m| m.as_str().trim()).unwrap_or_default();
            if let Some(quantity) = quantity.filter(|_| !phrase.is_empty()) {
                found.push(Candidate {
                    quantity,
                    phrase: phrase.to_string(),
                    span: whole.start()..end,
                });
            }
            pos = end;
        }
        found
    }
}

/// Parses digits, "one".."ten", articles and a few spoken multiples.
///
/// Zero and unparseable quantities yield `None`.
pub fn parse_quantity(token: &str) -> Option<u32> {
    let token = token.trim();
    let quantity = match token {
        "a" | "an" | "another" | "one" => 1,
        "two" | "a couple of" | "couple of" | "a pair of" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "a dozen" | "dozen" => 12,
        digits => digits.parse::<u32>().ok()?,
    };
    (quantity > 0).then_some(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("a"), Some(1));
        assert_eq!(parse_quantity("seven"), Some(7));
        assert_eq!(parse_quantity("a couple of"), Some(2));
        assert_eq!(parse_quantity("12"), Some(12));
        assert_eq!(parse_quantity("0"), None);
        assert_eq!(parse_quantity("eleventy"), None);
    }

    #[test]
    fn test_regex_pattern_candidates_have_spans() {
        let pattern = RegexPattern::new("simple", r"(?P<qty>\d+) (?P<item>[a-z]+)");
        let found = pattern.candidates("2 eggs and 3 toasts");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].phrase, "eggs");
        assert_eq!(found[0].span, 0..6);
        assert_eq!(found[1].quantity, 3);
    }

    #[test]
    fn test_next_group_is_left_for_the_following_candidate() {
        let pattern = RegexPattern::new(
            "chained",
            r"(?P<qty>\d+) (?P<item>[a-z]+)(?:\s+(?P<next>\d)|$)",
        );
        let found = pattern.candidates("2 eggs 3 toasts");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].span, 0..7);
        assert_eq!((found[1].quantity, found[1].phrase.as_str()), (3, "toasts"));
    }

    #[test]
    fn test_zero_quantity_is_dropped() {
        let pattern = RegexPattern::new("simple", r"(?P<qty>\d+) (?P<item>[a-z]+)");
        assert!(pattern.candidates("0 eggs").is_empty());
    }

    #[test]
    fn test_overlap() {
        let c = Candidate {
            quantity: 1,
            phrase: "x".into(),
            span: 5..10,
        };
        assert!(c.overlaps(&(9..12)));
        assert!(!c.overlaps(&(10..12)));
        assert!(!c.overlaps(&(0..5)));
    }
}
