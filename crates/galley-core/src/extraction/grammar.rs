//! Quantity-phrase grammars for spoken and texted utterances.

use super::pattern::{Candidate, QuantityPattern, RegexPattern};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use strum::{Display, EnumString};

/// Input channel, which selects the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Channel {
    Voice,
    Text,
}

const NUMBER_WORDS: &str = "one|two|three|four|five|six|seven|eight|nine|ten";

/// A word-bounded item phrase, as short as possible.
const ITEM: &str = r"[a-z][a-z'\-]*(?:\s+[a-z][a-z'\-]*)*?";

/// A time or party-size clause after an item: "at 7pm", "for 2 people",
/// "by 8:30". Consumed so its number is not read as another quantity.
const TRAILING_CLAUSE: &str = r"\s+(?:at|for|by|to|around|before|after)\b(?:\s+(?:about\s+)?\d{1,4}(?::\d{2})?\s*(?:[ap]\.?m\b\.?|[a-z]+)?)?";

/// A number after the item starts the next candidate; `next` marks where.
const NEXT_QUANTITY: &str = r"\s+(?P<next>\d)";

/// Where a spoken item phrase stops.
static SPOKEN_END: Lazy<String> = Lazy::new(|| {
    format!(
        r"(?:{TRAILING_CLAUSE}|\s+(?:and|with|without|plus|please|then|also)\b|\s*[,.;!?]|{NEXT_QUANTITY}|\s*$)"
    )
});

/// Where a texted item phrase stops, within one segment.
static TEXT_END: Lazy<String> = Lazy::new(|| {
    format!(
        r"(?:{TRAILING_CLAUSE}|\s+(?:with|without|please)\b|\s*[.!?]+|{NEXT_QUANTITY}|\s*$)"
    )
});

static SPOKEN: Lazy<Grammar> = Lazy::new(|| Grammar {
    separator: None,
    patterns: vec![
        Box::new(RegexPattern::new(
            "spoken_digits",
            &format!(r"\b(?P<qty>\d{{1,3}})\s+(?P<item>{ITEM}){}", *SPOKEN_END),
        )),
        Box::new(RegexPattern::new(
            "spoken_number_word",
            &format!(
                r"\b(?P<qty>{NUMBER_WORDS}|a couple of|couple of|a pair of|a dozen|dozen)\s+(?P<item>{ITEM}){}",
                *SPOKEN_END
            ),
        )),
        Box::new(RegexPattern::new(
            "spoken_article",
            &format!(r"\b(?P<qty>an|a|another)\s+(?P<item>{ITEM}){}", *SPOKEN_END),
        )),
    ],
});

static TEXT: Lazy<Grammar> = Lazy::new(|| Grammar {
    separator: Some(
        Regex::new(r"[,;\n]+|\s+and\s+|\s*&\s*|\s*\+\s*").expect("separator pattern is valid"),
    ),
    patterns: vec![
        // "2 burgers", "2x burger", "2 x burger"
        Box::new(RegexPattern::new(
            "text_leading_quantity",
            &format!(r"\b(?P<qty>\d{{1,3}})(?:\s*x\b\s*|\s+)(?P<item>[a-z][^\d]*?){}", *TEXT_END),
        )),
        // "burger x2", "burger x 2", "burger * 2"
        Box::new(RegexPattern::new(
            "text_trailing_multiplier",
            &format!(r"(?P<item>[a-z][a-z'\- ]*?)\s*(?:x|\*)\s*(?P<qty>\d{{1,3}}){}", *TEXT_END),
        )),
        // "two burgers", "a coke"
        Box::new(RegexPattern::new(
            "text_number_word",
            &format!(
                r"\b(?P<qty>{NUMBER_WORDS}|an|a)\s+(?P<item>[a-z][^\d]*?){}",
                *TEXT_END
            ),
        )),
    ],
});

/// An ordered pattern table plus an optional segment separator.
pub struct Grammar {
    separator: Option<Regex>,
    patterns: Vec<Box<dyn QuantityPattern>>,
}

impl Grammar {
    pub fn for_channel(channel: Channel) -> &'static Grammar {
        match channel {
            Channel::Voice => &SPOKEN,
            Channel::Text => &TEXT,
        }
    }

    pub fn pattern_names(&self) -> Vec<&'static str> {
        self.patterns.iter().map(|p| p.name()).collect()
    }

    /// Runs the pattern table over `text` in order.
    ///
    /// A candidate overlapping a span already claimed by an earlier pattern
    /// is skipped, so two rules never count the same words twice. Spans in
    /// the result are relative to `text`; results are sorted by position.
    pub fn candidates(&self, text: &str) -> Vec<Candidate> {
        let segments = self.segments(text);
        let mut claimed: Vec<Candidate> = Vec::new();

        for pattern in &self.patterns {
            let mut found = Vec::new();
            for segment in &segments {
                for mut candidate in pattern.candidates(&text[segment.clone()]) {
                    candidate.span =
                        (candidate.span.start + segment.start)..(candidate.span.end + segment.start);
                    if claimed.iter().any(|c| c.overlaps(&candidate.span)) {
                        tracing::trace!(
                            pattern = pattern.name(),
                            phrase = %candidate.phrase,
                            "skipping overlapping candidate"
                        );
                        continue;
                    }
                    found.push(candidate);
                }
            }
            claimed.extend(found);
        }

        claimed.sort_by_key(|c| c.span.start);
        claimed
    }

    fn segments(&self, text: &str) -> Vec<Range<usize>> {
        let Some(separator) = &self.separator else {
            return vec![0..text.len()];
        };

        let mut segments = Vec::new();
        let mut start = 0;
        for sep in separator.find_iter(text) {
            if sep.start() > start {
                segments.push(start..sep.start());
            }
            start = sep.end();
        }
        if start < text.len() {
            segments.push(start..text.len());
        }
        segments
    }
}
