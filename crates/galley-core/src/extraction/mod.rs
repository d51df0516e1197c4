//! Order extraction from free-form utterances.
//!
//! - `pattern`: single quantity-phrase rules (`QuantityPattern`)
//! - `grammar`: ordered pattern tables per channel (`Grammar`, `Channel`)
//! - `extractor`: matching, aggregation and fallback (`OrderExtractor`)

mod extractor;
mod grammar;
mod pattern;

pub use extractor::{ExtractionReport, OrderExtractor};
pub use grammar::{Channel, Grammar};
pub use pattern::{Candidate, QuantityPattern, RegexPattern, parse_quantity};
