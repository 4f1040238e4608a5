//! Pattern-driven extraction of deal metrics from free-form text.
//!
//! Japanese and English listings, broker memos and pasted spreadsheets all
//! reach this crate as plain text. Each metric has an ordered list of label
//! patterns; the first one that yields a number wins.

pub mod attributes;
pub mod extractor;
pub mod normalize;
pub mod patterns;

pub use attributes::{extract_attributes, infer_category};
pub use extractor::{Extraction, FieldMatch, MetricsExtractor};
pub use normalize::{normalize_currency, parse_number, CurrencyScale};
pub use patterns::{CategoryKeywords, FieldPattern, FieldPatterns, PatternLibrary};
