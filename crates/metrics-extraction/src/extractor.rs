use crate::attributes::extract_attributes;
use crate::normalize::{normalize_currency, parse_number, CurrencyScale};
use crate::patterns::{FieldPatterns, PatternLibrary};
use property_core::{MetricField, MetricRecord, MetricUnit, PropertyAttributes};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Record of which label produced a metric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMatch {
    pub field: MetricField,
    pub label: String,
    pub raw: String,
    pub value: f64,
}

/// Output of a single extraction pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extraction {
    pub metrics: MetricRecord,
    pub attributes: PropertyAttributes,
    pub matches: Vec<FieldMatch>,
}

/// Scans text against a [`PatternLibrary`], one pass per field.
#[derive(Debug, Clone)]
pub struct MetricsExtractor {
    library: Arc<PatternLibrary>,
    currency_scale: CurrencyScale,
}

impl MetricsExtractor {
    pub fn new(currency_scale: CurrencyScale) -> Self {
        Self::with_library(PatternLibrary::standard(), currency_scale)
    }

    pub fn with_library(library: Arc<PatternLibrary>, currency_scale: CurrencyScale) -> Self {
        Self {
            library,
            currency_scale,
        }
    }

    pub fn currency_scale(&self) -> CurrencyScale {
        self.currency_scale
    }

    /// Extract metrics and property attributes from the primary text and an
    /// optional auxiliary (file-derived) text. Both are read the same way; for
    /// any one pattern the primary text is searched first.
    pub fn extract(&self, text: &str, auxiliary: Option<&str>) -> Extraction {
        let sources: Vec<&str> = std::iter::once(text)
            .chain(auxiliary.filter(|a| !a.trim().is_empty()))
            .collect();

        let mut metrics = MetricRecord::new();
        let mut matches = Vec::new();

        for patterns in self.library.fields() {
            if let Some(found) = self.match_field(patterns, &sources) {
                tracing::debug!(
                    "Extracted {} = {} via '{}' ({:?})",
                    found.field.as_str(),
                    found.value,
                    found.label,
                    found.raw
                );
                metrics.insert_if_absent(found.field, found.value);
                matches.push(found);
            }
        }

        let attributes = extract_attributes(&sources, &self.library);

        tracing::debug!(
            "Extraction matched {} of {} metric fields",
            matches.len(),
            MetricField::ALL.len()
        );

        Extraction {
            metrics,
            attributes,
            matches,
        }
    }

    /// Try each pattern in priority order; the first capture that converts to a
    /// finite number wins and the remaining patterns are never tried.
    fn match_field(&self, patterns: &FieldPatterns, sources: &[&str]) -> Option<FieldMatch> {
        patterns.patterns().iter().find_map(|pattern| {
            sources.iter().find_map(|source| {
                pattern.regex().captures_iter(source).find_map(|caps| {
                    let raw = caps.name("value")?.as_str();
                    let unit = caps.name("unit").map(|m| m.as_str());
                    let value = self.convert(patterns.field, raw, unit)?;
                    Some(FieldMatch {
                        field: patterns.field,
                        label: pattern.label.clone(),
                        raw: caps.get(0).map(|m| m.as_str().trim().to_string()).unwrap_or_default(),
                        value,
                    })
                })
            })
        })
    }

    fn convert(&self, field: MetricField, raw: &str, unit: Option<&str>) -> Option<f64> {
        match field.unit() {
            MetricUnit::Currency => normalize_currency(raw, unit, self.currency_scale),
            MetricUnit::Percent | MetricUnit::Ratio | MetricUnit::Years => parse_number(raw),
        }
    }
}

impl Default for MetricsExtractor {
    fn default() -> Self {
        Self::new(CurrencyScale::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use property_core::PropertyCategory;

    #[test]
    fn test_fcr_and_k_only() {
        let extraction = MetricsExtractor::default().extract("FCR: 8.5%\nK%: 6.2%", None);
        assert_eq!(extraction.metrics.yield_rate, Some(8.5));
        assert_eq!(extraction.metrics.loan_constant, Some(6.2));
        assert_eq!(extraction.metrics.present_fields().len(), 2);
    }

    #[test]
    fn test_missing_fields_stay_absent() {
        let extraction = MetricsExtractor::default().extract("nothing numeric here", None);
        assert!(extraction.metrics.is_empty());
        assert!(extraction.matches.is_empty());
    }

    #[test]
    fn test_currency_fields_normalized() {
        let text = "物件価格: 50,000\nNOI: 3,000,000円\n借入金額: 3,500万円";
        let metrics = MetricsExtractor::default().extract(text, None).metrics;
        assert_relative_eq!(metrics.price.unwrap(), 50_000_000.0);
        assert_relative_eq!(metrics.net_operating_income.unwrap(), 3_000_000.0);
        assert_relative_eq!(metrics.loan_amount.unwrap(), 35_000_000.0);
    }

    #[test]
    fn test_literal_scale_keeps_small_figures() {
        let metrics = MetricsExtractor::new(CurrencyScale::Literal)
            .extract("Management fee: 500", None)
            .metrics;
        assert_eq!(metrics.management_fee, Some(500.0));
    }

    #[test]
    fn test_first_pattern_wins() {
        // FCR is tried before 総収益率 regardless of position in the text
        let text = "総収益率: 7.0%\nFCR: 8.5%";
        let extraction = MetricsExtractor::default().extract(text, None);
        assert_eq!(extraction.metrics.yield_rate, Some(8.5));
        let m = extraction
            .matches
            .iter()
            .find(|m| m.field == MetricField::YieldRate)
            .unwrap();
        assert_eq!(m.label, "FCR");
    }

    #[test]
    fn test_malformed_capture_falls_through() {
        // the first capture overflows f64 and is treated as no match
        let text = format!("FCR: {}%\nFCR: 7.5%", "9".repeat(400));
        let metrics = MetricsExtractor::default().extract(&text, None).metrics;
        assert_eq!(metrics.yield_rate, Some(7.5));
    }

    #[test]
    fn test_auxiliary_text_fills_gaps() {
        let extraction = MetricsExtractor::default().extract(
            "FCR: 8.5%",
            Some("K%: 6.2%\nDCR: 1.4\n用途: 賃貸マンション"),
        );
        assert_eq!(extraction.metrics.yield_rate, Some(8.5));
        assert_eq!(extraction.metrics.loan_constant, Some(6.2));
        assert_eq!(extraction.metrics.debt_coverage_ratio, Some(1.4));
        assert_eq!(
            extraction.attributes.category,
            Some(PropertyCategory::ResidentialMultifamily)
        );
    }

    #[test]
    fn test_primary_text_preferred_for_same_pattern() {
        let extraction = MetricsExtractor::default().extract("DCR: 1.3", Some("DCR: 1.9"));
        assert_eq!(extraction.metrics.debt_coverage_ratio, Some(1.3));
    }

    #[test]
    fn test_english_listing() {
        let text = "\
Purchase price: $2,400,000
Net operating income: $168,000
Loan amount: 1.8 million
Interest rate: 4.25%
Amortization: 25 years
Holding period: 10 years
Exit cap rate: 7.25%";
        let metrics = MetricsExtractor::new(CurrencyScale::Literal).extract(text, None).metrics;
        assert_relative_eq!(metrics.price.unwrap(), 2_400_000.0);
        assert_relative_eq!(metrics.net_operating_income.unwrap(), 168_000.0);
        assert_relative_eq!(metrics.loan_amount.unwrap(), 1_800_000.0);
        assert_eq!(metrics.interest_rate, Some(4.25));
        assert_eq!(metrics.amortization_period, Some(25.0));
        assert_eq!(metrics.holding_period, Some(10.0));
        assert_eq!(metrics.exit_cap_rate, Some(7.25));
    }

    #[test]
    fn test_all_values_finite() {
        let text = format!("FCR: {}%\nPrice: {}", "9".repeat(400), "9".repeat(400));
        let metrics = MetricsExtractor::default().extract(&text, None).metrics;
        for field in MetricField::ALL {
            if let Some(v) = metrics.get(*field) {
                assert!(v.is_finite());
            }
        }
        assert_eq!(metrics.yield_rate, None);
        assert_eq!(metrics.price, None);
    }
}
