//! Deal analysis pipeline.
//!
//! Runs extraction, imputation, the analyzers and the summary in order and
//! packages everything into one immutable [`AnalysisResult`].

use chrono::{DateTime, Utc};
use leverage_analysis::{
    analyze_irr, analyze_leverage, analyze_risk, analyze_valuation, IrrAnalysis,
    LeverageAnalysis, RiskAnalysis, ValuationAnalysis,
};
use metrics_extraction::{FieldMatch, MetricsExtractor};
use metrics_validation::{assess_quality, MetricsImputer, QualityAssessment};
use property_core::{
    AnalysisWarning, DomainStandards, EngineError, Imputation, MetricRecord, PropertyAttributes,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod config;
pub mod report;
pub mod summary;

#[cfg(test)]
mod tests;

pub use config::EngineConfig;
pub use report::{format_yen, render_markdown};
pub use summary::{build_summary, ProfessionalSummary, SummaryInputs};

pub const ENGINE_VERSION: &str = concat!("deal-engine/", env!("CARGO_PKG_VERSION"));

/// Everything the engine learned about one deal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Metrics as found in the text
    pub extracted: MetricRecord,
    /// Metrics after imputation
    pub validated: MetricRecord,
    pub attributes: PropertyAttributes,
    pub field_matches: Vec<FieldMatch>,
    pub imputations: Vec<Imputation>,
    pub leverage: LeverageAnalysis,
    pub irr: IrrAnalysis,
    pub risk: RiskAnalysis,
    pub valuation: ValuationAnalysis,
    pub summary: ProfessionalSummary,
    pub quality: QualityAssessment,
    pub warnings: Vec<AnalysisWarning>,
    pub created_at: DateTime<Utc>,
    pub engine_version: String,
}

/// Stateless pipeline over shared, read-only pattern and standards tables.
#[derive(Debug, Clone)]
pub struct DealAnalysisEngine {
    extractor: MetricsExtractor,
    imputer: MetricsImputer,
    standards: Arc<DomainStandards>,
}

impl DealAnalysisEngine {
    pub fn new(config: EngineConfig) -> Self {
        let standards = Arc::new(config.standards);
        Self {
            extractor: MetricsExtractor::new(config.currency_scale),
            imputer: MetricsImputer::new(Arc::clone(&standards)),
            standards,
        }
    }

    pub fn standards(&self) -> &DomainStandards {
        &self.standards
    }

    /// Analyze a deal description, stamped with the current time.
    pub fn analyze(&self, text: &str, auxiliary: Option<&str>) -> AnalysisResult {
        self.analyze_at(text, auxiliary, Utc::now())
    }

    /// Analyze raw bytes, rejecting anything that is not UTF-8.
    pub fn analyze_bytes(
        &self,
        text: &[u8],
        auxiliary: Option<&[u8]>,
    ) -> Result<AnalysisResult, EngineError> {
        let text = std::str::from_utf8(text)
            .map_err(|e| EngineError::InvalidInput(format!("primary text is not UTF-8: {}", e)))?;
        let auxiliary = auxiliary
            .map(std::str::from_utf8)
            .transpose()
            .map_err(|e| EngineError::InvalidInput(format!("auxiliary text is not UTF-8: {}", e)))?;
        Ok(self.analyze(text, auxiliary))
    }

    /// Same as [`analyze`](Self::analyze) with a caller-supplied timestamp.
    pub fn analyze_at(
        &self,
        text: &str,
        auxiliary: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> AnalysisResult {
        tracing::info!(
            "Starting deal analysis ({} chars, auxiliary: {})",
            text.chars().count(),
            auxiliary.map(|a| a.chars().count()).unwrap_or(0)
        );

        let extraction = self.extractor.extract(text, auxiliary);
        tracing::info!(
            "Extracted {} metrics",
            extraction.metrics.present_fields().len()
        );

        let outcome = self.imputer.impute(&extraction.metrics, &extraction.attributes);
        let validated = outcome.metrics;
        tracing::info!(
            "Validated record has {} metrics ({} imputed, {} warnings)",
            validated.present_fields().len(),
            outcome.imputations.len(),
            outcome.warnings.len()
        );

        let standards = self.standards.as_ref();
        let leverage = analyze_leverage(&validated, standards);
        let irr = analyze_irr(&validated, standards);
        let risk = analyze_risk(&validated, &extraction.attributes, &leverage, standards);
        let valuation = analyze_valuation(&validated, standards);
        let quality = assess_quality(&validated);

        let summary = build_summary(&SummaryInputs {
            metrics: &validated,
            attributes: &extraction.attributes,
            leverage: &leverage,
            irr: &irr,
            risk: &risk,
            valuation: &valuation,
            quality: &quality,
            standards,
        });

        let mut warnings = outcome.warnings;
        warnings.extend(leverage.warnings.iter().cloned());

        tracing::info!(
            "Analysis complete: investment grade {}, leverage {}, completeness {:.0}%",
            valuation.investment_grade.as_str(),
            leverage.strength.as_str(),
            quality.completeness
        );

        AnalysisResult {
            extracted: extraction.metrics,
            validated,
            attributes: extraction.attributes,
            field_matches: extraction.matches,
            imputations: outcome.imputations,
            leverage,
            irr,
            risk,
            valuation,
            summary,
            quality,
            warnings,
            created_at,
            engine_version: ENGINE_VERSION.to_string(),
        }
    }

    /// Markdown report for a result produced by this engine.
    pub fn render_markdown(&self, result: &AnalysisResult) -> String {
        render_markdown(result, &self.standards)
    }
}

impl Default for DealAnalysisEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
