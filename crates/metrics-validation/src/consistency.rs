//! Advisory cross-field checks on a validated record.

use property_core::{
    AnalysisWarning, DomainStandards, MetricRecord, PropertyAttributes, WarningCode,
};

const DCR_PLAUSIBLE_MIN: f64 = 0.5;
const DCR_PLAUSIBLE_MAX: f64 = 5.0;
const BER_PLAUSIBLE_MIN: f64 = 30.0;
const BER_PLAUSIBLE_MAX: f64 = 120.0;
const TOLERANCE: f64 = 1e-9;

/// Check leverage direction and plausible ranges. Values are never changed;
/// each finding is returned and also logged.
pub fn check_consistency(
    metrics: &MetricRecord,
    attributes: &PropertyAttributes,
    standards: &DomainStandards,
) -> Vec<AnalysisWarning> {
    let mut warnings = Vec::new();

    if let (Some(y), Some(k), Some(ccr)) = (
        metrics.yield_rate,
        metrics.loan_constant,
        metrics.cash_on_cash_return,
    ) {
        if y > k + TOLERANCE && ccr <= y {
            warnings.push(AnalysisWarning::new(
                WarningCode::LeverageInconsistency,
                format!(
                    "Yield {:.2}% exceeds K {:.2}% but CCR {:.2}% does not exceed the yield",
                    y, k, ccr
                ),
            ));
        } else if y + TOLERANCE < k && ccr >= y {
            warnings.push(AnalysisWarning::new(
                WarningCode::LeverageInconsistency,
                format!(
                    "Yield {:.2}% is below K {:.2}% but CCR {:.2}% is not below the yield",
                    y, k, ccr
                ),
            ));
        }
    }

    if let Some(dcr) = metrics.debt_coverage_ratio {
        if !(DCR_PLAUSIBLE_MIN..=DCR_PLAUSIBLE_MAX).contains(&dcr) {
            warnings.push(AnalysisWarning::new(
                WarningCode::DebtCoverageOutOfRange,
                format!(
                    "DCR {:.2} is outside the plausible range {:.1}-{:.1}",
                    dcr, DCR_PLAUSIBLE_MIN, DCR_PLAUSIBLE_MAX
                ),
            ));
        }
    }

    if let Some(ber) = metrics.break_even_ratio {
        if !(BER_PLAUSIBLE_MIN..=BER_PLAUSIBLE_MAX).contains(&ber) {
            warnings.push(AnalysisWarning::new(
                WarningCode::BreakEvenOutOfRange,
                format!(
                    "BER {:.1}% is outside the plausible range {:.0}-{:.0}%",
                    ber, BER_PLAUSIBLE_MIN, BER_PLAUSIBLE_MAX
                ),
            ));
        }
    }

    if let Some(ltv) = metrics.loan_to_value {
        if ltv <= 0.0 || ltv > 100.0 {
            warnings.push(AnalysisWarning::new(
                WarningCode::LoanToValueOutOfRange,
                format!("LTV {:.1}% is outside (0, 100]", ltv),
            ));
        }
    }

    if let (Some(ratio), Some(category)) = (metrics.operating_expense_ratio, attributes.category) {
        let band = standards.category(category).expense_ratio;
        if ratio < band.min || ratio > band.max {
            warnings.push(AnalysisWarning::new(
                WarningCode::ExpenseRatioOutOfBand,
                format!(
                    "Expense ratio {:.1}% is outside the {} band {:.0}-{:.0}%",
                    ratio,
                    category.to_label(),
                    band.min,
                    band.max
                ),
            ));
        }
    }

    for warning in &warnings {
        tracing::warn!("{:?}: {}", warning.code, warning.message);
    }

    warnings
}
