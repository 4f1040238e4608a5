use property_core::standards::{BerBands, DcrBands, LeverageThresholds};
use property_core::{AnalysisWarning, DomainStandards, Grade, MetricRecord, RiskLevel, WarningCode};
use serde::{Deserialize, Serialize};

const STABILITY_BASE: f64 = 50.0;

/// How much the financing adds to (or takes from) equity returns,
/// bucketed by yield gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeverageStrength {
    Excellent,
    Good,
    Moderate,
    Weak,
    Negative,
    Unknown,
}

impl LeverageStrength {
    /// Bucket a yield gap (percentage points). Lower bounds are inclusive.
    pub fn from_gap(gap: Option<f64>, thresholds: &LeverageThresholds) -> Self {
        match gap {
            None => LeverageStrength::Unknown,
            Some(g) if g >= thresholds.excellent => LeverageStrength::Excellent,
            Some(g) if g >= thresholds.good => LeverageStrength::Good,
            Some(g) if g >= thresholds.moderate => LeverageStrength::Moderate,
            Some(g) if g >= thresholds.weak => LeverageStrength::Weak,
            Some(_) => LeverageStrength::Negative,
        }
    }

    pub fn grade(&self) -> Option<Grade> {
        match self {
            LeverageStrength::Excellent => Some(Grade::A),
            LeverageStrength::Good => Some(Grade::B),
            LeverageStrength::Moderate => Some(Grade::C),
            LeverageStrength::Weak => Some(Grade::D),
            LeverageStrength::Negative => Some(Grade::F),
            LeverageStrength::Unknown => None,
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        match self {
            LeverageStrength::Excellent | LeverageStrength::Good => RiskLevel::Low,
            LeverageStrength::Moderate | LeverageStrength::Weak => RiskLevel::Medium,
            LeverageStrength::Negative => RiskLevel::High,
            LeverageStrength::Unknown => RiskLevel::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeverageStrength::Excellent => "Excellent",
            LeverageStrength::Good => "Good",
            LeverageStrength::Moderate => "Moderate",
            LeverageStrength::Weak => "Weak",
            LeverageStrength::Negative => "Negative",
            LeverageStrength::Unknown => "Unknown",
        }
    }

    fn recommendation(&self) -> &'static str {
        match self {
            LeverageStrength::Excellent => {
                "Strong positive leverage: financing amplifies equity returns. The current structure can carry additional debt within lender limits."
            }
            LeverageStrength::Good => {
                "Positive leverage with a comfortable margin. The current financing structure is appropriate."
            }
            LeverageStrength::Moderate => {
                "Modest positive leverage. Returns are sensitive to rate moves; favor fixed-rate financing."
            }
            LeverageStrength::Weak => {
                "Leverage barely adds return. Negotiate a lower loan constant or reduce the loan amount."
            }
            LeverageStrength::Negative => {
                "Negative leverage: borrowing reduces equity returns. Reduce debt or renegotiate terms before proceeding."
            }
            LeverageStrength::Unknown => {
                "Leverage cannot be assessed without both the yield rate and the loan constant."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeverageType {
    Positive,
    Neutral,
    Negative,
    Unknown,
}

impl LeverageType {
    pub fn from_gap(gap: Option<f64>) -> Self {
        match gap {
            Some(g) if g > 0.0 => LeverageType::Positive,
            Some(g) if g < 0.0 => LeverageType::Negative,
            Some(_) => LeverageType::Neutral,
            None => LeverageType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeverageType::Positive => "Positive",
            LeverageType::Neutral => "Neutral",
            LeverageType::Negative => "Negative",
            LeverageType::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeverageAnalysis {
    /// Yield rate minus loan constant, percentage points
    pub yield_gap: Option<f64>,
    pub strength: LeverageStrength,
    pub grade: Option<Grade>,
    pub risk_level: RiskLevel,
    pub leverage_type: LeverageType,
    /// CCR minus yield rate, percentage points
    pub leverage_effect: Option<f64>,
    /// 0-100
    pub stability_score: f64,
    pub recommendation: String,
    pub warnings: Vec<AnalysisWarning>,
}

fn dcr_points(dcr: Option<f64>, bands: &DcrBands) -> f64 {
    match dcr {
        None => 0.0,
        Some(d) if d >= bands.excellent => 30.0,
        Some(d) if d >= bands.good => 20.0,
        Some(d) if d >= bands.acceptable => 10.0,
        Some(d) if d >= bands.minimum => 0.0,
        Some(_) => -20.0,
    }
}

fn ber_points(ber: Option<f64>, bands: &BerBands) -> f64 {
    match ber {
        None => 0.0,
        Some(b) if b <= bands.excellent => 20.0,
        Some(b) if b <= bands.good => 15.0,
        Some(b) if b <= bands.acceptable => 10.0,
        Some(b) if b <= bands.marginal => 5.0,
        Some(_) => -10.0,
    }
}

fn gap_points(gap: Option<f64>, bands: &LeverageThresholds) -> f64 {
    match gap {
        None => 0.0,
        Some(g) if g >= bands.excellent => 20.0,
        Some(g) if g >= bands.good => 15.0,
        Some(g) if g >= bands.moderate => 10.0,
        Some(g) if g >= bands.weak => 5.0,
        Some(_) => -15.0,
    }
}

/// Composite 0-100 score of how well the deal tolerates income shocks.
pub fn stability_score(metrics: &MetricRecord, standards: &DomainStandards) -> f64 {
    let score = STABILITY_BASE
        + dcr_points(metrics.debt_coverage_ratio, &standards.dcr)
        + ber_points(metrics.break_even_ratio, &standards.ber)
        + gap_points(metrics.yield_gap(), &standards.stability_gap);
    score.clamp(0.0, 100.0)
}

pub fn analyze_leverage(metrics: &MetricRecord, standards: &DomainStandards) -> LeverageAnalysis {
    let yield_gap = metrics.yield_gap();
    let strength = LeverageStrength::from_gap(yield_gap, &standards.leverage);
    let leverage_type = LeverageType::from_gap(yield_gap);

    let leverage_effect = match (metrics.cash_on_cash_return, metrics.yield_rate) {
        (Some(ccr), Some(y)) => Some(ccr - y),
        _ => None,
    };

    let mut warnings = Vec::new();
    if let (Some(gap), Some(effect)) = (yield_gap, leverage_effect) {
        if gap != 0.0 && effect != 0.0 && gap.signum() != effect.signum() {
            warnings.push(AnalysisWarning::new(
                WarningCode::LeverageEffectMismatch,
                format!(
                    "Yield gap {:+.2}pt implies {} leverage but CCR differs from yield by {:+.2}pt",
                    gap,
                    leverage_type.as_str().to_lowercase(),
                    effect
                ),
            ));
        }
    }

    let mut recommendation = vec![strength.recommendation().to_string()];
    if let Some(dcr) = metrics.debt_coverage_ratio {
        if dcr < standards.dcr.minimum {
            recommendation.push(format!(
                "DCR {:.2} is below the lender minimum of {:.2}; debt service coverage is at risk.",
                dcr, standards.dcr.minimum
            ));
        }
    }
    if let Some(ber) = metrics.break_even_ratio {
        if ber > standards.ber.marginal {
            recommendation.push(format!(
                "BER {:.1}% exceeds {:.0}%, leaving little room for vacancy or expense increases.",
                ber, standards.ber.marginal
            ));
        }
    }

    let analysis = LeverageAnalysis {
        yield_gap,
        strength,
        grade: strength.grade(),
        risk_level: strength.risk_level(),
        leverage_type,
        leverage_effect,
        stability_score: stability_score(metrics, standards),
        recommendation: recommendation.join(" "),
        warnings,
    };

    tracing::debug!(
        "Leverage: gap={:?} strength={} stability={:.0}",
        analysis.yield_gap,
        analysis.strength.as_str(),
        analysis.stability_score
    );

    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use property_core::MetricField;

    fn record(y: f64, k: f64) -> MetricRecord {
        MetricRecord::new()
            .with(MetricField::YieldRate, y)
            .with(MetricField::LoanConstant, k)
    }

    #[test]
    fn test_fcr_and_k_positive_grade_a() {
        let analysis = analyze_leverage(&record(8.5, 6.2), &DomainStandards::default());
        assert_relative_eq!(analysis.yield_gap.unwrap(), 2.3, epsilon = 1e-9);
        assert_eq!(analysis.leverage_type, LeverageType::Positive);
        assert_eq!(analysis.strength, LeverageStrength::Excellent);
        assert_eq!(analysis.grade, Some(Grade::A));
        assert_eq!(analysis.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_gap_boundaries_inclusive() {
        let thresholds = DomainStandards::default().leverage;
        assert_eq!(LeverageStrength::from_gap(Some(1.5), &thresholds), LeverageStrength::Excellent);
        assert_eq!(LeverageStrength::from_gap(Some(1.49999), &thresholds), LeverageStrength::Good);
        assert_eq!(LeverageStrength::from_gap(Some(1.0), &thresholds), LeverageStrength::Good);
        assert_eq!(LeverageStrength::from_gap(Some(0.5), &thresholds), LeverageStrength::Moderate);
        assert_eq!(LeverageStrength::from_gap(Some(0.0), &thresholds), LeverageStrength::Weak);
        assert_eq!(
            LeverageStrength::from_gap(Some(-0.01), &thresholds),
            LeverageStrength::Negative
        );
        assert_eq!(LeverageStrength::from_gap(None, &thresholds), LeverageStrength::Unknown);
    }

    #[test]
    fn test_grade_and_risk_mapping() {
        assert_eq!(LeverageStrength::Moderate.grade(), Some(Grade::C));
        assert_eq!(LeverageStrength::Weak.risk_level(), RiskLevel::Medium);
        assert_eq!(LeverageStrength::Negative.grade(), Some(Grade::F));
        assert_eq!(LeverageStrength::Negative.risk_level(), RiskLevel::High);
        assert_eq!(LeverageStrength::Unknown.grade(), None);
    }

    #[test]
    fn test_missing_inputs_unknown() {
        let metrics = MetricRecord::new().with(MetricField::YieldRate, 7.0);
        let analysis = analyze_leverage(&metrics, &DomainStandards::default());
        assert_eq!(analysis.yield_gap, None);
        assert_eq!(analysis.strength, LeverageStrength::Unknown);
        assert_eq!(analysis.leverage_type, LeverageType::Unknown);
        assert_eq!(analysis.risk_level, RiskLevel::Unknown);
        assert_eq!(analysis.stability_score, 50.0);
    }

    #[test]
    fn test_neutral_leverage() {
        let analysis = analyze_leverage(&record(6.0, 6.0), &DomainStandards::default());
        assert_eq!(analysis.leverage_type, LeverageType::Neutral);
        assert_eq!(analysis.strength, LeverageStrength::Weak);
    }

    #[test]
    fn test_stability_dcr_below_minimum() {
        let metrics = MetricRecord::new().with(MetricField::DebtCoverageRatio, 0.9);
        let standards = DomainStandards::default();
        assert_eq!(stability_score(&metrics, &standards), 30.0);
        let analysis = analyze_leverage(&metrics, &standards);
        assert!(analysis.recommendation.contains("DCR 0.90"));
    }

    #[test]
    fn test_stability_best_case_clamped() {
        let metrics = record(9.0, 6.0)
            .with(MetricField::DebtCoverageRatio, 1.8)
            .with(MetricField::BreakEvenRatio, 55.0);
        // 50 + 30 + 20 + 20 = 120
        assert_eq!(stability_score(&metrics, &DomainStandards::default()), 100.0);
    }

    #[test]
    fn test_stability_worst_case() {
        let metrics = record(5.0, 6.0)
            .with(MetricField::DebtCoverageRatio, 0.8)
            .with(MetricField::BreakEvenRatio, 95.0);
        // 50 - 20 - 10 - 15 = 5
        assert_eq!(stability_score(&metrics, &DomainStandards::default()), 5.0);
    }

    #[test]
    fn test_effect_mismatch_warns() {
        let metrics = record(8.0, 6.0).with(MetricField::CashOnCashReturn, 7.0);
        let analysis = analyze_leverage(&metrics, &DomainStandards::default());
        assert_relative_eq!(analysis.leverage_effect.unwrap(), -1.0, epsilon = 1e-9);
        assert_eq!(analysis.warnings.len(), 1);
        assert_eq!(analysis.warnings[0].code, WarningCode::LeverageEffectMismatch);
    }

    #[test]
    fn test_high_ber_in_recommendation() {
        let metrics = record(8.0, 6.0).with(MetricField::BreakEvenRatio, 92.0);
        let analysis = analyze_leverage(&metrics, &DomainStandards::default());
        assert!(analysis.recommendation.starts_with("Strong positive leverage"));
        assert!(analysis.recommendation.contains("BER 92.0%"));
    }
}
