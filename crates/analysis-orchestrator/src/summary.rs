use leverage_analysis::{
    IrrAnalysis, IrrBenchmarkStatus, LeverageAnalysis, LeverageStrength, RiskAnalysis,
    ValuationAnalysis,
};
use metrics_validation::{ConfidenceLevel, QualityAssessment};
use property_core::{DomainStandards, Grade, MetricRecord, PropertyAttributes, RiskLevel};
use serde::{Deserialize, Serialize};

/// Final graded verdict, assembled from the analyzers' outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfessionalSummary {
    pub headline: String,
    pub leverage_grade: Option<Grade>,
    pub investment_grade: Grade,
    pub overall_risk: RiskLevel,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub recommendation: String,
}

/// Everything the summary reads. Borrowed; nothing here is modified.
pub struct SummaryInputs<'a> {
    pub metrics: &'a MetricRecord,
    pub attributes: &'a PropertyAttributes,
    pub leverage: &'a LeverageAnalysis,
    pub irr: &'a IrrAnalysis,
    pub risk: &'a RiskAnalysis,
    pub valuation: &'a ValuationAnalysis,
    pub quality: &'a QualityAssessment,
    pub standards: &'a DomainStandards,
}

fn strengths(inputs: &SummaryInputs) -> Vec<String> {
    let m = inputs.metrics;
    let s = inputs.standards;
    let mut out = Vec::new();

    if let (LeverageStrength::Excellent | LeverageStrength::Good, Some(gap)) =
        (inputs.leverage.strength, inputs.leverage.yield_gap)
    {
        out.push(format!("Positive leverage with a yield gap of {:+.2}pt", gap));
    }
    if let Some(dcr) = m.debt_coverage_ratio.filter(|d| *d >= s.dcr.good) {
        out.push(format!("Debt coverage of {:.2}x is comfortably above lender requirements", dcr));
    }
    if let Some(ber) = m.break_even_ratio.filter(|b| *b <= s.ber.good) {
        out.push(format!("Break-even occupancy of {:.1}% leaves a wide vacancy cushion", ber));
    }
    if inputs.valuation.value_creation {
        out.push(
            "Projected cash flows create value at the discount rate (positive NPV)".to_string(),
        );
    }
    if let (IrrBenchmarkStatus::Above | IrrBenchmarkStatus::Within, Some(irr), Some(profile)) = (
        inputs.irr.status,
        inputs.irr.levered_irr,
        inputs.irr.risk_profile,
    ) {
        out.push(format!(
            "Levered IRR of {:.1}% meets the {} target",
            irr,
            profile.to_label()
        ));
    }
    out
}

fn concerns(inputs: &SummaryInputs) -> Vec<String> {
    let m = inputs.metrics;
    let s = inputs.standards;
    let mut out = Vec::new();

    // negative leverage and sub-minimum DCR arrive through the risk factors
    match inputs.leverage.strength {
        LeverageStrength::Weak => {
            out.push("Leverage adds little return over an all-cash purchase".to_string())
        }
        LeverageStrength::Unknown => out.push(
            "Leverage could not be assessed (yield rate or loan constant missing)".to_string(),
        ),
        _ => {}
    }
    if let Some(ber) = m.break_even_ratio.filter(|b| *b > s.ber.acceptable) {
        out.push(format!("Break-even occupancy of {:.1}% leaves little margin for vacancy", ber));
    }
    if inputs.valuation.net_present_value.is_some_and(|npv| npv < 0.0) {
        out.push("Negative NPV at the stated discount rate".to_string());
    }
    if inputs.irr.status == IrrBenchmarkStatus::Below {
        out.push(format!("Levered IRR is below target. {}", inputs.irr.commentary));
    }
    out.extend(inputs.risk.risk_factors.iter().cloned());
    if inputs.quality.confidence == ConfidenceLevel::Low {
        out.push(format!(
            "Limited data: only {:.0}% of key metrics available",
            inputs.quality.completeness
        ));
    }
    out
}

fn headline(inputs: &SummaryInputs) -> String {
    let name = inputs
        .attributes
        .name
        .as_deref()
        .unwrap_or("Subject property");
    let category = inputs
        .attributes
        .category
        .map(|c| format!(" ({})", c.to_label()))
        .unwrap_or_default();
    format!(
        "{}{}: grade {} investment, {} leverage, {} overall risk - {}",
        name,
        category,
        inputs.valuation.investment_grade.as_str(),
        inputs.leverage.leverage_type.as_str().to_lowercase(),
        inputs.risk.overall_risk.as_str().to_lowercase(),
        inputs.valuation.recommendation.to_label().to_lowercase()
    )
}

pub fn build_summary(inputs: &SummaryInputs) -> ProfessionalSummary {
    let recommendation = format!(
        "{}. {}",
        inputs.valuation.recommendation.to_label(),
        inputs.leverage.recommendation
    );

    ProfessionalSummary {
        headline: headline(inputs),
        leverage_grade: inputs.leverage.grade,
        investment_grade: inputs.valuation.investment_grade,
        overall_risk: inputs.risk.overall_risk,
        strengths: strengths(inputs),
        concerns: concerns(inputs),
        recommendation,
    }
}
