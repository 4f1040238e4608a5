use property_core::{DomainStandards, Grade, MetricRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvestmentRecommendation {
    Recommended,
    NotRecommended,
}

impl InvestmentRecommendation {
    pub fn from_grade(grade: Grade) -> Self {
        match grade {
            Grade::A | Grade::B => InvestmentRecommendation::Recommended,
            Grade::C | Grade::D | Grade::F => InvestmentRecommendation::NotRecommended,
        }
    }

    pub fn to_label(&self) -> &'static str {
        match self {
            InvestmentRecommendation::Recommended => "Recommended",
            InvestmentRecommendation::NotRecommended => "Not recommended",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationAnalysis {
    pub investment_grade: Grade,
    pub net_present_value: Option<f64>,
    pub value_creation: bool,
    pub recommendation: InvestmentRecommendation,
    /// Yield rate minus market cap rate, percentage points
    pub cap_rate_spread: Option<f64>,
    pub rationale: String,
}

/// One row of the grading table. Unknown inputs fail a row that needs them.
struct GradeRule {
    grade: Grade,
    applies: fn(Option<f64>, Option<f64>, Option<f64>, &DomainStandards) -> bool,
    rationale: &'static str,
}

fn at_least(value: Option<f64>, floor: f64) -> bool {
    value.is_some_and(|v| v >= floor)
}

fn at_most(value: Option<f64>, ceiling: f64) -> bool {
    value.is_some_and(|v| v <= ceiling)
}

fn positive(value: Option<f64>) -> bool {
    value.is_some_and(|v| v > 0.0)
}

fn not_negative(value: Option<f64>) -> bool {
    value.map_or(true, |v| v >= 0.0)
}

/// Recommended grades also have to clear the lender minimum DCR band.
fn recommended_dcr(dcr: Option<f64>, floor: f64, s: &DomainStandards) -> bool {
    at_least(dcr, floor.max(s.dcr.minimum))
}

/// Evaluated top to bottom on (NPV, DCR, BER); the first matching row wins.
const GRADE_TABLE: &[GradeRule] = &[
    GradeRule {
        grade: Grade::A,
        applies: |npv, dcr, ber, s| {
            positive(npv)
                && recommended_dcr(dcr, s.valuation.grade_a_min_dcr, s)
                && at_most(ber, s.valuation.grade_a_max_ber)
        },
        rationale: "Positive NPV with strong coverage and a low break-even point",
    },
    GradeRule {
        grade: Grade::B,
        applies: |npv, dcr, ber, s| {
            positive(npv)
                && recommended_dcr(dcr, s.valuation.grade_b_min_dcr, s)
                && at_most(ber, s.valuation.grade_b_max_ber)
        },
        rationale: "Positive NPV with adequate coverage",
    },
    GradeRule {
        grade: Grade::C,
        applies: |npv, dcr, _, s| not_negative(npv) && at_least(dcr, s.valuation.grade_c_min_dcr),
        rationale: "Marginal value creation with thin coverage",
    },
    GradeRule {
        grade: Grade::D,
        applies: |npv, dcr, _, s| {
            at_least(dcr, s.valuation.grade_d_min_dcr) || (dcr.is_none() && not_negative(npv))
        },
        rationale: "Income barely covers debt service, or coverage cannot be assessed",
    },
];

const FAILING_RATIONALE: &str = "Value is destroyed or debt service is not covered";

pub fn analyze_valuation(metrics: &MetricRecord, standards: &DomainStandards) -> ValuationAnalysis {
    let npv = metrics.net_present_value;
    let dcr = metrics.debt_coverage_ratio;
    let ber = metrics.break_even_ratio;

    let (investment_grade, rationale) = GRADE_TABLE
        .iter()
        .find(|rule| (rule.applies)(npv, dcr, ber, standards))
        .map(|rule| (rule.grade, rule.rationale))
        .unwrap_or((Grade::F, FAILING_RATIONALE));

    let cap_rate_spread = match (metrics.yield_rate, metrics.market_cap_rate) {
        (Some(y), Some(cap)) => Some(y - cap),
        _ => None,
    };

    ValuationAnalysis {
        investment_grade,
        net_present_value: npv,
        value_creation: positive(npv),
        recommendation: InvestmentRecommendation::from_grade(investment_grade),
        cap_rate_spread,
        rationale: rationale.to_string(),
    }
}
