use property_core::{MetricField, MetricRecord};
use serde::{Deserialize, Serialize};

const CRITICAL_WEIGHT: f64 = 0.7;
const SECONDARY_WEIGHT: f64 = 0.3;
const MAX_MISSING_REPORTED: usize = 5;

/// Fields an analysis cannot do without.
pub const CRITICAL_FIELDS: &[MetricField] = &[
    MetricField::Price,
    MetricField::NetOperatingIncome,
    MetricField::LoanAmount,
    MetricField::AnnualDebtService,
    MetricField::YieldRate,
    MetricField::LoanConstant,
    MetricField::CashOnCashReturn,
    MetricField::DebtCoverageRatio,
];

pub const SECONDARY_FIELDS: &[MetricField] = &[
    MetricField::BreakEvenRatio,
    MetricField::LoanToValue,
    MetricField::Equity,
    MetricField::GrossPotentialIncome,
    MetricField::EffectiveGrossIncome,
    MetricField::OperatingExpenses,
    MetricField::InterestRate,
    MetricField::AmortizationPeriod,
    MetricField::LeveredIrrBeforeTax,
    MetricField::NetPresentValue,
    MetricField::VacancyRate,
    MetricField::HoldingPeriod,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn from_completeness(completeness: f64) -> Self {
        match completeness {
            c if c < 60.0 => ConfidenceLevel::Low,
            c if c < 80.0 => ConfidenceLevel::Medium,
            _ => ConfidenceLevel::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::Low => "Low",
            ConfidenceLevel::Medium => "Medium",
            ConfidenceLevel::High => "High",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    /// 0-100
    pub completeness: f64,
    pub confidence: ConfidenceLevel,
    pub missing_critical: Vec<String>,
}

fn coverage(metrics: &MetricRecord, fields: &[MetricField]) -> f64 {
    let present = fields.iter().filter(|f| metrics.has(**f)).count();
    present as f64 / fields.len() as f64
}

/// Weighted completeness of a record over the critical and secondary lists.
pub fn assess_quality(metrics: &MetricRecord) -> QualityAssessment {
    let completeness = (CRITICAL_WEIGHT * coverage(metrics, CRITICAL_FIELDS)
        + SECONDARY_WEIGHT * coverage(metrics, SECONDARY_FIELDS))
        * 100.0;

    let missing_critical = CRITICAL_FIELDS
        .iter()
        .filter(|f| !metrics.has(**f))
        .take(MAX_MISSING_REPORTED)
        .map(|f| f.as_str().to_string())
        .collect();

    QualityAssessment {
        completeness,
        confidence: ConfidenceLevel::from_completeness(completeness),
        missing_critical,
    }
}
