use crate::leverage::LeverageAnalysis;
use property_core::{
    DomainStandards, MarketCondition, MetricRecord, PropertyAttributes, RiskLevel,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAnalysis {
    pub leverage_risk: RiskLevel,
    pub market_risk: RiskLevel,
    pub operational_risk: RiskLevel,
    pub financial_risk: RiskLevel,
    pub overall_risk: RiskLevel,
    pub risk_factors: Vec<String>,
}

/// Highest known level; `Unknown` sorts lowest so it only wins when alone.
fn highest(levels: &[RiskLevel]) -> RiskLevel {
    levels.iter().copied().max().unwrap_or(RiskLevel::Unknown)
}

fn market_risk(
    metrics: &MetricRecord,
    standards: &DomainStandards,
    factors: &mut Vec<String>,
) -> RiskLevel {
    let vacancy_level = match metrics.vacancy_rate {
        None => RiskLevel::Unknown,
        Some(v) if v > standards.vacancy.soft.max => {
            factors.push(format!("Vacancy {:.1}% is above the soft-market band", v));
            RiskLevel::High
        }
        Some(v) => match standards.vacancy.classify(v) {
            MarketCondition::Strong | MarketCondition::Stable => RiskLevel::Low,
            MarketCondition::Soft => {
                factors.push(format!("Vacancy {:.1}% indicates a soft rental market", v));
                RiskLevel::Medium
            }
        },
    };

    let pricing_level = match (metrics.yield_rate, metrics.market_cap_rate) {
        (Some(y), Some(cap)) if y + standards.risk.pricing_tolerance < cap => {
            factors.push(format!(
                "Yield {:.2}% is below the market cap rate {:.2}%; the price may be above market",
                y, cap
            ));
            RiskLevel::Medium
        }
        (Some(_), Some(_)) => RiskLevel::Low,
        _ => RiskLevel::Unknown,
    };

    highest(&[vacancy_level, pricing_level])
}

fn operational_risk(
    metrics: &MetricRecord,
    attributes: &PropertyAttributes,
    standards: &DomainStandards,
    factors: &mut Vec<String>,
) -> RiskLevel {
    let expense_level = match (metrics.operating_expense_ratio, attributes.category) {
        (Some(ratio), Some(category)) => {
            let band = standards.category(category).expense_ratio;
            if ratio > band.max {
                factors.push(format!(
                    "Expense ratio {:.1}% is above the typical maximum of {:.0}%",
                    ratio, band.max
                ));
                RiskLevel::High
            } else if ratio < band.min {
                factors.push(format!(
                    "Expense ratio {:.1}% is below {:.0}%; expenses may be understated",
                    ratio, band.min
                ));
                RiskLevel::Medium
            } else {
                RiskLevel::Low
            }
        }
        _ => RiskLevel::Unknown,
    };

    let age_level = match attributes.age_years {
        Some(age) if age > standards.risk.aging_building_years => {
            factors.push(format!(
                "Building is {} years old; expect higher capital expenditure",
                age
            ));
            RiskLevel::Medium
        }
        Some(_) => RiskLevel::Low,
        None => RiskLevel::Unknown,
    };

    highest(&[expense_level, age_level])
}

fn financial_risk(
    metrics: &MetricRecord,
    standards: &DomainStandards,
    factors: &mut Vec<String>,
) -> RiskLevel {
    let dcr_level = match metrics.debt_coverage_ratio {
        None => RiskLevel::Unknown,
        Some(d) if d >= standards.dcr.good => RiskLevel::Low,
        Some(d) if d >= standards.dcr.minimum => RiskLevel::Medium,
        Some(d) => {
            factors.push(format!(
                "DCR {:.2} is below the lender minimum of {:.2}",
                d, standards.dcr.minimum
            ));
            RiskLevel::High
        }
    };

    let ltv_level = match metrics.loan_to_value {
        None => RiskLevel::Unknown,
        Some(ltv) if ltv <= standards.irr.core_plus_max_ltv => RiskLevel::Low,
        Some(ltv) if ltv <= standards.irr.value_add_max_ltv => RiskLevel::Medium,
        Some(ltv) => {
            factors.push(format!("LTV {:.1}% leaves a thin equity cushion", ltv));
            RiskLevel::High
        }
    };

    highest(&[dcr_level, ltv_level])
}

pub fn analyze_risk(
    metrics: &MetricRecord,
    attributes: &PropertyAttributes,
    leverage: &LeverageAnalysis,
    standards: &DomainStandards,
) -> RiskAnalysis {
    let mut risk_factors = Vec::new();

    let leverage_risk = leverage.risk_level;
    if leverage_risk == RiskLevel::High {
        risk_factors
            .push("Negative leverage: debt costs more than the property yields".to_string());
    }

    let market_risk = market_risk(metrics, standards, &mut risk_factors);
    let operational_risk = operational_risk(metrics, attributes, standards, &mut risk_factors);
    let financial_risk = financial_risk(metrics, standards, &mut risk_factors);
    let overall_risk = highest(&[leverage_risk, market_risk, operational_risk, financial_risk]);

    RiskAnalysis {
        leverage_risk,
        market_risk,
        operational_risk,
        financial_risk,
        overall_risk,
        risk_factors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leverage::analyze_leverage;
    use property_core::{MetricField, PropertyCategory};

    fn run(metrics: &MetricRecord, attributes: &PropertyAttributes) -> RiskAnalysis {
        let standards = DomainStandards::default();
        let leverage = analyze_leverage(metrics, &standards);
        analyze_risk(metrics, attributes, &leverage, &standards)
    }

    #[test]
    fn test_all_unknown_without_data() {
        let analysis = run(&MetricRecord::new(), &PropertyAttributes::default());
        assert_eq!(analysis.overall_risk, RiskLevel::Unknown);
        assert!(analysis.risk_factors.is_empty());
    }

    #[test]
    fn test_overall_takes_highest_known() {
        let metrics = MetricRecord::new()
            .with(MetricField::YieldRate, 8.0)
            .with(MetricField::LoanConstant, 6.0)
            .with(MetricField::DebtCoverageRatio, 1.1);
        let analysis = run(&metrics, &PropertyAttributes::default());
        assert_eq!(analysis.leverage_risk, RiskLevel::Low);
        assert_eq!(analysis.financial_risk, RiskLevel::High);
        assert_eq!(analysis.market_risk, RiskLevel::Unknown);
        assert_eq!(analysis.overall_risk, RiskLevel::High);
        assert_eq!(analysis.risk_factors.len(), 1);
    }

    #[test]
    fn test_market_and_operational_buckets() {
        let metrics = MetricRecord::new()
            .with(MetricField::VacancyRate, 10.0)
            .with(MetricField::OperatingExpenseRatio, 30.0);
        let attributes = PropertyAttributes {
            category: Some(PropertyCategory::ResidentialMultifamily),
            age_years: Some(40),
            ..Default::default()
        };
        let analysis = run(&metrics, &attributes);
        assert_eq!(analysis.market_risk, RiskLevel::Medium);
        assert_eq!(analysis.operational_risk, RiskLevel::Medium);
        assert_eq!(analysis.overall_risk, RiskLevel::Medium);
    }

    #[test]
    fn test_overpriced_relative_to_market() {
        let metrics = MetricRecord::new()
            .with(MetricField::YieldRate, 4.0)
            .with(MetricField::MarketCapRate, 5.0)
            .with(MetricField::VacancyRate, 3.0);
        let analysis = run(&metrics, &PropertyAttributes::default());
        assert_eq!(analysis.market_risk, RiskLevel::Medium);
        assert!(analysis.risk_factors[0].contains("market cap rate"));
    }

    #[test]
    fn test_risk_cutoffs_from_standards() {
        let metrics = MetricRecord::new()
            .with(MetricField::YieldRate, 4.0)
            .with(MetricField::MarketCapRate, 5.0);
        let attributes = PropertyAttributes {
            age_years: Some(40),
            ..Default::default()
        };
        let mut standards = DomainStandards::default();
        standards.risk.aging_building_years = 45;
        standards.risk.pricing_tolerance = 1.5;
        let leverage = analyze_leverage(&metrics, &standards);
        let analysis = analyze_risk(&metrics, &attributes, &leverage, &standards);
        assert_eq!(analysis.market_risk, RiskLevel::Low);
        assert_eq!(analysis.operational_risk, RiskLevel::Low);
        assert!(analysis.risk_factors.is_empty());
    }
}
