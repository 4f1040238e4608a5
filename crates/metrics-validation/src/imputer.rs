//! Fills missing metrics from formulas, domain estimates and projections.
//!
//! Present fields are never overwritten. Formula rules run to a fixpoint
//! between every other step so each estimate immediately feeds the
//! identities that depend on it.

use crate::consistency::check_consistency;
use crate::finance::mortgage_constant;
use crate::projection::project;
use property_core::{
    AnalysisWarning, DomainStandards, Imputation, ImputationMethod, MetricField, MetricRecord,
    PropertyAttributes,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MAX_FORMULA_PASSES: usize = 16;

/// Validated record plus a log of every value that was filled in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImputationOutcome {
    pub metrics: MetricRecord,
    pub imputations: Vec<Imputation>,
    pub warnings: Vec<AnalysisWarning>,
}

struct FormulaRule {
    target: MetricField,
    compute: fn(&MetricRecord) -> Option<f64>,
}

fn divide(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator.abs() < f64::EPSILON {
        None
    } else {
        Some(numerator / denominator)
    }
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

/// Identities between metric fields. Earlier rules win when two could fill
/// the same slot in the same pass.
const FORMULAS: &[FormulaRule] = &[
    // capital structure
    FormulaRule {
        target: MetricField::LoanToValue,
        compute: |m| Some(divide(m.loan_amount?, positive(m.price)?)? * 100.0),
    },
    FormulaRule {
        target: MetricField::LoanAmount,
        compute: |m| Some(positive(m.price)? * m.loan_to_value? / 100.0),
    },
    FormulaRule {
        target: MetricField::Price,
        compute: |m| divide(m.loan_amount?, positive(m.loan_to_value)? / 100.0),
    },
    FormulaRule {
        target: MetricField::Equity,
        compute: |m| Some(positive(m.price)? - m.loan_amount?),
    },
    FormulaRule {
        target: MetricField::Equity,
        compute: |m| Some(positive(m.total_investment)? - m.loan_amount?),
    },
    // income yield
    FormulaRule {
        target: MetricField::YieldRate,
        compute: |m| Some(divide(m.net_operating_income?, positive(m.price)?)? * 100.0),
    },
    FormulaRule {
        target: MetricField::NetOperatingIncome,
        compute: |m| Some(positive(m.price)? * m.yield_rate? / 100.0),
    },
    FormulaRule {
        target: MetricField::Price,
        compute: |m| divide(m.net_operating_income?, positive(m.yield_rate)? / 100.0),
    },
    // debt service
    FormulaRule {
        target: MetricField::LoanConstant,
        compute: |m| Some(divide(m.annual_debt_service?, positive(m.loan_amount)?)? * 100.0),
    },
    FormulaRule {
        target: MetricField::LoanConstant,
        compute: |m| mortgage_constant(m.interest_rate?, m.amortization_period?),
    },
    FormulaRule {
        target: MetricField::AnnualDebtService,
        compute: |m| Some(positive(m.loan_amount)? * m.loan_constant? / 100.0),
    },
    FormulaRule {
        target: MetricField::DebtCoverageRatio,
        compute: |m| divide(m.net_operating_income?, positive(m.annual_debt_service)?),
    },
    FormulaRule {
        target: MetricField::BeforeTaxCashFlow,
        compute: |m| Some(m.net_operating_income? - m.annual_debt_service?),
    },
    FormulaRule {
        target: MetricField::CashOnCashReturn,
        compute: |m| Some(divide(m.before_tax_cash_flow?, positive(m.equity)?)? * 100.0),
    },
    // income statement
    FormulaRule {
        target: MetricField::EffectiveGrossIncome,
        compute: |m| Some(m.gross_potential_income? * (1.0 - m.vacancy_rate? / 100.0)),
    },
    FormulaRule {
        target: MetricField::VacancyRate,
        compute: |m| {
            let gpi = positive(m.gross_potential_income)?;
            let egi = m.effective_gross_income.filter(|egi| *egi >= 0.0 && *egi <= gpi)?;
            Some((1.0 - egi / gpi) * 100.0)
        },
    },
    FormulaRule {
        target: MetricField::EffectiveGrossIncome,
        compute: |m| Some(m.net_operating_income? + m.operating_expenses?),
    },
    FormulaRule {
        target: MetricField::NetOperatingIncome,
        compute: |m| Some(m.effective_gross_income? - m.operating_expenses?),
    },
    FormulaRule {
        target: MetricField::OperatingExpenses,
        compute: |m| Some(m.effective_gross_income? - m.net_operating_income?),
    },
    FormulaRule {
        target: MetricField::OperatingExpenses,
        compute: |m| Some(m.effective_gross_income? * m.operating_expense_ratio? / 100.0),
    },
    FormulaRule {
        target: MetricField::OperatingExpenseRatio,
        compute: |m| {
            Some(divide(m.operating_expenses?, positive(m.effective_gross_income)?)? * 100.0)
        },
    },
    FormulaRule {
        target: MetricField::BreakEvenRatio,
        compute: |m| {
            let outflow = m.operating_expenses? + m.annual_debt_service?;
            Some(divide(outflow, positive(m.gross_potential_income)?)? * 100.0)
        },
    },
    // reversion and tax
    FormulaRule {
        target: MetricField::TerminalValue,
        compute: |m| divide(m.net_operating_income?, positive(m.exit_cap_rate)? / 100.0),
    },
    FormulaRule {
        target: MetricField::AfterTaxCashFlow,
        compute: |m| {
            let interest = m.loan_amount? * m.interest_rate? / 100.0;
            let taxable = m.net_operating_income? - interest - m.depreciation.unwrap_or(0.0);
            Some(m.before_tax_cash_flow? - taxable.max(0.0) * m.tax_rate? / 100.0)
        },
    },
];

type DomainEstimate =
    fn(&MetricRecord, &DomainStandards, &PropertyAttributes) -> Option<(MetricField, f64)>;

/// Standards-based estimates, in application order.
const DOMAIN_ESTIMATES: &[DomainEstimate] = &[
    // vacancy, only when neither EGI nor vacancy is known
    |m, s, _| {
        if m.gross_potential_income.is_none()
            || m.effective_gross_income.is_some()
            || m.vacancy_rate.is_some()
        {
            return None;
        }
        let vacancy = m
            .market_vacancy_rate
            .unwrap_or_else(|| s.vacancy.stable.midpoint());
        Some((MetricField::VacancyRate, vacancy))
    },
    |m, s, a| {
        if m.operating_expenses.is_some() || m.operating_expense_ratio.is_some() {
            return None;
        }
        let egi = m.effective_gross_income?;
        Some((
            MetricField::OperatingExpenses,
            egi * s.typical_expense_ratio(a.category) / 100.0,
        ))
    },
    |m, s, a| {
        if m.capital_reserve.is_some() {
            return None;
        }
        let egi = m.effective_gross_income?;
        Some((
            MetricField::CapitalReserve,
            egi * s.reserves.percent_for_age(a.age_years) / 100.0,
        ))
    },
    |m, s, a| {
        if m.management_fee.is_some() {
            return None;
        }
        let egi = m.effective_gross_income?;
        Some((
            MetricField::ManagementFee,
            egi * s.management_fee_percent(a.category) / 100.0,
        ))
    },
];

/// Runs the imputation sequence against a shared [`DomainStandards`] table.
#[derive(Debug, Clone)]
pub struct MetricsImputer {
    standards: Arc<DomainStandards>,
}

impl MetricsImputer {
    pub fn new(standards: Arc<DomainStandards>) -> Self {
        Self { standards }
    }

    pub fn standards(&self) -> &DomainStandards {
        &self.standards
    }

    /// Fill what can be derived, then run the consistency checks on the result.
    pub fn impute(
        &self,
        extracted: &MetricRecord,
        attributes: &PropertyAttributes,
    ) -> ImputationOutcome {
        let mut metrics = extracted.sanitized();
        let mut imputations = Vec::new();
        let mut warnings = Vec::new();

        apply_formulas(&mut metrics, &mut imputations);

        for estimate in DOMAIN_ESTIMATES {
            if let Some((field, value)) = estimate(&metrics, &self.standards, attributes) {
                record(
                    &mut metrics,
                    &mut imputations,
                    field,
                    value,
                    ImputationMethod::DomainEstimate,
                );
                apply_formulas(&mut metrics, &mut imputations);
            }
        }

        let projected = project(&metrics);
        for (field, value) in projected.values {
            record(&mut metrics, &mut imputations, field, value, ImputationMethod::Projection);
        }
        warnings.extend(projected.warnings);
        apply_formulas(&mut metrics, &mut imputations);

        warnings.extend(check_consistency(&metrics, attributes, &self.standards));

        tracing::debug!(
            "Imputed {} fields ({} present after validation)",
            imputations.len(),
            metrics.present_fields().len()
        );

        ImputationOutcome {
            metrics,
            imputations,
            warnings,
        }
    }
}

impl Default for MetricsImputer {
    fn default() -> Self {
        Self::new(Arc::new(DomainStandards::default()))
    }
}

fn record(
    metrics: &mut MetricRecord,
    imputations: &mut Vec<Imputation>,
    field: MetricField,
    value: f64,
    method: ImputationMethod,
) -> bool {
    if !metrics.insert_if_absent(field, value) {
        return false;
    }
    tracing::debug!("Imputed {} = {:.4} ({:?})", field.as_str(), value, method);
    imputations.push(Imputation { field, method, value });
    true
}

/// Apply [`FORMULAS`] until a pass fills nothing.
fn apply_formulas(metrics: &mut MetricRecord, imputations: &mut Vec<Imputation>) {
    for _ in 0..MAX_FORMULA_PASSES {
        let mut changed = false;
        for rule in FORMULAS {
            if metrics.has(rule.target) {
                continue;
            }
            if let Some(value) = (rule.compute)(metrics) {
                changed |= record(
                    metrics,
                    imputations,
                    rule.target,
                    value,
                    ImputationMethod::Formula,
                );
            }
        }
        if !changed {
            break;
        }
    }
}
