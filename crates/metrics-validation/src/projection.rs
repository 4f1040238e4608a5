//! Holding-period projections: IRRs and NPV from flat annual cash flows.

use crate::finance::{irr, npv, remaining_balance};
use property_core::{AnalysisWarning, MetricField, MetricRecord, WarningCode};

const MIN_HOLDING_YEARS: usize = 1;
const MAX_HOLDING_YEARS: usize = 50;

#[derive(Debug, Clone, Default)]
pub struct ProjectionOutcome {
    pub values: Vec<(MetricField, f64)>,
    pub warnings: Vec<AnalysisWarning>,
}

/// Cash flow series for one return measure, year 0 first.
fn series(initial: f64, annual: f64, reversion: f64, years: usize) -> Vec<f64> {
    let mut flows = Vec::with_capacity(years + 1);
    flows.push(-initial);
    for year in 1..=years {
        if year == years {
            flows.push(annual + reversion);
        } else {
            flows.push(annual);
        }
    }
    flows
}

fn holding_years(metrics: &MetricRecord) -> Option<usize> {
    let period = metrics.holding_period.filter(|p| *p > 0.0)?;
    Some((period.round() as usize).clamp(MIN_HOLDING_YEARS, MAX_HOLDING_YEARS))
}

/// Loan balance at sale. Without amortization terms the loan is treated as
/// interest-only and repaid in full.
fn balance_at_sale(metrics: &MetricRecord, years: usize) -> Option<f64> {
    let loan = metrics.loan_amount?;
    match (metrics.interest_rate, metrics.amortization_period) {
        (Some(rate), Some(amortization)) => {
            remaining_balance(loan, rate, amortization, years as f64)
        }
        _ => Some(loan),
    }
}

fn after_tax(income: f64, deductions: f64, tax_rate_pct: f64) -> f64 {
    income - (income - deductions).max(0.0) * tax_rate_pct / 100.0
}

struct Projector<'a> {
    metrics: &'a MetricRecord,
    outcome: ProjectionOutcome,
}

impl Projector<'_> {
    fn solve(&mut self, field: MetricField, flows: Option<Vec<f64>>) {
        if self.metrics.has(field) {
            return;
        }
        let Some(flows) = flows else {
            return;
        };
        match irr(&flows) {
            Some(rate) => self.outcome.values.push((field, rate * 100.0)),
            None => {
                tracing::debug!("IRR did not converge for {}: {:?}", field.as_str(), flows);
                self.outcome.warnings.push(AnalysisWarning::new(
                    WarningCode::IrrDidNotConverge,
                    format!("{} could not be solved from the projected cash flows", field.as_str()),
                ));
            }
        }
    }
}

/// Project returns over the holding period. Needs a holding period, an
/// entry price and a terminal value; each measure additionally needs its own
/// inputs and is skipped when they are missing or already present.
pub fn project(metrics: &MetricRecord) -> ProjectionOutcome {
    let mut projector = Projector {
        metrics,
        outcome: ProjectionOutcome::default(),
    };

    let (Some(years), Some(terminal)) = (holding_years(metrics), metrics.terminal_value) else {
        return projector.outcome;
    };
    let Some(noi) = metrics.net_operating_income else {
        return projector.outcome;
    };
    let entry = metrics
        .total_investment
        .or(metrics.price)
        .filter(|v| *v > 0.0);

    let unlevered = entry.map(|cost| series(cost, noi, terminal, years));
    let unlevered_after_tax = match (entry, metrics.tax_rate) {
        (Some(cost), Some(tax)) => {
            let annual = after_tax(noi, metrics.depreciation.unwrap_or(0.0), tax);
            Some(series(cost, annual, terminal, years))
        }
        _ => None,
    };

    let equity = metrics.equity.filter(|e| *e > 0.0);
    let sale_proceeds = balance_at_sale(metrics, years).map(|balance| terminal - balance);
    let levered = match (equity, metrics.before_tax_cash_flow, sale_proceeds) {
        (Some(equity), Some(btcf), Some(proceeds)) => Some(series(equity, btcf, proceeds, years)),
        _ => None,
    };
    let levered_after_tax = match (equity, metrics.after_tax_cash_flow, sale_proceeds) {
        (Some(equity), Some(atcf), Some(proceeds)) => Some(series(equity, atcf, proceeds, years)),
        _ => None,
    };

    projector.solve(MetricField::UnleveredIrrBeforeTax, unlevered.clone());
    projector.solve(MetricField::UnleveredIrrAfterTax, unlevered_after_tax);
    projector.solve(MetricField::LeveredIrrBeforeTax, levered.clone());
    projector.solve(MetricField::LeveredIrrAfterTax, levered_after_tax);

    if !metrics.has(MetricField::NetPresentValue) {
        if let Some(rate) = metrics.discount_rate {
            if let Some(flows) = levered.or(unlevered) {
                let value = npv(rate / 100.0, &flows);
                if value.is_finite() {
                    projector.outcome.values.push((MetricField::NetPresentValue, value));
                }
            }
        }
    }

    projector.outcome
}
