//! Time-value-of-money helpers shared by the imputer and projections.
//!
//! Rates passed in and returned are in percent unless noted.

const NEWTON_MAX_ITERATIONS: usize = 100;
const BISECTION_MAX_ITERATIONS: usize = 200;
const IRR_EPSILON: f64 = 1e-9;

/// Annual loan constant (percent) for a fully amortizing loan with monthly payments.
pub fn mortgage_constant(annual_rate_pct: f64, amortization_years: f64) -> Option<f64> {
    if amortization_years <= 0.0 || annual_rate_pct < 0.0 {
        return None;
    }
    let months = (amortization_years * 12.0).round();
    if months < 1.0 {
        return None;
    }
    let i = annual_rate_pct / 100.0 / 12.0;
    let monthly = if i.abs() < f64::EPSILON {
        1.0 / months
    } else {
        i / (1.0 - (1.0 + i).powf(-months))
    };
    let k = monthly * 12.0 * 100.0;
    k.is_finite().then_some(k)
}

/// Outstanding principal after `years_elapsed` years of monthly payments.
pub fn remaining_balance(
    loan: f64,
    annual_rate_pct: f64,
    amortization_years: f64,
    years_elapsed: f64,
) -> Option<f64> {
    if loan <= 0.0 || amortization_years <= 0.0 {
        return None;
    }
    let n = (amortization_years * 12.0).round();
    let m = (years_elapsed * 12.0).round().min(n);
    let i = annual_rate_pct / 100.0 / 12.0;
    let balance = if i.abs() < f64::EPSILON {
        loan * (1.0 - m / n)
    } else {
        let growth = (1.0 + i).powf(m);
        let payment = loan * i / (1.0 - (1.0 + i).powf(-n));
        loan * growth - payment * (growth - 1.0) / i
    };
    let balance = balance.max(0.0);
    balance.is_finite().then_some(balance)
}

/// Net present value of annual cash flows, the first at t = 0. `rate` is a decimal.
pub fn npv(rate: f64, cash_flows: &[f64]) -> f64 {
    cash_flows
        .iter()
        .enumerate()
        .map(|(t, cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}

fn npv_derivative(rate: f64, cash_flows: &[f64]) -> f64 {
    cash_flows
        .iter()
        .enumerate()
        .skip(1)
        .map(|(t, cf)| -(t as f64) * cf / (1.0 + rate).powi(t as i32 + 1))
        .sum()
}

/// Internal rate of return as a decimal.
///
/// Newton–Raphson from 10%, falling back to bisection over [-99%, 1000%].
/// Returns `None` when the flows have no sign change or no root is found.
pub fn irr(cash_flows: &[f64]) -> Option<f64> {
    if cash_flows.len() < 2 {
        return None;
    }
    let has_negative = cash_flows.iter().any(|cf| *cf < 0.0);
    let has_positive = cash_flows.iter().any(|cf| *cf > 0.0);
    if !has_negative || !has_positive {
        return None;
    }

    let mut rate = 0.10;
    for _ in 0..NEWTON_MAX_ITERATIONS {
        let value = npv(rate, cash_flows);
        if value.abs() < IRR_EPSILON * cash_flows[0].abs().max(1.0) {
            return Some(rate);
        }
        let slope = npv_derivative(rate, cash_flows);
        if slope.abs() < f64::EPSILON || !slope.is_finite() {
            break;
        }
        let next = rate - value / slope;
        if !next.is_finite() || next <= -0.99 || next > 10.0 {
            break;
        }
        if (next - rate).abs() < IRR_EPSILON {
            return Some(next);
        }
        rate = next;
    }

    bisect_irr(cash_flows)
}

fn bisect_irr(cash_flows: &[f64]) -> Option<f64> {
    let (mut lo, mut hi) = (-0.99, 10.0);
    let mut f_lo = npv(lo, cash_flows);
    let f_hi = npv(hi, cash_flows);
    if !f_lo.is_finite() || !f_hi.is_finite() || f_lo.signum() == f_hi.signum() {
        return None;
    }
    for _ in 0..BISECTION_MAX_ITERATIONS {
        let mid = (lo + hi) / 2.0;
        let f_mid = npv(mid, cash_flows);
        if f_mid.abs() < IRR_EPSILON || (hi - lo) / 2.0 < IRR_EPSILON {
            return Some(mid);
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    Some((lo + hi) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mortgage_constant_known_value() {
        // 3% / 30 years monthly: payment factor 0.0042160 per month
        let k = mortgage_constant(3.0, 30.0).unwrap();
        assert_relative_eq!(k, 5.0592, epsilon = 0.001);
    }

    #[test]
    fn test_mortgage_constant_zero_rate() {
        assert_relative_eq!(mortgage_constant(0.0, 25.0).unwrap(), 4.0, epsilon = 1e-9);
        assert!(mortgage_constant(2.0, 0.0).is_none());
    }

    #[test]
    fn test_remaining_balance_bounds() {
        let start = remaining_balance(100_000_000.0, 2.0, 30.0, 0.0).unwrap();
        assert_relative_eq!(start, 100_000_000.0, epsilon = 1e-3);
        let end = remaining_balance(100_000_000.0, 2.0, 30.0, 30.0).unwrap();
        assert!(end.abs() < 1.0);
        let mid = remaining_balance(100_000_000.0, 2.0, 30.0, 10.0).unwrap();
        assert!(mid > 0.0 && mid < 100_000_000.0);
    }

    #[test]
    fn test_irr_simple() {
        // -100 then 110 → 10%
        assert_relative_eq!(irr(&[-100.0, 110.0]).unwrap(), 0.10, epsilon = 1e-7);
        // level annuity
        let rate = irr(&[-1000.0, 300.0, 300.0, 300.0, 300.0]).unwrap();
        assert_relative_eq!(npv(rate, &[-1000.0, 300.0, 300.0, 300.0, 300.0]), 0.0, epsilon = 1e-4);
        assert_relative_eq!(rate, 0.07714, epsilon = 1e-4);
    }

    #[test]
    fn test_irr_requires_sign_change() {
        assert!(irr(&[100.0, 100.0]).is_none());
        assert!(irr(&[-100.0]).is_none());
    }

    #[test]
    fn test_irr_negative_return() {
        let rate = irr(&[-100.0, 50.0]).unwrap();
        assert_relative_eq!(rate, -0.5, epsilon = 1e-6);
    }
}
