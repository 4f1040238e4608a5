use property_core::{DomainStandards, IrrBand, MetricRecord, RiskProfile};
use serde::{Deserialize, Serialize};

/// Where the levered IRR sits relative to its profile's target band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrrBenchmarkStatus {
    Above,
    Within,
    Below,
    Unknown,
}

impl IrrBenchmarkStatus {
    pub fn classify(irr: Option<f64>, band: Option<IrrBand>) -> Self {
        match (irr, band) {
            (Some(r), Some(b)) if r > b.max => IrrBenchmarkStatus::Above,
            (Some(r), Some(b)) if r >= b.min => IrrBenchmarkStatus::Within,
            (Some(_), Some(_)) => IrrBenchmarkStatus::Below,
            _ => IrrBenchmarkStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IrrBenchmarkStatus::Above => "Above target",
            IrrBenchmarkStatus::Within => "Within target",
            IrrBenchmarkStatus::Below => "Below target",
            IrrBenchmarkStatus::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrAnalysis {
    pub levered_irr: Option<f64>,
    pub levered_irr_after_tax: Option<f64>,
    pub unlevered_irr: Option<f64>,
    pub unlevered_irr_after_tax: Option<f64>,
    pub risk_profile: Option<RiskProfile>,
    pub benchmark: Option<IrrBand>,
    pub status: IrrBenchmarkStatus,
    /// Levered minus unlevered IRR, percentage points
    pub irr_spread: Option<f64>,
    pub leverage_adds_return: Option<bool>,
    pub commentary: String,
}

pub fn analyze_irr(metrics: &MetricRecord, standards: &DomainStandards) -> IrrAnalysis {
    let levered_irr = metrics.levered_irr_before_tax;
    let unlevered_irr = metrics.unlevered_irr_before_tax;

    let risk_profile = metrics
        .loan_to_value
        .map(|ltv| standards.irr.profile_for_ltv(ltv));
    let benchmark = risk_profile.map(|p| standards.irr.band(p));
    let status = IrrBenchmarkStatus::classify(levered_irr, benchmark);

    let irr_spread = match (levered_irr, unlevered_irr) {
        (Some(l), Some(u)) => Some(l - u),
        _ => None,
    };
    let leverage_adds_return = irr_spread.map(|s| s > 0.0);

    let commentary = match (levered_irr, risk_profile, benchmark) {
        (Some(irr), Some(profile), Some(band)) => format!(
            "Levered IRR {:.1}% is {} for a {} profile ({:.0}-{:.0}%).",
            irr,
            status.as_str().to_lowercase(),
            profile.to_label(),
            band.min,
            band.max
        ),
        (Some(irr), _, _) => format!(
            "Levered IRR {:.1}%; LTV unknown, so no benchmark profile applies.",
            irr
        ),
        (None, _, _) => "Levered IRR unavailable.".to_string(),
    };

    IrrAnalysis {
        levered_irr,
        levered_irr_after_tax: metrics.levered_irr_after_tax,
        unlevered_irr,
        unlevered_irr_after_tax: metrics.unlevered_irr_after_tax,
        risk_profile,
        benchmark,
        status,
        irr_spread,
        leverage_adds_return,
        commentary,
    }
}
