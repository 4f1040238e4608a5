//! Leverage, return, risk and valuation analyzers.
//!
//! Each analyzer reads a validated `MetricRecord` and the shared
//! `DomainStandards` and produces a self-contained verdict. None of them
//! alter the metrics they are given.

pub mod irr;
pub mod leverage;
pub mod risk;
pub mod valuation;

pub use irr::{analyze_irr, IrrAnalysis, IrrBenchmarkStatus};
pub use leverage::{analyze_leverage, LeverageAnalysis, LeverageStrength, LeverageType};
pub use risk::{analyze_risk, RiskAnalysis};
pub use valuation::{analyze_valuation, InvestmentRecommendation, ValuationAnalysis};
