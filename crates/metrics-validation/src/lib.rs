//! Imputation and validation of extracted deal metrics.
//!
//! Fills gaps from closed-form relationships, domain standards and simple
//! hold-period projections, then flags combinations that cannot all be true.

pub mod consistency;
pub mod finance;
pub mod imputer;
pub mod projection;
pub mod quality;

pub use consistency::check_consistency;
pub use imputer::{ImputationOutcome, MetricsImputer};
pub use quality::{assess_quality, ConfidenceLevel, QualityAssessment};
