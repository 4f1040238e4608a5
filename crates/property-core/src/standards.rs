//! Domain standards tables.
//!
//! Immutable configuration describing what "typical" looks like for income
//! property: expense ratios, vacancy, reserves and management fees by category,
//! plus the threshold tables the analyzers grade against. Built once and passed
//! explicitly into each stage so tests can substitute alternate tables.

use crate::{EngineError, PropertyCategory};
use serde::{Deserialize, Serialize};

/// Typical / minimum / maximum operating-expense ratio, in percent of EGI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRatioBand {
    pub typical: f64,
    pub min: f64,
    pub max: f64,
}

/// Vacancy band in percent, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VacancyBand {
    pub min: f64,
    pub max: f64,
}

impl VacancyBand {
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// Local rental market condition used to select a vacancy band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketCondition {
    Strong,
    Stable,
    Soft,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VacancyBands {
    pub strong: VacancyBand,
    pub stable: VacancyBand,
    pub soft: VacancyBand,
}

impl VacancyBands {
    pub fn for_condition(&self, condition: MarketCondition) -> VacancyBand {
        match condition {
            MarketCondition::Strong => self.strong,
            MarketCondition::Stable => self.stable,
            MarketCondition::Soft => self.soft,
        }
    }

    /// Classify an observed vacancy rate into the market condition it implies.
    pub fn classify(&self, vacancy: f64) -> MarketCondition {
        if vacancy <= self.strong.max {
            MarketCondition::Strong
        } else if vacancy <= self.stable.max {
            MarketCondition::Stable
        } else {
            MarketCondition::Soft
        }
    }
}

/// Capital-reserve percentages of EGI by building age band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReserveSchedule {
    pub up_to_5_years: f64,
    pub up_to_15_years: f64,
    pub up_to_25_years: f64,
    pub over_25_years: f64,
    /// Used when the building age is unknown
    pub unknown_age: f64,
}

impl ReserveSchedule {
    pub fn percent_for_age(&self, age_years: Option<u32>) -> f64 {
        match age_years {
            Some(age) if age <= 5 => self.up_to_5_years,
            Some(age) if age <= 15 => self.up_to_15_years,
            Some(age) if age <= 25 => self.up_to_25_years,
            Some(_) => self.over_25_years,
            None => self.unknown_age,
        }
    }
}

/// Per-category table of expense ratios and management fees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStandards {
    pub expense_ratio: ExpenseRatioBand,
    /// Management fee, percent of EGI
    pub management_fee_percent: f64,
}

/// Yield-gap thresholds (percentage points) separating leverage strengths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeverageThresholds {
    pub excellent: f64,
    pub good: f64,
    pub moderate: f64,
    pub weak: f64,
}

/// DCR lower bounds for each quality band, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcrBands {
    pub excellent: f64,
    pub good: f64,
    pub acceptable: f64,
    pub minimum: f64,
}

/// BER upper bounds (percent) for each quality band, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BerBands {
    pub excellent: f64,
    pub good: f64,
    pub acceptable: f64,
    pub marginal: f64,
}

/// Investor risk profile, used to pick an IRR benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskProfile {
    Core,
    CorePlus,
    ValueAdd,
    Opportunistic,
}

impl RiskProfile {
    pub fn to_label(&self) -> &'static str {
        match self {
            RiskProfile::Core => "Core",
            RiskProfile::CorePlus => "Core-Plus",
            RiskProfile::ValueAdd => "Value-Add",
            RiskProfile::Opportunistic => "Opportunistic",
        }
    }
}

/// Target levered IRR range in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrrBand {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrBenchmarks {
    pub core: IrrBand,
    pub core_plus: IrrBand,
    pub value_add: IrrBand,
    pub opportunistic: IrrBand,
    /// LTV ceilings (percent) for core / core-plus / value-add; anything above is opportunistic
    pub core_max_ltv: f64,
    pub core_plus_max_ltv: f64,
    pub value_add_max_ltv: f64,
}

impl IrrBenchmarks {
    pub fn band(&self, profile: RiskProfile) -> IrrBand {
        match profile {
            RiskProfile::Core => self.core,
            RiskProfile::CorePlus => self.core_plus,
            RiskProfile::ValueAdd => self.value_add,
            RiskProfile::Opportunistic => self.opportunistic,
        }
    }

    pub fn profile_for_ltv(&self, ltv: f64) -> RiskProfile {
        if ltv <= self.core_max_ltv {
            RiskProfile::Core
        } else if ltv <= self.core_plus_max_ltv {
            RiskProfile::CorePlus
        } else if ltv <= self.value_add_max_ltv {
            RiskProfile::ValueAdd
        } else {
            RiskProfile::Opportunistic
        }
    }
}

/// Investment-grade cut-offs: DCR lower bounds and BER upper bounds (percent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationThresholds {
    pub grade_a_min_dcr: f64,
    pub grade_a_max_ber: f64,
    pub grade_b_min_dcr: f64,
    pub grade_b_max_ber: f64,
    pub grade_c_min_dcr: f64,
    pub grade_d_min_dcr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    /// Building age (years) past which capital-expenditure risk rises
    pub aging_building_years: u32,
    /// Yield shortfall vs market cap rate (percentage points) treated as overpricing
    pub pricing_tolerance: f64,
}

/// The full, immutable standards table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainStandards {
    pub multifamily: CategoryStandards,
    pub office: CategoryStandards,
    pub retail: CategoryStandards,
    pub industrial: CategoryStandards,
    /// Expense ratio (percent of EGI) used when the category is unknown
    pub default_expense_ratio: f64,
    pub default_management_fee_percent: f64,
    pub vacancy: VacancyBands,
    pub reserves: ReserveSchedule,
    pub leverage: LeverageThresholds,
    pub dcr: DcrBands,
    pub ber: BerBands,
    /// Yield-gap bands feeding the stability score
    pub stability_gap: LeverageThresholds,
    pub irr: IrrBenchmarks,
    pub valuation: ValuationThresholds,
    pub risk: RiskThresholds,
}

impl Default for DomainStandards {
    fn default() -> Self {
        Self {
            multifamily: CategoryStandards {
                expense_ratio: ExpenseRatioBand {
                    typical: 30.0,
                    min: 20.0,
                    max: 40.0,
                },
                management_fee_percent: 5.0,
            },
            office: CategoryStandards {
                expense_ratio: ExpenseRatioBand {
                    typical: 35.0,
                    min: 25.0,
                    max: 45.0,
                },
                management_fee_percent: 3.0,
            },
            retail: CategoryStandards {
                expense_ratio: ExpenseRatioBand {
                    typical: 25.0,
                    min: 15.0,
                    max: 35.0,
                },
                management_fee_percent: 4.0,
            },
            industrial: CategoryStandards {
                expense_ratio: ExpenseRatioBand {
                    typical: 20.0,
                    min: 10.0,
                    max: 30.0,
                },
                management_fee_percent: 2.0,
            },
            default_expense_ratio: 35.0,
            default_management_fee_percent: 5.0,
            vacancy: VacancyBands {
                strong: VacancyBand { min: 2.0, max: 5.0 },
                stable: VacancyBand { min: 5.0, max: 8.0 },
                soft: VacancyBand {
                    min: 8.0,
                    max: 15.0,
                },
            },
            reserves: ReserveSchedule {
                up_to_5_years: 3.0,
                up_to_15_years: 5.0,
                up_to_25_years: 7.0,
                over_25_years: 10.0,
                unknown_age: 5.0,
            },
            leverage: LeverageThresholds {
                excellent: 1.5,
                good: 1.0,
                moderate: 0.5,
                weak: 0.0,
            },
            dcr: DcrBands {
                excellent: 1.50,
                good: 1.35,
                acceptable: 1.25,
                minimum: 1.20,
            },
            ber: BerBands {
                excellent: 60.0,
                good: 70.0,
                acceptable: 80.0,
                marginal: 90.0,
            },
            stability_gap: LeverageThresholds {
                excellent: 1.5,
                good: 1.0,
                moderate: 0.5,
                weak: 0.0,
            },
            irr: IrrBenchmarks {
                core: IrrBand { min: 6.0, max: 8.0 },
                core_plus: IrrBand {
                    min: 8.0,
                    max: 11.0,
                },
                value_add: IrrBand {
                    min: 11.0,
                    max: 15.0,
                },
                opportunistic: IrrBand {
                    min: 15.0,
                    max: 20.0,
                },
                core_max_ltv: 50.0,
                core_plus_max_ltv: 65.0,
                value_add_max_ltv: 75.0,
            },
            valuation: ValuationThresholds {
                grade_a_min_dcr: 1.3,
                grade_a_max_ber: 75.0,
                grade_b_min_dcr: 1.2,
                grade_b_max_ber: 85.0,
                grade_c_min_dcr: 1.1,
                grade_d_min_dcr: 1.0,
            },
            risk: RiskThresholds {
                aging_building_years: 25,
                pricing_tolerance: 0.5,
            },
        }
    }
}

impl DomainStandards {
    pub fn category(&self, category: PropertyCategory) -> &CategoryStandards {
        match category {
            PropertyCategory::ResidentialMultifamily => &self.multifamily,
            PropertyCategory::Office => &self.office,
            PropertyCategory::Retail => &self.retail,
            PropertyCategory::Industrial => &self.industrial,
        }
    }

    pub fn typical_expense_ratio(&self, category: Option<PropertyCategory>) -> f64 {
        category
            .map(|c| self.category(c).expense_ratio.typical)
            .unwrap_or(self.default_expense_ratio)
    }

    pub fn management_fee_percent(&self, category: Option<PropertyCategory>) -> f64 {
        category
            .map(|c| self.category(c).management_fee_percent)
            .unwrap_or(self.default_management_fee_percent)
    }

    /// Parse a standards table from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let standards: DomainStandards = serde_json::from_str(json)
            .map_err(|e| EngineError::InvalidStandards(e.to_string()))?;
        standards.validate()?;
        Ok(standards)
    }

    /// Reject tables whose bands are out of order or nonsensical.
    pub fn validate(&self) -> Result<(), EngineError> {
        fn descending(name: &str, values: &[f64]) -> Result<(), EngineError> {
            if values.windows(2).all(|w| w[0] > w[1]) {
                Ok(())
            } else {
                Err(EngineError::InvalidStandards(format!(
                    "{} thresholds must be strictly descending: {:?}",
                    name, values
                )))
            }
        }

        let lev = &self.leverage;
        descending("leverage", &[lev.excellent, lev.good, lev.moderate, lev.weak])?;
        let gap = &self.stability_gap;
        descending("stability_gap", &[gap.excellent, gap.good, gap.moderate, gap.weak])?;
        let dcr = &self.dcr;
        descending("dcr", &[dcr.excellent, dcr.good, dcr.acceptable, dcr.minimum])?;
        let ber = &self.ber;
        descending("ber", &[ber.marginal, ber.acceptable, ber.good, ber.excellent])?;
        let irr = &self.irr;
        descending(
            "irr ltv ceilings",
            &[irr.value_add_max_ltv, irr.core_plus_max_ltv, irr.core_max_ltv],
        )?;
        let val = &self.valuation;
        descending(
            "valuation dcr",
            &[
                val.grade_a_min_dcr,
                val.grade_b_min_dcr,
                val.grade_c_min_dcr,
                val.grade_d_min_dcr,
            ],
        )?;
        descending("valuation ber", &[val.grade_b_max_ber, val.grade_a_max_ber])?;
        if self.risk.pricing_tolerance < 0.0 {
            return Err(EngineError::InvalidStandards(
                "risk pricing tolerance must not be negative".to_string(),
            ));
        }

        for category in PropertyCategory::ALL {
            let band = self.category(category).expense_ratio;
            if !(band.min <= band.typical && band.typical <= band.max) {
                return Err(EngineError::InvalidStandards(format!(
                    "{} expense ratio band is inconsistent: {:?}",
                    category.as_str(),
                    band
                )));
            }
        }

        let v = &self.vacancy;
        if !(v.strong.max <= v.stable.max && v.stable.max <= v.soft.max) {
            return Err(EngineError::InvalidStandards(
                "vacancy bands must widen from strong to soft".to_string(),
            ));
        }

        Ok(())
    }
}
