use serde::{Deserialize, Serialize};

/// Unit a metric is expressed in once it sits in a [`MetricRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricUnit {
    /// Percentage points (8.5 means 8.5%)
    Percent,
    /// Plain multiple (DCR 1.25)
    Ratio,
    /// Base currency units (yen)
    Currency,
    /// Years
    Years,
}

macro_rules! metric_fields {
    ($( $variant:ident => $field:ident, $unit:ident; )*) => {
        /// Every financial concept the engine knows about.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum MetricField {
            $( $variant, )*
        }

        impl MetricField {
            pub const ALL: &'static [MetricField] = &[ $( MetricField::$variant, )* ];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( MetricField::$variant => stringify!($field), )*
                }
            }

            pub fn unit(&self) -> MetricUnit {
                match self {
                    $( MetricField::$variant => MetricUnit::$unit, )*
                }
            }
        }

        /// Sparse metric record. Every field is a finite number or `None`.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct MetricRecord {
            $( pub $field: Option<f64>, )*
        }

        impl MetricRecord {
            pub fn get(&self, field: MetricField) -> Option<f64> {
                match field {
                    $( MetricField::$variant => self.$field, )*
                }
            }

            fn slot_mut(&mut self, field: MetricField) -> &mut Option<f64> {
                match field {
                    $( MetricField::$variant => &mut self.$field, )*
                }
            }
        }
    };
}

metric_fields! {
    YieldRate => yield_rate, Percent;
    LoanConstant => loan_constant, Percent;
    CashOnCashReturn => cash_on_cash_return, Percent;
    DebtCoverageRatio => debt_coverage_ratio, Ratio;
    BreakEvenRatio => break_even_ratio, Percent;
    LeveredIrrBeforeTax => levered_irr_before_tax, Percent;
    LeveredIrrAfterTax => levered_irr_after_tax, Percent;
    UnleveredIrrBeforeTax => unlevered_irr_before_tax, Percent;
    UnleveredIrrAfterTax => unlevered_irr_after_tax, Percent;
    NetPresentValue => net_present_value, Currency;
    DiscountRate => discount_rate, Percent;
    Price => price, Currency;
    TotalInvestment => total_investment, Currency;
    LoanAmount => loan_amount, Currency;
    Equity => equity, Currency;
    LoanToValue => loan_to_value, Percent;
    GrossPotentialIncome => gross_potential_income, Currency;
    EffectiveGrossIncome => effective_gross_income, Currency;
    NetOperatingIncome => net_operating_income, Currency;
    BeforeTaxCashFlow => before_tax_cash_flow, Currency;
    AfterTaxCashFlow => after_tax_cash_flow, Currency;
    OperatingExpenses => operating_expenses, Currency;
    OperatingExpenseRatio => operating_expense_ratio, Percent;
    ManagementFee => management_fee, Currency;
    CapitalReserve => capital_reserve, Currency;
    InterestRate => interest_rate, Percent;
    LoanTerm => loan_term, Years;
    AmortizationPeriod => amortization_period, Years;
    AnnualDebtService => annual_debt_service, Currency;
    MarketCapRate => market_cap_rate, Percent;
    VacancyRate => vacancy_rate, Percent;
    MarketVacancyRate => market_vacancy_rate, Percent;
    HoldingPeriod => holding_period, Years;
    ExitCapRate => exit_cap_rate, Percent;
    TerminalValue => terminal_value, Currency;
    Depreciation => depreciation, Currency;
    TaxRate => tax_rate, Percent;
}

impl MetricRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, field: MetricField) -> bool {
        self.get(field).is_some()
    }

    /// Store `value` only if the slot is empty and the value is finite.
    /// Returns whether the record changed.
    pub fn insert_if_absent(&mut self, field: MetricField, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        let slot = self.slot_mut(field);
        if slot.is_some() {
            return false;
        }
        *slot = Some(value);
        true
    }

    /// Builder-style insert used by tests and callers assembling records by hand.
    pub fn with(mut self, field: MetricField, value: f64) -> Self {
        self.insert_if_absent(field, value);
        self
    }

    /// Copy of the record with any non-finite values cleared.
    pub fn sanitized(&self) -> Self {
        let mut clean = MetricRecord::new();
        for &field in MetricField::ALL {
            if let Some(v) = self.get(field) {
                clean.insert_if_absent(field, v);
            }
        }
        clean
    }

    pub fn present_fields(&self) -> Vec<MetricField> {
        MetricField::ALL
            .iter()
            .copied()
            .filter(|f| self.has(*f))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        MetricField::ALL.iter().all(|f| !self.has(*f))
    }

    /// Yield rate minus loan constant, in percentage points.
    ///
    /// Rounded to [`GAP_PRECISION`] so that inputs like 4.6 and 3.1 give a gap
    /// of exactly 1.5 rather than 1.4999999999999996.
    pub fn yield_gap(&self) -> Option<f64> {
        match (self.yield_rate, self.loan_constant) {
            (Some(y), Some(k)) => Some(((y - k) * GAP_PRECISION).round() / GAP_PRECISION),
            _ => None,
        }
    }
}

/// Scale used to round yield gaps before they are compared against bands.
pub const GAP_PRECISION: f64 = 1e9;

/// Coarse property category used to pick domain standards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyCategory {
    ResidentialMultifamily,
    Office,
    Retail,
    Industrial,
}

impl PropertyCategory {
    pub const ALL: [PropertyCategory; 4] = [
        PropertyCategory::ResidentialMultifamily,
        PropertyCategory::Office,
        PropertyCategory::Retail,
        PropertyCategory::Industrial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyCategory::ResidentialMultifamily => "residential-multifamily",
            PropertyCategory::Office => "office",
            PropertyCategory::Retail => "retail",
            PropertyCategory::Industrial => "industrial",
        }
    }

    pub fn to_label(&self) -> &'static str {
        match self {
            PropertyCategory::ResidentialMultifamily => "Residential (Multifamily)",
            PropertyCategory::Office => "Office",
            PropertyCategory::Retail => "Retail",
            PropertyCategory::Industrial => "Industrial",
        }
    }
}

/// Descriptive attributes of the property, extracted once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyAttributes {
    pub name: Option<String>,
    pub address: Option<String>,
    pub nearest_station: Option<String>,
    pub walk_minutes: Option<u32>,
    pub structure: Option<String>,
    pub age_years: Option<u32>,
    pub unit_count: Option<u32>,
    pub floor_area_sqm: Option<f64>,
    pub building_area_sqm: Option<f64>,
    pub land_area_sqm: Option<f64>,
    pub category: Option<PropertyCategory>,
    pub condition: Option<String>,
}

/// Kind of advisory finding raised while validating or analyzing metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    LeverageInconsistency,
    DebtCoverageOutOfRange,
    BreakEvenOutOfRange,
    LoanToValueOutOfRange,
    ExpenseRatioOutOfBand,
    LeverageEffectMismatch,
    IrrDidNotConverge,
}

/// Non-fatal finding attached to an analysis result. Never alters values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisWarning {
    pub code: WarningCode,
    pub message: String,
}

impl AnalysisWarning {
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// How an imputed value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationMethod {
    Formula,
    DomainEstimate,
    Projection,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Imputation {
    pub field: MetricField,
    pub method: ImputationMethod,
    pub value: f64,
}

/// Qualitative risk level shared by the analyzers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Unknown,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Unknown => "Unknown",
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

/// Letter grade used for both leverage and investment grading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}
