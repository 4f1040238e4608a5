//! Numeric normalization for captured values.

use property_core::EngineError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How to read a bare currency figure that carries no unit suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrencyScale {
    /// Below 1,000 the figure is millions; below 1,000,000 it is thousands
    /// (the 千円 rent-roll convention); anything larger is already in yen.
    #[default]
    Heuristic,
    /// Take every figure at face value.
    Literal,
}

impl CurrencyScale {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            CurrencyScale::Literal => value,
            CurrencyScale::Heuristic => {
                let magnitude = value.abs();
                if magnitude < 1_000.0 {
                    value * 1_000_000.0
                } else if magnitude < 1_000_000.0 {
                    value * 1_000.0
                } else {
                    value
                }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CurrencyScale::Heuristic => "heuristic",
            CurrencyScale::Literal => "literal",
        }
    }
}

impl FromStr for CurrencyScale {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heuristic" | "auto" => Ok(CurrencyScale::Heuristic),
            "literal" | "none" => Ok(CurrencyScale::Literal),
            other => Err(EngineError::Config(format!(
                "unknown currency scale '{}' (expected heuristic or literal)",
                other
            ))),
        }
    }
}

/// Parse a captured number: strips thousands separators and currency glyphs,
/// folds full-width digits, and reads ▲/△ as a minus sign.
/// Returns `None` for anything that is not a finite number afterwards.
pub fn parse_number(raw: &str) -> Option<f64> {
    let mut cleaned = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        match c {
            ',' | '，' | '¥' | '￥' | '$' | ' ' | '\u{3000}' => {}
            '０'..='９' => {
                let digit = (c as u32 - '０' as u32) as u8;
                cleaned.push((b'0' + digit) as char);
            }
            '．' => cleaned.push('.'),
            '−' | '－' | '▲' | '△' => cleaned.push('-'),
            _ => cleaned.push(c),
        }
    }
    let value: f64 = cleaned.parse().ok()?;
    value.is_finite().then_some(value)
}

/// Multiplier for an explicit unit suffix, `None` when the suffix is not a scale
/// marker. Compound `X億Y万` suffixes are handled by [`normalize_currency`].
fn unit_multiplier(unit: &str) -> Option<f64> {
    let unit = unit.trim();
    let lower = unit.to_ascii_lowercase();
    if unit.starts_with('億') {
        Some(100_000_000.0)
    } else if unit.starts_with("百万") || lower == "million" || lower == "mil" || unit == "M" {
        Some(1_000_000.0)
    } else if unit.starts_with('万') {
        Some(10_000.0)
    } else if unit.starts_with('千') {
        Some(1_000.0)
    } else if unit == "円" || lower == "yen" || lower == "jpy" {
        Some(1.0)
    } else {
        None
    }
}

/// Value in base currency units for a captured number and optional unit suffix.
/// An explicit suffix always wins; bare figures go through `scale`.
pub fn normalize_currency(raw: &str, unit: Option<&str>, scale: CurrencyScale) -> Option<f64> {
    let value = parse_number(raw)?;
    let unit = unit.map(str::trim).filter(|u| !u.is_empty());

    let normalized = match unit {
        Some(u) if u.starts_with('億') && u.contains('万') => {
            // 1億2,000万円
            let rest: String = u
                .trim_start_matches('億')
                .split('万')
                .next()
                .unwrap_or_default()
                .to_string();
            let man = parse_number(&rest).unwrap_or(0.0);
            value * 100_000_000.0 + man * 10_000.0
        }
        Some(u) => match unit_multiplier(u) {
            Some(multiplier) => value * multiplier,
            None => scale.apply(value),
        },
        None => scale.apply(value),
    };

    normalized.is_finite().then_some(normalized)
}
