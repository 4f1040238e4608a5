use super::*;
use approx::assert_relative_eq;
use chrono::TimeZone;
use leverage_analysis::{LeverageStrength, LeverageType};
use metrics_validation::ConfidenceLevel;
use property_core::{Grade, MetricField, PropertyCategory, WarningCode};

const LISTING: &str = "\
物件名: グランメゾン中野
所在地: 東京都中野区中野3-1-1
交通: JR中央線「中野」駅 徒歩7分
種別: 一棟賃貸マンション
構造: RC造
築年数: 15年
総戸数: 30戸
物件価格: 2億円
満室想定年間賃料: 1,600万円
空室率: 5%
運営費: 400万円
借入金額: 1億4,000万円
金利: 1.5%
返済期間: 30年
保有期間: 10年
出口キャップレート: 6.0%
割引率: 5.0%
";

fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 9, 30, 0).unwrap()
}

fn analyze(text: &str) -> AnalysisResult {
    DealAnalysisEngine::default().analyze_at(text, None, fixed_time())
}

#[test]
fn test_fcr_and_k_only() {
    let result = analyze("FCR: 8.5%\nK%: 6.2%");
    assert_relative_eq!(result.leverage.yield_gap.unwrap(), 2.3, epsilon = 1e-9);
    assert_eq!(result.leverage.leverage_type, LeverageType::Positive);
    assert_eq!(result.leverage.grade, Some(Grade::A));
    assert_eq!(result.summary.leverage_grade, Some(Grade::A));
}

#[test]
fn test_yield_imputed_from_noi_and_price() {
    let result = analyze("NOI: 3,000,000円\n物件価格: 50,000,000円");
    assert_eq!(result.extracted.yield_rate, None);
    assert_relative_eq!(result.validated.yield_rate.unwrap(), 6.0, epsilon = 1e-9);
}

#[test]
fn test_low_dcr_scores_without_range_warning() {
    let result = analyze("DCR: 0.9");
    assert_eq!(result.validated.debt_coverage_ratio, Some(0.9));
    assert_eq!(result.leverage.stability_score, 30.0);
    assert!(!result
        .warnings
        .iter()
        .any(|w| w.code == WarningCode::DebtCoverageOutOfRange));
}

#[test]
fn test_bare_currency_figures() {
    let result = analyze("物件価格: 50,000");
    assert_relative_eq!(result.extracted.price.unwrap(), 50_000_000.0);
    let result = analyze("物件価格: 75,000,000");
    assert_relative_eq!(result.extracted.price.unwrap(), 75_000_000.0);
}

#[test]
fn test_injected_standards_drive_every_verdict() {
    let mut standards = DomainStandards::default();
    standards.dcr.excellent = 3.0;
    standards.dcr.good = 2.8;
    standards.dcr.acceptable = 2.6;
    standards.dcr.minimum = 2.5;
    let engine = DealAnalysisEngine::new(EngineConfig::default().with_standards(standards));
    let text = "DCR: 1.4\nBER: 70%\nNPV: 5,000,000円";

    let result = engine.analyze_at(text, None, fixed_time());
    assert_eq!(result.leverage.stability_score, 45.0);
    assert_eq!(result.valuation.investment_grade, Grade::C);
    assert_eq!(result.summary.investment_grade, Grade::C);

    let result = analyze(text);
    assert_eq!(result.valuation.investment_grade, Grade::A);
}

#[test]
fn test_loan_line_is_not_building_age() {
    let result = analyze("Mortgage: 30,000,000 yen\nEGI: 10,000,000 yen");
    assert_eq!(result.attributes.age_years, None);
    assert_eq!(result.risk.operational_risk, property_core::RiskLevel::Unknown);
}

#[test]
fn test_imputed_ltv_matches_loan_over_price() {
    let result = analyze("物件価格: 100,000,000円\n借入金額: 70,000,000円");
    let m = &result.validated;
    assert_eq!(result.extracted.loan_to_value, None);
    assert_relative_eq!(
        m.loan_to_value.unwrap(),
        m.loan_amount.unwrap() / m.price.unwrap() * 100.0,
        epsilon = 1e-9
    );
}

#[test]
fn test_gap_is_yield_minus_k() {
    let result = analyze("FCR: 7.7%\nK%: 6.2%");
    let m = &result.validated;
    assert_eq!(result.leverage.yield_gap, m.yield_gap());
    assert_relative_eq!(
        result.leverage.yield_gap.unwrap(),
        m.yield_rate.unwrap() - m.loan_constant.unwrap(),
        epsilon = 1e-9
    );
    assert_eq!(result.leverage.strength, LeverageStrength::Excellent);
}

#[test]
fn test_gap_band_edges_from_text() {
    let result = analyze("FCR: 4.6%\nK%: 3.1%");
    assert_eq!(result.leverage.yield_gap, Some(1.5));
    assert_eq!(result.leverage.strength, LeverageStrength::Excellent);
    assert_eq!(result.leverage.grade, Some(Grade::A));

    let result = analyze("FCR: 2.3%\nK%: 1.3%");
    assert_eq!(result.leverage.yield_gap, Some(1.0));
    assert_eq!(result.leverage.strength, LeverageStrength::Good);
    assert_eq!(result.leverage.grade, Some(Grade::B));

    let result = analyze("FCR: 3.7%\nK%: 3.2%");
    assert_eq!(result.leverage.grade, Some(Grade::C));
}

#[test]
fn test_full_listing() {
    let result = analyze(LISTING);
    let m = &result.validated;

    assert_eq!(result.attributes.name.as_deref(), Some("グランメゾン中野"));
    assert_eq!(result.attributes.category, Some(PropertyCategory::ResidentialMultifamily));
    assert_eq!(result.attributes.age_years, Some(15));

    assert_relative_eq!(m.price.unwrap(), 200_000_000.0);
    assert_relative_eq!(m.loan_amount.unwrap(), 140_000_000.0);
    assert_relative_eq!(m.loan_to_value.unwrap(), 70.0, epsilon = 1e-9);
    assert_relative_eq!(m.effective_gross_income.unwrap(), 15_200_000.0, epsilon = 1e-6);
    assert_relative_eq!(m.net_operating_income.unwrap(), 11_200_000.0, epsilon = 1e-6);
    assert_relative_eq!(m.yield_rate.unwrap(), 5.6, epsilon = 1e-9);
    assert_relative_eq!(m.loan_constant.unwrap(), 4.141, epsilon = 1e-2);
    assert!(m.debt_coverage_ratio.unwrap() > 1.9);
    assert_relative_eq!(m.terminal_value.unwrap(), 11_200_000.0 / 0.06, max_relative = 1e-9);

    assert!(m.levered_irr_before_tax.is_some());
    assert!(m.unlevered_irr_before_tax.is_some());
    assert!(m.net_present_value.is_some());
    assert!(result
        .imputations
        .iter()
        .any(|i| i.field == MetricField::LeveredIrrBeforeTax));

    assert_eq!(result.leverage.strength, LeverageStrength::Good);
    assert_relative_eq!(result.quality.completeness, 100.0, epsilon = 1e-9);
    assert_eq!(result.quality.confidence, ConfidenceLevel::High);

    for field in MetricField::ALL {
        if let Some(v) = m.get(*field) {
            assert!(v.is_finite(), "{} not finite", field.as_str());
        }
    }
}

#[test]
fn test_extracted_values_preserved() {
    let result = analyze(LISTING);
    for field in result.extracted.present_fields() {
        assert_eq!(result.validated.get(field), result.extracted.get(field));
    }
}

#[test]
fn test_markdown_is_idempotent() {
    let engine = DealAnalysisEngine::default();
    let result = engine.analyze_at(LISTING, None, fixed_time());
    let first = engine.render_markdown(&result);
    let second = engine.render_markdown(&result);
    assert_eq!(first, second);
    assert!(first.starts_with("# Investment Analysis: グランメゾン中野\n"));
    assert!(first.contains("## Key Metrics"));
    assert!(first.contains("- **Price:** ¥200,000,000"));
    assert!(first.contains("_Generated 2026-04-01 09:30 UTC by deal-engine/"));
}

#[test]
fn test_result_serializes() {
    let result = analyze(LISTING);
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["engine_version"], serde_json::json!(ENGINE_VERSION));
    assert_eq!(json["validated"]["price"], serde_json::json!(200_000_000.0));
    let back: AnalysisResult = serde_json::from_value(json).unwrap();
    assert_eq!(back.validated, result.validated);
    assert_eq!(back.created_at, fixed_time());
}

#[test]
fn test_empty_input() {
    let result = analyze("");
    assert!(result.extracted.is_empty());
    assert!(result.validated.is_empty());
    assert_eq!(result.leverage.strength, LeverageStrength::Unknown);
    assert_eq!(result.quality.confidence, ConfidenceLevel::Low);
    assert_eq!(result.quality.missing_critical.len(), 5);
}

#[test]
fn test_auxiliary_text_used() {
    let result = DealAnalysisEngine::default().analyze_at(
        "FCR: 8.5%",
        Some("K%: 6.2%"),
        fixed_time(),
    );
    assert_eq!(result.leverage.grade, Some(Grade::A));
}

#[test]
fn test_non_utf8_rejected() {
    let engine = DealAnalysisEngine::default();
    let err = engine.analyze_bytes(&[0x46, 0x43, 0xff, 0xfe], None).unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
    let err = engine
        .analyze_bytes(b"FCR: 8.5%", Some(&[0xc3, 0x28]))
        .unwrap_err();
    assert!(err.to_string().contains("auxiliary"));
    assert!(engine.analyze_bytes(b"FCR: 8.5%", None).is_ok());
}

#[test]
fn test_literal_scale_config() {
    let engine = DealAnalysisEngine::new(
        EngineConfig::default().with_currency_scale(metrics_extraction::CurrencyScale::Literal),
    );
    let result = engine.analyze_at("Purchase price: 2,400,000", None, fixed_time());
    assert_relative_eq!(result.validated.price.unwrap(), 2_400_000.0);
}
