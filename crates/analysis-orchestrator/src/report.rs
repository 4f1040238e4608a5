//! Markdown rendering of an [`AnalysisResult`].
//!
//! Pure formatting: every number shown is read from the result, and the same
//! result always renders to the same bytes.

use crate::AnalysisResult;
use property_core::{DomainStandards, ImputationMethod, MetricField, MetricRecord, MetricUnit};

/// `¥50,000,000`; negatives as `-¥1,200`.
pub fn format_yen(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0.0 {
        format!("-¥{}", grouped)
    } else {
        format!("¥{}", grouped)
    }
}

fn format_value(field: MetricField, value: f64) -> String {
    match field.unit() {
        MetricUnit::Percent => format!("{:.2}%", value),
        MetricUnit::Ratio => format!("{:.2}x", value),
        MetricUnit::Currency => format_yen(value),
        MetricUnit::Years => format!("{:.0} years", value),
    }
}

fn display(metrics: &MetricRecord, field: MetricField) -> String {
    metrics
        .get(field)
        .map(|v| format_value(field, v))
        .unwrap_or_else(|| "n/a".to_string())
}

fn dcr_qualifier(dcr: f64, standards: &DomainStandards) -> &'static str {
    match dcr {
        d if d >= standards.dcr.excellent => "excellent",
        d if d >= standards.dcr.good => "good",
        d if d >= standards.dcr.acceptable => "acceptable",
        d if d >= standards.dcr.minimum => "at lender minimum",
        _ => "below lender minimum",
    }
}

fn ber_qualifier(ber: f64, standards: &DomainStandards) -> &'static str {
    match ber {
        b if b <= standards.ber.excellent => "excellent",
        b if b <= standards.ber.good => "good",
        b if b <= standards.ber.acceptable => "acceptable",
        b if b <= standards.ber.marginal => "marginal",
        _ => "high risk",
    }
}

fn metric_line(label: &str, value: String, qualifier: Option<&str>) -> String {
    match qualifier {
        Some(q) => format!("- **{}:** {} ({})", label, value, q),
        None => format!("- **{}:** {}", label, value),
    }
}

fn method_label(method: ImputationMethod) -> &'static str {
    match method {
        ImputationMethod::Formula => "formula",
        ImputationMethod::DomainEstimate => "domain estimate",
        ImputationMethod::Projection => "projection",
    }
}

fn push_list(lines: &mut Vec<String>, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    lines.push(format!("## {}", heading));
    lines.push(String::new());
    lines.extend(items.iter().map(|item| format!("- {}", item)));
    lines.push(String::new());
}

pub fn render_markdown(result: &AnalysisResult, standards: &DomainStandards) -> String {
    let m = &result.validated;
    let attrs = &result.attributes;
    let summary = &result.summary;
    let mut lines = Vec::new();

    let title = attrs.name.as_deref().unwrap_or("Subject Property");
    lines.push(format!("# Investment Analysis: {}", title));
    lines.push(String::new());
    lines.push(format!("**{}**", summary.headline));
    lines.push(String::new());
    lines.push(format!(
        "- **Investment grade:** {} ({})",
        summary.investment_grade.as_str(),
        result.valuation.recommendation.to_label()
    ));
    lines.push(format!(
        "- **Leverage grade:** {}",
        summary.leverage_grade.map(|g| g.as_str()).unwrap_or("n/a")
    ));
    lines.push(format!("- **Overall risk:** {}", summary.overall_risk.as_str()));
    lines.push(String::new());

    let mut property = Vec::new();
    if let Some(category) = attrs.category {
        property.push(metric_line("Type", category.to_label().to_string(), None));
    }
    if let Some(address) = &attrs.address {
        property.push(metric_line("Address", address.clone(), None));
    }
    if let Some(station) = &attrs.nearest_station {
        let walk = attrs
            .walk_minutes
            .map(|w| format!(", {} min walk", w))
            .unwrap_or_default();
        property.push(metric_line("Nearest station", format!("{}{}", station, walk), None));
    }
    if let Some(structure) = &attrs.structure {
        property.push(metric_line("Structure", structure.clone(), None));
    }
    if let Some(age) = attrs.age_years {
        property.push(metric_line("Age", format!("{} years", age), None));
    }
    if let Some(units) = attrs.unit_count {
        property.push(metric_line("Units", units.to_string(), None));
    }
    if let Some(area) = attrs.floor_area_sqm {
        property.push(metric_line("Floor area", format!("{:.2} m²", area), None));
    }
    if !property.is_empty() {
        lines.push("## Property".to_string());
        lines.push(String::new());
        lines.extend(property);
        lines.push(String::new());
    }

    lines.push("## Key Metrics".to_string());
    lines.push(String::new());
    for (label, field) in [
        ("Price", MetricField::Price),
        ("Net operating income", MetricField::NetOperatingIncome),
        ("Loan amount", MetricField::LoanAmount),
        ("Equity", MetricField::Equity),
        ("Annual debt service", MetricField::AnnualDebtService),
        ("Yield rate (FCR)", MetricField::YieldRate),
        ("Loan constant (K%)", MetricField::LoanConstant),
        ("Cash-on-cash return (CCR)", MetricField::CashOnCashReturn),
        ("Loan-to-value", MetricField::LoanToValue),
    ] {
        lines.push(metric_line(label, display(m, field), None));
    }
    lines.push(metric_line(
        "Debt coverage ratio (DCR)",
        display(m, MetricField::DebtCoverageRatio),
        m.debt_coverage_ratio.map(|d| dcr_qualifier(d, standards)),
    ));
    lines.push(metric_line(
        "Break-even ratio (BER)",
        display(m, MetricField::BreakEvenRatio),
        m.break_even_ratio.map(|b| ber_qualifier(b, standards)),
    ));
    lines.push(String::new());

    let leverage = &result.leverage;
    lines.push("## Leverage".to_string());
    lines.push(String::new());
    lines.push(metric_line(
        "Yield gap",
        leverage
            .yield_gap
            .map(|g| format!("{:+.2}pt", g))
            .unwrap_or_else(|| "n/a".to_string()),
        Some(leverage.strength.as_str()),
    ));
    lines.push(metric_line("Leverage type", leverage.leverage_type.as_str().to_string(), None));
    if let Some(effect) = leverage.leverage_effect {
        lines.push(metric_line("Leverage effect", format!("{:+.2}pt", effect), None));
    }
    lines.push(metric_line(
        "Stability score",
        format!("{:.0}/100", leverage.stability_score),
        None,
    ));
    lines.push(String::new());
    lines.push(leverage.recommendation.clone());
    lines.push(String::new());

    let irr = &result.irr;
    if irr.levered_irr.is_some() || irr.unlevered_irr.is_some() || m.net_present_value.is_some() {
        lines.push("## Returns".to_string());
        lines.push(String::new());
        lines.push(metric_line(
            "Levered IRR (before tax)",
            display(m, MetricField::LeveredIrrBeforeTax),
            (irr.status != leverage_analysis::IrrBenchmarkStatus::Unknown)
                .then(|| irr.status.as_str()),
        ));
        lines.push(metric_line(
            "Unlevered IRR (before tax)",
            display(m, MetricField::UnleveredIrrBeforeTax),
            None,
        ));
        if m.levered_irr_after_tax.is_some() {
            lines.push(metric_line(
                "Levered IRR (after tax)",
                display(m, MetricField::LeveredIrrAfterTax),
                None,
            ));
        }
        lines.push(metric_line(
            "Net present value",
            display(m, MetricField::NetPresentValue),
            result.valuation.net_present_value.map(|_| {
                if result.valuation.value_creation {
                    "creates value"
                } else {
                    "does not create value"
                }
            }),
        ));
        lines.push(String::new());
        lines.push(irr.commentary.clone());
        lines.push(String::new());
    }

    let risk = &result.risk;
    lines.push("## Risk".to_string());
    lines.push(String::new());
    lines.push(metric_line("Leverage", risk.leverage_risk.as_str().to_string(), None));
    lines.push(metric_line("Market", risk.market_risk.as_str().to_string(), None));
    lines.push(metric_line("Operational", risk.operational_risk.as_str().to_string(), None));
    lines.push(metric_line("Financial", risk.financial_risk.as_str().to_string(), None));
    lines.push(String::new());

    push_list(&mut lines, "Strengths", &summary.strengths);
    push_list(&mut lines, "Concerns", &summary.concerns);

    lines.push("## Recommendation".to_string());
    lines.push(String::new());
    lines.push(summary.recommendation.clone());
    lines.push(String::new());

    let quality = &result.quality;
    lines.push("## Data Quality".to_string());
    lines.push(String::new());
    lines.push(metric_line(
        "Completeness",
        format!("{:.0}%", quality.completeness),
        Some(quality.confidence.as_str()),
    ));
    if !quality.missing_critical.is_empty() {
        lines.push(metric_line("Missing", quality.missing_critical.join(", "), None));
    }
    lines.push(String::new());

    let imputed: Vec<String> = result
        .imputations
        .iter()
        .map(|i| {
            format!(
                "{}: {} ({})",
                i.field.as_str(),
                format_value(i.field, i.value),
                method_label(i.method)
            )
        })
        .collect();
    push_list(&mut lines, "Imputed Values", &imputed);

    let warnings: Vec<String> = result.warnings.iter().map(|w| w.message.clone()).collect();
    push_list(&mut lines, "Warnings", &warnings);

    lines.push(format!(
        "_Generated {} by {}_",
        result.created_at.format("%Y-%m-%d %H:%M UTC"),
        result.engine_version
    ));
    lines.push(String::new());

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use property_core::PropertyCategory;

    #[test]
    fn test_format_yen_grouping() {
        assert_eq!(format_yen(50_000_000.0), "¥50,000,000");
        assert_eq!(format_yen(999.4), "¥999");
        assert_eq!(format_yen(1_000.0), "¥1,000");
        assert_eq!(format_yen(-1_200.0), "-¥1,200");
        assert_eq!(format_yen(0.0), "¥0");
    }

    #[test]
    fn test_qualifiers_follow_bands() {
        let standards = DomainStandards::default();
        assert_eq!(dcr_qualifier(1.5, &standards), "excellent");
        assert_eq!(dcr_qualifier(1.2, &standards), "at lender minimum");
        assert_eq!(dcr_qualifier(0.9, &standards), "below lender minimum");
        assert_eq!(ber_qualifier(60.0, &standards), "excellent");
        assert_eq!(ber_qualifier(91.0, &standards), "high risk");
    }

    #[test]
    fn test_value_formatting_by_unit() {
        assert_eq!(format_value(MetricField::YieldRate, 8.5), "8.50%");
        assert_eq!(format_value(MetricField::DebtCoverageRatio, 1.234), "1.23x");
        assert_eq!(format_value(MetricField::HoldingPeriod, 10.0), "10 years");
        assert_eq!(
            display(&MetricRecord::new(), MetricField::Price),
            "n/a"
        );
    }

    #[test]
    fn test_metric_line_bold() {
        assert_eq!(
            metric_line("Type", PropertyCategory::Office.to_label().to_string(), None),
            "- **Type:** Office"
        );
        assert_eq!(
            metric_line("DCR", "1.40x".to_string(), Some("good")),
            "- **DCR:** 1.40x (good)"
        );
    }
}
