//! Pattern library: the ordered recognition table behind the extractor.
//!
//! Every metric maps to a prioritized list of label patterns (Japanese and
//! English). A pattern only describes the label; the separator and the numeric
//! tail are appended according to the metric's unit, so every pattern exposes a
//! `value` capture group and currency patterns an optional `unit` group.

use property_core::{EngineError, MetricField, MetricUnit, PropertyCategory};
use regex::Regex;
use std::sync::{Arc, LazyLock};

/// English label guarded so it cannot start in the middle of an ASCII word.
macro_rules! ascii_label {
    ($l:literal) => {
        concat!(r"(?m:^|[^A-Za-z0-9_])(?i:", $l, ")")
    };
}

/// Label that must open a line (optionally after a bullet or list number).
macro_rules! line_label {
    ($l:literal) => {
        concat!(r"(?m:^)[^\S\n]*(?:[-・*•]|\d+[.)])?[^\S\n]*\**(?i:", $l, ")")
    };
}

/// Between a label and its value: markdown emphasis, a short parenthetical,
/// a colon / equals / table pipe / は, and an "approximately" marker.
const SEPARATOR: &str = r"\**[^\S\n]*(?:[（(][^）)\n]{0,30}[）)])?\**[^\S\n]*(?:[:：=|]|は)?\**[^\S\n]*(?:約|(?i:approx\.?|about)[^\S\n]*)?";

const NUMBER: &str = r"[-−▲△]?\d[\d,，]*(?:[.．]\d+)?";

fn value_tail(unit: MetricUnit) -> String {
    match unit {
        MetricUnit::Percent => {
            format!(r"(?P<value>{NUMBER})[^\S\n]*(?:%|％|パーセント|(?i:percent))?")
        }
        MetricUnit::Ratio => format!(r"(?P<value>{NUMBER})[^\S\n]*(?:倍|x|×)?"),
        MetricUnit::Years => format!(r"(?P<value>{NUMBER})[^\S\n]*(?:年|(?i:years?|yrs?))?"),
        MetricUnit::Currency => format!(
            r"[¥￥$]?[^\S\n]*(?P<value>{NUMBER})(?:[^\S\n]*(?P<unit>億(?:[^\S\n]*\d[\d,，]*[^\S\n]*万)?円?|百万円?|万円?|千円?|円|(?i:million|mil|yen|jpy)\b|M\b))?"
        ),
    }
}

/// One label recognizer for one metric.
#[derive(Debug, Clone)]
pub struct FieldPattern {
    pub label: String,
    regex: Regex,
}

impl FieldPattern {
    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

/// The prioritized pattern list for a single metric.
#[derive(Debug, Clone)]
pub struct FieldPatterns {
    pub field: MetricField,
    patterns: Vec<FieldPattern>,
}

impl FieldPatterns {
    /// Compile `(label, label_regex)` pairs for `field`, in priority order.
    pub fn compile(field: MetricField, specs: &[(&str, &str)]) -> Result<Self, EngineError> {
        let tail = value_tail(field.unit());
        let patterns = specs
            .iter()
            .map(|(label, label_re)| {
                let source = format!("(?:{label_re}){SEPARATOR}{tail}");
                Regex::new(&source)
                    .map(|regex| FieldPattern {
                        label: label.to_string(),
                        regex,
                    })
                    .map_err(|source| EngineError::InvalidPattern {
                        field: field.as_str().to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { field, patterns })
    }

    pub fn patterns(&self) -> &[FieldPattern] {
        &self.patterns
    }
}

/// Keywords that mark a property category. Matched case-insensitively.
#[derive(Debug, Clone)]
pub struct CategoryKeywords {
    pub category: PropertyCategory,
    pub keywords: Vec<String>,
}

impl CategoryKeywords {
    pub fn new(category: PropertyCategory, keywords: &[&str]) -> Self {
        Self {
            category,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

/// Ordered, read-only recognition table shared by all extractions.
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    fields: Vec<FieldPatterns>,
    categories: Vec<CategoryKeywords>,
}

static STANDARD_LIBRARY: LazyLock<Arc<PatternLibrary>> = LazyLock::new(|| {
    Arc::new(PatternLibrary::build_standard().expect("built-in pattern library compiles"))
});

impl PatternLibrary {
    pub fn new(fields: Vec<FieldPatterns>, categories: Vec<CategoryKeywords>) -> Self {
        Self { fields, categories }
    }

    /// The built-in bilingual library, compiled once per process.
    pub fn standard() -> Arc<PatternLibrary> {
        Arc::clone(&STANDARD_LIBRARY)
    }

    pub fn fields(&self) -> &[FieldPatterns] {
        &self.fields
    }

    pub fn patterns_for(&self, field: MetricField) -> Option<&FieldPatterns> {
        self.fields.iter().find(|p| p.field == field)
    }

    pub fn categories(&self) -> &[CategoryKeywords] {
        &self.categories
    }

    fn build_standard() -> Result<Self, EngineError> {
        use MetricField::*;

        let table: Vec<(MetricField, Vec<(&str, &str)>)> = vec![
            (
                YieldRate,
                vec![
                    ("FCR", ascii_label!("FCR")),
                    ("総収益率", "総収益率"),
                    ("NOI利回り", "NOI利回り|ネット利回り|実質利回り"),
                    (
                        "yield rate",
                        ascii_label!(r"(?:net\s+)?yield\s+rate|net\s+yield|going[- ]in\s+cap(?:\s*rate)?"),
                    ),
                ],
            ),
            (
                LoanConstant,
                vec![
                    ("K%", ascii_label!(r"K[^\S\n]*[%％]")),
                    ("ローン定数", "ローン定数|ローンコンスタント|借入定数"),
                    ("loan constant", ascii_label!(r"(?:loan|mortgage)\s+constant")),
                ],
            ),
            (
                CashOnCashReturn,
                vec![
                    ("CCR", ascii_label!("CCR")),
                    ("自己資本配当率", "自己資本配当率|自己資金配当率|自己資金利回り"),
                    ("cash-on-cash", ascii_label!(r"cash[- ]on[- ]cash(?:\s+return)?")),
                ],
            ),
            (
                DebtCoverageRatio,
                vec![
                    ("DCR", ascii_label!("DS?CR")),
                    ("負債支払安全率", "負債支払安全率|返済余裕率"),
                    (
                        "debt coverage ratio",
                        ascii_label!(r"debt\s+(?:service\s+)?coverage(?:\s+ratio)?"),
                    ),
                ],
            ),
            (
                BreakEvenRatio,
                vec![
                    ("BER", ascii_label!("BER")),
                    ("損益分岐入居率", "損益分岐点?入居率|損益分岐点"),
                    (
                        "break-even ratio",
                        ascii_label!(r"break[- ]?even(?:\s+(?:ratio|occupancy))?"),
                    ),
                ],
            ),
            (
                LeveredIrrAfterTax,
                vec![
                    ("税引後IRR", "税引後(?:レバレッジ)?IRR|税引後内部収益率"),
                    ("after-tax IRR", ascii_label!(r"after[- ]tax\s+(?:levered\s+)?IRR")),
                ],
            ),
            (
                UnleveredIrrAfterTax,
                vec![
                    ("税引後アンレバードIRR", "税引後アンレバードIRR"),
                    ("after-tax unlevered IRR", ascii_label!(r"after[- ]tax\s+unlevered\s+IRR")),
                ],
            ),
            (
                UnleveredIrrBeforeTax,
                vec![
                    ("アンレバードIRR", "(?m:^|[^後])(?:税引前)?アンレバードIRR|物件IRR"),
                    ("before-tax unlevered IRR", ascii_label!(r"before[- ]tax\s+unlevered\s+IRR")),
                    ("unlevered IRR", line_label!(r"(?:unlevered|property)\s+IRR")),
                ],
            ),
            (
                LeveredIrrBeforeTax,
                vec![
                    ("税引前IRR", "税引前(?:レバレッジ)?IRR|税引前内部収益率"),
                    ("before-tax IRR", ascii_label!(r"before[- ]tax\s+(?:levered\s+)?IRR")),
                    ("levered IRR", line_label!(r"levered\s+IRR")),
                    ("IRR", line_label!(r"IRR|内部収益率")),
                ],
            ),
            (
                NetPresentValue,
                vec![
                    ("NPV", ascii_label!("NPV")),
                    ("正味現在価値", "正味現在価値"),
                    ("net present value", ascii_label!(r"net\s+present\s+value")),
                ],
            ),
            (
                DiscountRate,
                vec![
                    ("割引率", "割引率"),
                    ("discount rate", ascii_label!(r"discount\s+rate")),
                ],
            ),
            (
                Price,
                vec![
                    ("物件価格", "物件価格|販売価格|購入価格|取得価格|売買価格"),
                    ("purchase price", ascii_label!(r"(?:purchase|asking|acquisition)\s+price")),
                    ("価格", "(?m:^|[^却売転口])価格"),
                    ("price", line_label!("price")),
                ],
            ),
            (
                TotalInvestment,
                vec![
                    ("総投資額", "総投資額|総投資金額|総事業費"),
                    (
                        "total investment",
                        ascii_label!(r"total\s+(?:investment|project\s+cost|acquisition\s+cost)"),
                    ),
                ],
            ),
            (
                LoanAmount,
                vec![
                    ("借入金額", "借入金額|借入額|融資額|融資金額|ローン金額|借入金"),
                    ("loan amount", ascii_label!(r"(?:loan|mortgage|debt)\s+amount")),
                    ("loan", line_label!("loan")),
                ],
            ),
            (
                Equity,
                vec![
                    ("自己資金", "自己資金|自己資本|エクイティ|頭金"),
                    (
                        "equity",
                        ascii_label!(r"equity(?:\s+(?:investment|required|contribution))?|down\s+payment"),
                    ),
                ],
            ),
            (
                LoanToValue,
                vec![
                    ("LTV", ascii_label!("LTV")),
                    ("借入比率", "借入比率|融資比率|ローン比率"),
                    ("loan-to-value", ascii_label!(r"loan[- ]to[- ]value")),
                ],
            ),
            (
                GrossPotentialIncome,
                vec![
                    ("GPI", ascii_label!("GPI")),
                    ("潜在総収入", "潜在総収入|満室想定(?:年間)?(?:賃料|収入)|年間満室賃料"),
                    (
                        "gross potential income",
                        ascii_label!(r"gross\s+(?:potential|scheduled)\s+(?:income|rent)"),
                    ),
                ],
            ),
            (
                EffectiveGrossIncome,
                vec![
                    ("EGI", ascii_label!("EGI")),
                    ("実効総収入", "実効総収入|有効総収入|実収入"),
                    ("effective gross income", ascii_label!(r"effective\s+gross\s+income")),
                ],
            ),
            (
                NetOperatingIncome,
                vec![
                    ("NOI", ascii_label!("NOI")),
                    ("営業純利益", "営業純利益|純営業収益|純収益"),
                    ("net operating income", ascii_label!(r"net\s+operating\s+income")),
                ],
            ),
            (
                BeforeTaxCashFlow,
                vec![
                    ("BTCF", ascii_label!("BTCF")),
                    ("税引前キャッシュフロー", "税引前キャッシュ[・･]?フロー|税引前CF"),
                    ("before-tax cash flow", ascii_label!(r"(?:before|pre)[- ]tax\s+cash\s+flow")),
                    ("cash flow", line_label!(r"キャッシュ[・･]?フロー|cash\s+flow")),
                ],
            ),
            (
                AfterTaxCashFlow,
                vec![
                    ("ATCF", ascii_label!("ATCF")),
                    ("税引後キャッシュフロー", "税引後キャッシュ[・･]?フロー|税引後CF"),
                    ("after-tax cash flow", ascii_label!(r"after[- ]tax\s+cash\s+flow")),
                ],
            ),
            (
                OperatingExpenses,
                vec![
                    ("OPEX", ascii_label!("OPEX")),
                    ("運営費", "運営費用?|営業費用?|運営経費|諸経費"),
                    ("operating expenses", ascii_label!(r"operating\s+(?:expenses|costs)")),
                ],
            ),
            (
                OperatingExpenseRatio,
                vec![
                    ("OER", ascii_label!("OER")),
                    ("運営費率", "運営費率|経費率|営業費用?率|OPEX率"),
                    ("expense ratio", ascii_label!(r"(?:operating\s+)?expense\s+ratio")),
                ],
            ),
            (
                ManagementFee,
                vec![
                    ("管理委託費", "管理委託費|PM(?:フィー|費用?)|管理手数料"),
                    ("management fee", ascii_label!(r"(?:property\s+)?management\s+fees?")),
                    ("管理費", "管理費"),
                ],
            ),
            (
                CapitalReserve,
                vec![
                    ("修繕積立金", "大規模修繕積立金?|修繕積立金?|資本的支出"),
                    ("reserve", ascii_label!(r"(?:capital|replacement|repair)\s+reserves?|capex")),
                ],
            ),
            (
                InterestRate,
                vec![
                    ("金利", "借入金利|融資金利|金利"),
                    ("interest rate", ascii_label!(r"interest\s+rate|(?:loan|mortgage)\s+rate")),
                ],
            ),
            (
                LoanTerm,
                vec![
                    ("借入期間", "借入期間|融資期間|ローン期間"),
                    ("loan term", ascii_label!(r"loan\s+term|term\s+of\s+(?:the\s+)?loan")),
                ],
            ),
            (
                AmortizationPeriod,
                vec![
                    ("返済期間", "元利返済期間|返済期間|償還期間"),
                    ("amortization", ascii_label!(r"amorti[sz]ation(?:\s+period)?")),
                ],
            ),
            (
                AnnualDebtService,
                vec![
                    ("ADS", ascii_label!("ADS")),
                    ("年間返済額", "年間(?:元利)?返済額|年間ローン返済額?|元利返済額|年間返済"),
                    ("annual debt service", ascii_label!(r"(?:annual\s+)?debt\s+service")),
                ],
            ),
            (
                MarketCapRate,
                vec![
                    (
                        "市場キャップレート",
                        "市場(?:キャップ[・･]?レート|還元利回り|利回り)|エリア(?:キャップ[・･]?レート|利回り)",
                    ),
                    ("market cap rate", ascii_label!(r"market\s+cap(?:italization)?\s*rate")),
                    ("還元利回り", "(?m:^|[^後時口])還元利回り"),
                ],
            ),
            (
                MarketVacancyRate,
                vec![
                    ("市場空室率", "市場空室率|エリア空室率"),
                    (
                        "market vacancy",
                        ascii_label!(r"(?:market|submarket|area)\s+vacancy(?:\s+rate)?"),
                    ),
                ],
            ),
            (
                VacancyRate,
                vec![
                    ("空室率", "(?m:^|[^場ア])空室率|想定空室率"),
                    (
                        "vacancy rate",
                        line_label!(r"(?:physical\s+|economic\s+)?vacancy(?:\s+(?:rate|loss))?"),
                    ),
                ],
            ),
            (
                HoldingPeriod,
                vec![
                    ("保有期間", "保有期間|運用期間|投資期間"),
                    ("holding period", ascii_label!(r"hold(?:ing)?\s+period|investment\s+horizon")),
                ],
            ),
            (
                ExitCapRate,
                vec![
                    (
                        "出口キャップレート",
                        "出口(?:キャップ[・･]?レート|利回り)|売却時(?:キャップ[・･]?レート|還元利回り|利回り)|ターミナル[・･]?キャップ[・･]?レート",
                    ),
                    (
                        "exit cap rate",
                        ascii_label!(r"(?:exit|terminal|reversion(?:ary)?)\s+cap(?:italization)?(?:\s*rate)?"),
                    ),
                ],
            ),
            (
                TerminalValue,
                vec![
                    ("売却価格", "(?:想定)?売却価格|転売価格|出口価格|売却想定額"),
                    (
                        "terminal value",
                        ascii_label!(r"(?:terminal|reversion|exit|resale)\s+(?:value|price)"),
                    ),
                ],
            ),
            (
                Depreciation,
                vec![
                    ("減価償却費", "減価償却費?"),
                    ("depreciation", ascii_label!(r"depreciation(?:\s+expense)?")),
                ],
            ),
            (
                TaxRate,
                vec![
                    ("税率", "(?:実効|所得|法人)?税率"),
                    (
                        "tax rate",
                        ascii_label!(r"(?:effective\s+|income\s+|marginal\s+)?tax\s+rate"),
                    ),
                ],
            ),
        ];

        let fields = table
            .into_iter()
            .map(|(field, specs)| FieldPatterns::compile(field, &specs))
            .collect::<Result<Vec<_>, _>>()?;

        let categories = vec![
            CategoryKeywords::new(
                PropertyCategory::ResidentialMultifamily,
                &[
                    "マンション",
                    "アパート",
                    "共同住宅",
                    "賃貸住宅",
                    "レジデンス",
                    "multifamily",
                    "multi-family",
                    "apartment",
                    "residential",
                    "condominium",
                ],
            ),
            CategoryKeywords::new(PropertyCategory::Office, &["オフィス", "事務所", "office"]),
            CategoryKeywords::new(
                PropertyCategory::Retail,
                &[
                    "店舗",
                    "商業",
                    "ショッピング",
                    "retail",
                    "shopping",
                    "storefront",
                ],
            ),
            CategoryKeywords::new(
                PropertyCategory::Industrial,
                &[
                    "倉庫",
                    "工場",
                    "物流",
                    "industrial",
                    "warehouse",
                    "logistics",
                    "factory",
                ],
            ),
        ];

        Ok(Self::new(fields, categories))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_value(field: MetricField, text: &str) -> Option<String> {
        let library = PatternLibrary::standard();
        library.patterns_for(field)?.patterns().iter().find_map(|p| {
            p.regex()
                .captures(text)
                .and_then(|c| c.name("value"))
                .map(|m| m.as_str().to_string())
        })
    }

    #[test]
    fn test_standard_library_covers_every_field() {
        let library = PatternLibrary::standard();
        for field in MetricField::ALL {
            assert!(
                library.patterns_for(*field).is_some(),
                "missing patterns for {}",
                field.as_str()
            );
        }
    }

    #[test]
    fn test_bilingual_yield_labels() {
        assert_eq!(first_value(MetricField::YieldRate, "FCR: 8.5%").as_deref(), Some("8.5"));
        assert_eq!(
            first_value(MetricField::YieldRate, "総収益率：７．２％").as_deref(),
            Some("７．２")
        );
        assert_eq!(
            first_value(MetricField::YieldRate, "Net yield rate = 6.1%").as_deref(),
            Some("6.1")
        );
    }

    #[test]
    fn test_loan_constant_k_percent() {
        assert_eq!(
            first_value(MetricField::LoanConstant, "K%: 6.2%").as_deref(),
            Some("6.2")
        );
        assert_eq!(
            first_value(MetricField::LoanConstant, "ローン定数 5.1%").as_deref(),
            Some("5.1")
        );
    }

    #[test]
    fn test_label_inside_word_does_not_match() {
        assert_eq!(first_value(MetricField::CashOnCashReturn, "XCCR: 4%"), None);
        // "NOI利回り" is a yield, not an income figure
        assert_eq!(first_value(MetricField::NetOperatingIncome, "NOI利回り: 6%"), None);
    }

    #[test]
    fn test_parenthetical_and_markdown_separators() {
        assert_eq!(
            first_value(MetricField::YieldRate, "**FCR（総収益率）**: 8.0%").as_deref(),
            Some("8.0")
        );
        assert_eq!(
            first_value(MetricField::DebtCoverageRatio, "| DSCR | 1.35倍 |").as_deref(),
            Some("1.35")
        );
    }

    #[test]
    fn test_sale_price_is_not_purchase_price() {
        assert_eq!(first_value(MetricField::Price, "売却価格: 6,000万円"), None);
        assert_eq!(
            first_value(MetricField::TerminalValue, "売却価格: 6,000万円").as_deref(),
            Some("6,000")
        );
    }

    #[test]
    fn test_unlevered_irr_not_taken_as_levered() {
        let text = "Unlevered IRR: 5.5%";
        assert_eq!(first_value(MetricField::LeveredIrrBeforeTax, text), None);
        assert_eq!(
            first_value(MetricField::UnleveredIrrBeforeTax, text).as_deref(),
            Some("5.5")
        );
    }

    #[test]
    fn test_invalid_custom_pattern_is_an_error() {
        let err = FieldPatterns::compile(MetricField::Price, &[("broken", "(")]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidPattern { .. }));
    }
}
