//! Property attribute extraction and category inference.

use crate::normalize::parse_number;
use crate::patterns::PatternLibrary;
use property_core::{PropertyAttributes, PropertyCategory};
use regex::Regex;
use std::sync::LazyLock;

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("built-in attribute pattern compiles"))
        .collect()
}

static NAME: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?m)^[^\S\n]*\**(?:物件名称?|建物名)\**[^\S\n]*[:：]\**[^\S\n]*(?P<value>[^\n]+)",
        r"(?mi)^[^\S\n]*\**(?:property|building)\s+name\**[^\S\n]*[:：]\**[^\S\n]*(?P<value>[^\n]+)",
    ])
});

static ADDRESS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?m)^[^\S\n]*\**(?:所在地|住所|物件所在地)\**[^\S\n]*[:：]\**[^\S\n]*(?P<value>[^\n]+)",
        r"(?mi)^[^\S\n]*\**(?:address|location)\**[^\S\n]*[:：]\**[^\S\n]*(?P<value>[^\n]+)",
    ])
});

static STATION: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"最寄り?駅[^\S\n]*[:：]?[^\S\n]*[「『]?(?P<value>[^\s「」『』、,:：]+?)[」』]?駅",
        r"最寄り?駅[^\S\n]*[:：][^\S\n]*(?P<value>[^\s、,]+)",
        r"[「『]?(?P<value>[^\s「」『』、,:：]+?)[」』]?駅[^\S\n]*(?:から)?[^\S\n]*徒歩",
        r"(?i)nearest\s+station[^\S\n]*[:：][^\S\n]*(?P<value>[^\n,(]+?)(?:\s+station)?\s*(?:[,(]|$)",
    ])
});

static WALK: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"徒歩[^\S\n]*(?:約)?[^\S\n]*(?P<value>\d+)[^\S\n]*分",
        r"(?i)(?P<value>\d+)[^\S\n]*(?:-|\s)?min(?:ute)?s?\.?\s+walk",
        r"(?i)walk(?:ing)?\s*(?:time)?[^\S\n]*[:：][^\S\n]*(?P<value>\d+)",
    ])
});

static STRUCTURE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?m)(?:構造|建物構造)[^\S\n]*[:：][^\S\n]*(?P<value>[^\n、,]+)",
        r"(?P<value>SRC造|RC造|鉄骨鉄筋コンクリート造?|鉄筋コンクリート造?|重量鉄骨造?|軽量鉄骨造?|鉄骨造|S造|木造)",
        r"(?mi)^[^\S\n]*\**(?:building\s+)?structure\**[^\S\n]*[:：][^\S\n]*(?P<value>[^\n,]+)",
        r"(?i)(?P<value>reinforced\s+concrete|steel[- ]reinforced\s+concrete|steel\s+frame|wood(?:en)?\s+frame)",
    ])
});

static AGE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"築年数[^\S\n]*[:：]?[^\S\n]*(?P<value>\d+)",
        r"築[^\S\n]*(?P<value>\d+)[^\S\n]*年",
        r"(?i)\b(?:building\s+)?age\b[^\S\n]*[:：][^\S\n]*(?P<value>\d+)",
        r"(?i)(?P<value>\d+)[^\S\n]*(?:-|\s)?years?\s+old",
    ])
});

static UNITS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?:総戸数|戸数|総区画数)[^\S\n]*[:：]?[^\S\n]*(?P<value>\d+)",
        r"(?P<value>\d+)[^\S\n]*戸",
        r"(?i)\b(?:number\s+of\s+)?units\b[^\S\n]*[:：][^\S\n]*(?P<value>\d+)",
        r"(?i)(?P<value>\d+)[^\S\n]*(?:-|\s)?units?\b",
    ])
});

const AREA_TAIL: &str = r"[^\S\n]*(?:約)?[^\S\n]*(?P<value>\d[\d,，]*(?:[.．]\d+)?)[^\S\n]*(?:㎡|m2|m²|平米|sqm)";

fn area_patterns(labels: &[&str]) -> Vec<Regex> {
    labels
        .iter()
        .map(|label| {
            Regex::new(&format!("(?:{label})[^\\S\\n]*[:：]?{AREA_TAIL}"))
                .expect("built-in area pattern compiles")
        })
        .collect()
}

static FLOOR_AREA: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    area_patterns(&[
        "延床面積|延べ床面積|延面積",
        r"(?i)(?:total\s+)?floor\s+area|gross\s+floor\s+area",
    ])
});

static BUILDING_AREA: LazyLock<Vec<Regex>> =
    LazyLock::new(|| area_patterns(&["建築面積", r"(?i)building\s+(?:footprint|area)"]));

static LAND_AREA: LazyLock<Vec<Regex>> =
    LazyLock::new(|| area_patterns(&["土地面積|敷地面積", r"(?i)(?:land|lot|site)\s+area"]));

static CONDITION: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?m)(?:状態|現況|建物状態)[^\S\n]*[:：][^\S\n]*(?P<value>[^\n]+)",
        r"(?mi)^[^\S\n]*\**(?:(?:building|property)\s+)?condition\**[^\S\n]*[:：][^\S\n]*(?P<value>[^\n]+)",
    ])
});

/// First capture across patterns (priority order) and sources.
fn first_capture(patterns: &[Regex], sources: &[&str]) -> Option<String> {
    patterns.iter().find_map(|re| {
        sources.iter().find_map(|src| {
            re.captures(src)
                .and_then(|c| c.name("value"))
                .map(|m| m.as_str().trim().trim_matches('*').trim().to_string())
                .filter(|v| !v.is_empty())
        })
    })
}

fn first_number<T>(
    patterns: &[Regex],
    sources: &[&str],
    convert: fn(f64) -> Option<T>,
) -> Option<T> {
    patterns.iter().find_map(|re| {
        sources.iter().find_map(|src| {
            re.captures_iter(src).find_map(|c| {
                let raw = c.name("value")?.as_str();
                parse_number(raw).and_then(convert)
            })
        })
    })
}

fn to_count(v: f64) -> Option<u32> {
    (v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64).then_some(v as u32)
}

fn to_area(v: f64) -> Option<f64> {
    (v > 0.0).then_some(v)
}

/// Category from the first keyword group with any keyword present in the text.
pub fn infer_category(sources: &[&str], library: &PatternLibrary) -> Option<PropertyCategory> {
    let lowered: Vec<String> = sources.iter().map(|s| s.to_lowercase()).collect();
    library
        .categories()
        .iter()
        .find(|group| {
            group
                .keywords
                .iter()
                .any(|k| lowered.iter().any(|text| text.contains(k.as_str())))
        })
        .map(|group| group.category)
}

pub fn extract_attributes(sources: &[&str], library: &PatternLibrary) -> PropertyAttributes {
    PropertyAttributes {
        name: first_capture(&NAME, sources),
        address: first_capture(&ADDRESS, sources),
        nearest_station: first_capture(&STATION, sources),
        walk_minutes: first_number(&WALK, sources, to_count),
        structure: first_capture(&STRUCTURE, sources),
        age_years: first_number(&AGE, sources, to_count),
        unit_count: first_number(&UNITS, sources, to_count),
        floor_area_sqm: first_number(&FLOOR_AREA, sources, to_area),
        building_area_sqm: first_number(&BUILDING_AREA, sources, to_area),
        land_area_sqm: first_number(&LAND_AREA, sources, to_area),
        category: infer_category(sources, library),
        condition: first_capture(&CONDITION, sources),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(text: &str) -> PropertyAttributes {
        extract_attributes(&[text], &PatternLibrary::standard())
    }

    #[test]
    fn test_japanese_listing_attributes() {
        let text = "\
物件名: サンプルレジデンス目黒
所在地: 東京都目黒区目黒1-2-3
交通: JR山手線「目黒」駅 徒歩5分
構造: RC造
築年数: 12年
総戸数: 24戸
延床面積: 1,250.5㎡
土地面積: 420㎡
状態: 良好";
        let a = attrs(text);
        assert_eq!(a.name.as_deref(), Some("サンプルレジデンス目黒"));
        assert_eq!(a.address.as_deref(), Some("東京都目黒区目黒1-2-3"));
        assert_eq!(a.nearest_station.as_deref(), Some("目黒"));
        assert_eq!(a.walk_minutes, Some(5));
        assert_eq!(a.structure.as_deref(), Some("RC造"));
        assert_eq!(a.age_years, Some(12));
        assert_eq!(a.unit_count, Some(24));
        assert_eq!(a.floor_area_sqm, Some(1250.5));
        assert_eq!(a.land_area_sqm, Some(420.0));
        assert_eq!(a.condition.as_deref(), Some("良好"));
        assert_eq!(a.category, Some(PropertyCategory::ResidentialMultifamily));
    }

    #[test]
    fn test_english_listing_attributes() {
        let text = "\
Property name: Harbor View Offices
Address: 100 Main St, Springfield
Nearest station: Central (4 min walk)
Building age: 30
Units: 12
Floor area: 2,400 m2
Condition: needs roof work";
        let a = attrs(text);
        assert_eq!(a.name.as_deref(), Some("Harbor View Offices"));
        assert_eq!(a.nearest_station.as_deref(), Some("Central"));
        assert_eq!(a.walk_minutes, Some(4));
        assert_eq!(a.age_years, Some(30));
        assert_eq!(a.unit_count, Some(12));
        assert_eq!(a.floor_area_sqm, Some(2400.0));
        assert_eq!(a.condition.as_deref(), Some("needs roof work"));
        assert_eq!(a.category, Some(PropertyCategory::Office));
    }

    #[test]
    fn test_category_first_group_wins() {
        // multifamily keywords are checked before retail ones
        let library = PatternLibrary::standard();
        assert_eq!(
            infer_category(&["1階店舗・2階以上アパート"], &library),
            Some(PropertyCategory::ResidentialMultifamily)
        );
        assert_eq!(
            infer_category(&["Distribution WAREHOUSE near port"], &library),
            Some(PropertyCategory::Industrial)
        );
        assert_eq!(infer_category(&["vacant lot"], &library), None);
    }

    #[test]
    fn test_labels_inside_other_words_ignored() {
        let a = attrs(
            "Mortgage: 30,000,000 yen\n\
             Average: 12\n\
             Subunits: 4\n\
             Market condition: soft\n\
             Capital structure: 70% debt",
        );
        assert_eq!(a.age_years, None);
        assert_eq!(a.unit_count, None);
        assert_eq!(a.condition, None);
        assert_eq!(a.structure, None);

        let a = attrs("Brokerage: 3%\nAge: 8 \nProperty condition: good");
        assert_eq!(a.age_years, Some(8));
        assert_eq!(a.condition.as_deref(), Some("good"));
    }

    #[test]
    fn test_missing_attributes_stay_unset() {
        let a = attrs("FCR: 8.5%");
        assert_eq!(a, PropertyAttributes::default());
    }
}
