use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use super::values::normalize_key;
use crate::catalog::extract::parse_grade;
use crate::catalog::Product;
use crate::model::Stage;

/// An N-P-K grade such as `14-14-14` or `46 - 0 - 0`.
pub(crate) static GRADE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})\s*-\s*(\d{1,2})\s*-\s*(\d{1,2})\b").expect("valid grade regex")
});

/// Canonical `N-P-K` text of the first grade in `text`.
pub fn find_grade(text: &str) -> Option<String> {
    let caps = GRADE.captures(text)?;
    let part = |i: usize| caps.get(i).map(|m| m.as_str().trim_start_matches('0')).unwrap_or("");
    let digits = |s: &str| if s.is_empty() { "0".to_string() } else { s.to_string() };
    Some(format!("{}-{}-{}", digits(part(1)), digits(part(2)), digits(part(3))))
}

/// Map a stage key from a historical record to a [`Stage`].
///
/// Known aliases are matched on the normalized key (`saPagtanim`,
/// `sa_pagtanim` and `Sa Pagtanim` are the same key). Anything else falls
/// back to keyword detection.
pub fn stage_from_key(key: &str) -> Option<Stage> {
    STAGE_ALIASES
        .get(normalize_key(key).as_str())
        .copied()
        .or_else(|| detect_stage(key))
}

/// Detect a stage from keywords in free text.
///
/// Grades are removed first so `0-0-60` does not read as a top dress.
pub fn detect_stage(text: &str) -> Option<Stage> {
    let lower = GRADE.replace_all(&text.to_lowercase(), " ").into_owned();
    let tokens: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    let has_token = |t: &str| tokens.iter().any(|x| *x == t);
    let contains_any = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if contains_any(&["organic", "organiko"]) {
        Some(Stage::Organic)
    } else if contains_any(&["top dress", "topdress", "top-dress", "ika-60", "ika 60", "60 days"])
        || has_token("dbh")
    {
        Some(Stage::TopDress)
    } else if contains_any(&[
        "after30", "after 30", "ika 30", "ika-30", "30 dat", "30dat", "30 days", "30 araw",
    ]) {
        Some(Stage::After30Dat)
    } else if contains_any(&["basal", "pagtanim", "planting"]) {
        Some(Stage::Basal)
    } else if has_token("60") {
        Some(Stage::TopDress)
    } else if has_token("30") {
        Some(Stage::After30Dat)
    } else {
        None
    }
}

static STAGE_ALIASES: LazyLock<HashMap<&'static str, Stage>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    for key in ["organic", "organicfertilizer", "organiko", "organikongpataba", "abonoorganiko"] {
        m.insert(key, Stage::Organic);
    }
    for key in [
        "basal",
        "sapagtanim",
        "pagtanim",
        "atplanting",
        "planting",
        "basalapplication",
        "basalfertilizer",
    ] {
        m.insert(key, Stage::Basal);
    }
    for key in [
        "after30",
        "after30dat",
        "after30days",
        "ika30",
        "ika30araw",
        "30dat",
        "30days",
        "dat30",
    ] {
        m.insert(key, Stage::After30Dat);
    }
    for key in [
        "topdress",
        "topdressing",
        "after60",
        "after60dat",
        "60dat",
        "ika60",
        "ika60araw",
        "dbh",
        "panicleinitiation",
    ] {
        m.insert(key, Stage::TopDress);
    }

    m
});

/// Turns product names from historical records into product codes.
///
/// Without a catalog: a code in trailing parentheses (`Urea (46-0-0)`)
/// wins, then an N-P-K grade anywhere in the name, then the name itself.
/// With a catalog the same candidates are first matched against product
/// codes and labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeResolver<'a> {
    products: &'a [Product],
}

impl<'a> CodeResolver<'a> {
    pub fn new(products: &'a [Product]) -> Self {
        Self { products }
    }

    pub fn resolve(&self, raw: &str) -> Option<String> {
        let name = collapse_whitespace(raw.trim_matches(|c: char| {
            c.is_whitespace() || matches!(c, ':' | '-' | '|' | '*' | '•')
        }));
        if name.is_empty() {
            return None;
        }

        let (bare, paren) = split_paren_code(&name);
        let grade = find_grade(&name);

        if !self.products.is_empty() {
            let by_code = |code: &str| {
                self.products
                    .iter()
                    .find(|p| p.code.eq_ignore_ascii_case(code))
                    .map(|p| p.code.clone())
            };
            let by_label = |label: &str| {
                self.products
                    .iter()
                    .find(|p| p.label.eq_ignore_ascii_case(label))
                    .map(|p| p.code.clone())
            };
            let by_grade = |grade: &str| {
                let npk = parse_grade(grade)?;
                self.products
                    .iter()
                    .find(|p| {
                        p.code.eq_ignore_ascii_case(grade) || p.nutrient_percent == npk
                    })
                    .map(|p| p.code.clone())
            };

            // Any trailing group naming a catalog code wins, so `Potash (mop)`
            // and `Mix (blend a)` resolve like `Urea (46-0-0)`.
            let found = trailing_paren(&name)
                .and_then(|(_, inner)| by_code(inner))
                .or_else(|| by_code(&name))
                .or_else(|| by_label(&name))
                .or_else(|| by_label(bare))
                .or_else(|| grade.as_deref().and_then(by_grade));
            if found.is_some() {
                return found;
            }
        }

        Some(
            paren
                .map(str::to_string)
                .or(grade)
                .unwrap_or_else(|| name.clone()),
        )
    }
}

/// Split `"Label (CODE)"` into the label and the code when the
/// parenthesized part looks like a product code.
fn split_paren_code(name: &str) -> (&str, Option<&str>) {
    match trailing_paren(name) {
        Some((label, inner)) if looks_like_code(inner) => (label, Some(inner)),
        _ => (name, None),
    }
}

/// `"Label (inner)"` as `("Label", "inner")`, whatever the inner text.
fn trailing_paren(name: &str) -> Option<(&str, &str)> {
    let stripped = name.strip_suffix(')')?;
    let idx = stripped.rfind('(')?;
    let inner = stripped[idx + 1..].trim();
    if inner.is_empty() {
        return None;
    }
    Some((stripped[..idx].trim_end(), inner))
}

fn looks_like_code(inner: &str) -> bool {
    inner.len() <= 24
        && !inner.contains(char::is_whitespace)
        && inner.chars().any(|c| c.is_ascii_digit() || c.is_uppercase())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Npk;
    use rust_decimal_macros::dec;

    #[test]
    fn test_stage_aliases() {
        assert_eq!(stage_from_key("saPagtanim"), Some(Stage::Basal));
        assert_eq!(stage_from_key("basalApplication"), Some(Stage::Basal));
        assert_eq!(stage_from_key("at_planting"), Some(Stage::Basal));
        assert_eq!(stage_from_key("after30DAT"), Some(Stage::After30Dat));
        assert_eq!(stage_from_key("ika30Araw"), Some(Stage::After30Dat));
        assert_eq!(stage_from_key("topDress"), Some(Stage::TopDress));
        assert_eq!(stage_from_key("organicFertilizer"), Some(Stage::Organic));
        assert_eq!(stage_from_key("cost"), None);
        assert_eq!(stage_from_key("14-14-14"), None);
    }

    #[test]
    fn test_unknown_key_uses_keywords() {
        assert_eq!(stage_from_key("Second application (after 30 days)"), Some(Stage::After30Dat));
        assert_eq!(stage_from_key("Top-dress at PI"), Some(Stage::TopDress));
    }

    #[test]
    fn test_detect_stage_keywords() {
        assert_eq!(detect_stage("Basal (sa pagtanim):"), Some(Stage::Basal));
        assert_eq!(detect_stage("After 30 DAT (ika-30 araw):"), Some(Stage::After30Dat));
        assert_eq!(detect_stage("Top dress (ika-60 araw):"), Some(Stage::TopDress));
        assert_eq!(detect_stage("Organic (Organikong pataba):"), Some(Stage::Organic));
        assert_eq!(detect_stage("DBH"), Some(Stage::TopDress));
        assert_eq!(detect_stage("Day 30"), Some(Stage::After30Dat));
        assert_eq!(detect_stage("30 days after transplanting"), Some(Stage::After30Dat));
        assert_eq!(detect_stage("Mga pataba"), None);
    }

    #[test]
    fn test_detect_stage_ignores_grades() {
        assert_eq!(detect_stage("0-0-60"), None);
        assert_eq!(detect_stage("30-0-0"), None);
        assert_eq!(detect_stage("0-0-60 top dress"), Some(Stage::TopDress));
    }

    #[test]
    fn test_find_grade() {
        assert_eq!(find_grade("Complete 14-14-14"), Some("14-14-14".into()));
        assert_eq!(find_grade("Urea 46 - 0 - 0"), Some("46-0-0".into()));
        assert_eq!(find_grade("MOP 00-00-60"), Some("0-0-60".into()));
        assert_eq!(find_grade("Urea"), None);
        assert_eq!(find_grade("2024-01-15"), None);
    }

    #[test]
    fn test_resolve_without_catalog() {
        let resolver = CodeResolver::default();
        assert_eq!(resolver.resolve("Urea (46-0-0)"), Some("46-0-0".into()));
        assert_eq!(resolver.resolve("Complete 14-14-14"), Some("14-14-14".into()));
        assert_eq!(resolver.resolve("  Organic   Fertilizer: "), Some("Organic Fertilizer".into()));
        assert_eq!(resolver.resolve("Ammosul (sa pagtanim)"), Some("Ammosul (sa pagtanim)".into()));
        assert_eq!(resolver.resolve(" - "), None);
    }

    #[test]
    fn test_resolve_with_catalog() {
        let products = vec![
            Product {
                code: "UREA-46".into(),
                label: "Urea".into(),
                price_per_bag: dec!(1500),
                bag_weight_kg: dec!(50),
                nutrient_percent: Npk::new(dec!(46), dec!(0), dec!(0)),
                active: true,
            },
            Product {
                code: "MOP".into(),
                label: "Muriate of Potash".into(),
                price_per_bag: dec!(1700),
                bag_weight_kg: dec!(50),
                nutrient_percent: Npk::new(dec!(0), dec!(0), dec!(60)),
                active: true,
            },
        ];
        let resolver = CodeResolver::new(&products);
        assert_eq!(resolver.resolve("urea-46"), Some("UREA-46".into()));
        assert_eq!(resolver.resolve("Urea"), Some("UREA-46".into()));
        assert_eq!(resolver.resolve("Muriate of Potash (MOP)"), Some("MOP".into()));
        assert_eq!(resolver.resolve("Potash 0-0-60"), Some("MOP".into()));
        assert_eq!(resolver.resolve("Vermicast"), Some("Vermicast".into()));
    }

    #[test]
    fn test_resolve_word_codes_in_parentheses() {
        let product = |code: &str, label: &str| Product {
            code: code.into(),
            label: label.into(),
            price_per_bag: dec!(1000),
            bag_weight_kg: dec!(50),
            nutrient_percent: Npk::default(),
            active: true,
        };
        let products = vec![
            product("mop", "Muriate of Potash"),
            product("complete", "Complete 14-14-14"),
            product("blend a", "House Blend"),
        ];
        let resolver = CodeResolver::new(&products);
        assert_eq!(resolver.resolve("Muriate of Potash (mop)"), Some("mop".into()));
        assert_eq!(resolver.resolve("Complete 14-14-14 (complete)"), Some("complete".into()));
        assert_eq!(resolver.resolve("House Blend (blend a)"), Some("blend a".into()));
        assert_eq!(resolver.resolve("Vermicast (local)"), Some("Vermicast (local)".into()));
    }
}
