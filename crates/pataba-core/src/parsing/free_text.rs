use regex::{Captures, Regex};
use rust_decimal::Decimal;
use std::sync::LazyLock;

use super::normalize::{detect_stage, CodeResolver, GRADE};
use super::values::parse_amount;
use crate::model::Stage;
use crate::schedule::{add_bags, StageBuckets};

const NUMBER: &str = r"\d[\d,]*(?:\.\d+)?";
const UNIT: &str = r"(?:bag\(s\)|bags?\b|sacks?\b|sako\b)";

/// `Organic Fertilizer: 10 bags` (unit optional).
static ORGANIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^\s*organic(?:\s+fertili[sz]er)?\s*[:\-]\s*(?P<amt>{NUMBER})\s*{UNIT}?"
    ))
    .expect("valid organic regex")
});

/// `1.74 bag(s) - Urea (46-0-0) | PHP 1,500.00/bag | ...`
static BAGS_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^\s*(?P<amt>{NUMBER})\s*{UNIT}\s*(?:[-–:x×]|of)?\s*(?P<code>[^|]+)"
    ))
    .expect("valid bags-first regex")
});

/// `14-14-14: 5 bags`
static CODE_COLON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^\s*(?P<code>[^:|]+?)\s*:\s*(?P<amt>{NUMBER})\s*{UNIT}"
    ))
    .expect("valid code-colon regex")
});

/// `Urea - 2 bags` (dash needs surrounding spaces so grades stay whole)
static CODE_DASH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^\s*(?P<code>[^|]+?)\s+[-–]\s+(?P<amt>{NUMBER})\s*{UNIT}"
    ))
    .expect("valid code-dash regex")
});

static AMOUNT_WITH_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)(?P<amt>{NUMBER})\s*{UNIT}")).expect("valid amount regex")
});

static BARE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(NUMBER).expect("valid number regex"));

/// One data line read from free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LineEntry {
    pub code: String,
    pub bags: Decimal,
    /// Stage named on the line itself.
    pub stage: Option<Stage>,
}

/// Read free-text plan lines into stage buckets.
///
/// A line with no data but a stage keyword becomes the context for the
/// lines after it. A data line goes under its own stage keyword if it has
/// one, else the context, else Basal. Unreadable lines are skipped.
pub(crate) fn parse_lines<S: AsRef<str>>(lines: &[S], resolver: &CodeResolver<'_>) -> StageBuckets {
    let mut buckets = StageBuckets::new();
    let mut context: Option<Stage> = None;

    for line in lines.iter().flat_map(|l| l.as_ref().lines()) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_line(line, resolver) {
            Some(entry) => {
                let stage = entry.stage.or(context).unwrap_or(Stage::Basal);
                add_bags(buckets.entry(stage).or_default(), entry.code, entry.bags);
            }
            None => match detect_stage(line) {
                Some(stage) => context = Some(stage),
                None => tracing::trace!(line, "free-text line skipped"),
            },
        }
    }

    buckets
}

/// Try the data patterns in order; the first that yields a code and an
/// amount wins.
pub(crate) fn parse_line(line: &str, resolver: &CodeResolver<'_>) -> Option<LineEntry> {
    if let Some(caps) = ORGANIC.captures(line) {
        let bags = amount(&caps)?;
        return Some(LineEntry {
            code: "Organic Fertilizer".to_string(),
            bags,
            stage: Some(Stage::Organic),
        });
    }

    for pattern in [&*BAGS_FIRST, &*CODE_COLON, &*CODE_DASH] {
        if let Some(caps) = pattern.captures(line) {
            let Some(bags) = amount(&caps) else {
                continue;
            };
            let Some(code) = caps.name("code").and_then(|m| resolver.resolve(m.as_str())) else {
                continue;
            };
            let amount_span = caps.name("amt").map(|m| m.range());
            return Some(LineEntry {
                code,
                bags,
                stage: inline_stage(line, amount_span),
            });
        }
    }

    grade_line(line, resolver)
}

/// A line holding an N-P-K grade and a bag count somewhere after it.
fn grade_line(line: &str, resolver: &CodeResolver<'_>) -> Option<LineEntry> {
    let data = line.split('|').next().unwrap_or(line);
    let grade = GRADE.find(data)?;
    let tail = &data[grade.end()..];

    let (bags, span) = match AMOUNT_WITH_UNIT.captures(tail) {
        Some(caps) => {
            let m = caps.name("amt")?;
            (parse_amount(m.as_str())?, m.range())
        }
        None => {
            let m = BARE_NUMBER.find_iter(tail).last()?;
            (parse_amount(m.as_str())?, m.range())
        }
    };
    let span = (span.start + grade.end())..(span.end + grade.end());

    Some(LineEntry {
        code: resolver.resolve(&data[..grade.end()])?,
        bags,
        stage: inline_stage(line, Some(span)),
    })
}

fn amount(caps: &Captures<'_>) -> Option<Decimal> {
    caps.name("amt").and_then(|m| parse_amount(m.as_str()))
}

/// Stage keyword on a data line, ignoring the amount, grades and any
/// `| price | subtotal` tail.
fn inline_stage(line: &str, amount_span: Option<std::ops::Range<usize>>) -> Option<Stage> {
    let mut text = line.split('|').next().unwrap_or(line).to_string();
    if let Some(span) = amount_span {
        if span.end <= text.len() {
            text.replace_range(span, " ");
        }
    }
    detect_stage(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(line: &str) -> Option<LineEntry> {
        parse_line(line, &CodeResolver::default())
    }

    #[test]
    fn test_code_colon() {
        let e = entry("14-14-14: 5 bags").unwrap();
        assert_eq!(e.code, "14-14-14");
        assert_eq!(e.bags, dec!(5));
        assert_eq!(e.stage, None);
    }

    #[test]
    fn test_code_colon_requires_unit() {
        assert!(entry("Total: 18,310").is_none());
    }

    #[test]
    fn test_code_dash() {
        let e = entry("Urea - 2.5 sacks").unwrap();
        assert_eq!(e.code, "Urea");
        assert_eq!(e.bags, dec!(2.5));
    }

    #[test]
    fn test_bags_first_detail_line() {
        let e = entry("1.74 bag(s) - Urea (46-0-0) | PHP 1,500.00/bag | Subtotal: PHP 2,610.00").unwrap();
        assert_eq!(e.code, "46-0-0");
        assert_eq!(e.bags, dec!(1.74));
        assert_eq!(e.stage, None);
    }

    #[test]
    fn test_bags_first_muriate_is_not_top_dress() {
        let e = entry("1 bag(s) - 0-0-60 | PHP 1,700.00/bag | Subtotal: PHP 1,700.00").unwrap();
        assert_eq!(e.code, "0-0-60");
        assert_eq!(e.stage, None);
    }

    #[test]
    fn test_grade_with_trailing_count() {
        let e = entry("Complete 14-14-14 x 4").unwrap();
        assert_eq!(e.code, "14-14-14");
        assert_eq!(e.bags, dec!(4));

        let e = entry("Apply 46-0-0 around 1.5 bags at top dress").unwrap();
        assert_eq!(e.code, "46-0-0");
        assert_eq!(e.bags, dec!(1.5));
        assert_eq!(e.stage, Some(Stage::TopDress));
    }

    #[test]
    fn test_organic_special_case() {
        let e = entry("Organic Fertilizer: 10 bags").unwrap();
        assert_eq!(e.code, "Organic Fertilizer");
        assert_eq!(e.bags, dec!(10));
        assert_eq!(e.stage, Some(Stage::Organic));
    }

    #[test]
    fn test_inline_stage_keyword() {
        let e = entry("Basal - 14-14-14: 4 bags").unwrap();
        assert_eq!(e.code, "14-14-14");
        assert_eq!(e.stage, Some(Stage::Basal));
    }

    #[test]
    fn test_prose_is_not_data() {
        assert!(entry("Salamat po sa paggamit ng app").is_none());
        assert!(entry("Basal (sa pagtanim):").is_none());
    }

    #[test]
    fn test_headers_set_context() {
        let lines = [
            "Basal (sa pagtanim):",
            "14-14-14: 5 bags",
            "0-0-60: 1 bags",
            "After 30 DAT (ika-30 araw):",
            "14-14-14: 2.5 bags",
            "46-0-0: 0.87 bags",
            "Top dress (ika-60 araw):",
            "14-14-14: 2.5 bags",
            "46-0-0: 0.87 bags",
            "Thank you!",
        ];
        let buckets = parse_lines(&lines, &CodeResolver::default());
        assert_eq!(buckets[&Stage::Basal]["14-14-14"], dec!(5));
        assert_eq!(buckets[&Stage::Basal]["0-0-60"], dec!(1));
        assert_eq!(buckets[&Stage::After30Dat]["46-0-0"], dec!(0.87));
        assert_eq!(buckets[&Stage::TopDress]["14-14-14"], dec!(2.5));
        assert!(!buckets.contains_key(&Stage::Organic));
    }

    #[test]
    fn test_default_stage_is_basal() {
        let buckets = parse_lines(&["46-0-0: 2 bags"], &CodeResolver::default());
        assert_eq!(buckets[&Stage::Basal]["46-0-0"], dec!(2));
    }

    #[test]
    fn test_inline_keyword_beats_context() {
        let lines = ["Basal:", "46-0-0: 1 bags top dress", "0-0-60: 1 bags"];
        let buckets = parse_lines(&lines, &CodeResolver::default());
        assert_eq!(buckets[&Stage::TopDress]["46-0-0"], dec!(1));
        assert_eq!(buckets[&Stage::Basal]["0-0-60"], dec!(1));
    }

    #[test]
    fn test_repeated_max_amount_does_not_overflow() {
        let lines = [
            "X: 79228162514264337593543950335 bags",
            "X: 79228162514264337593543950335 bags",
            "46-0-0: 1 bags",
        ];
        let buckets = parse_lines(&lines, &CodeResolver::default());
        assert_eq!(buckets[&Stage::Basal]["X"], Decimal::MAX);
        assert_eq!(buckets[&Stage::Basal]["46-0-0"], dec!(1));
    }

    #[test]
    fn test_multiline_string_element() {
        let buckets = parse_lines(
            &["Top dress:\n46-0-0: 2 bags\n\nOrganic Fertilizer: 3"],
            &CodeResolver::default(),
        );
        assert_eq!(buckets[&Stage::TopDress]["46-0-0"], dec!(2));
        assert_eq!(buckets[&Stage::Organic]["Organic Fertilizer"], dec!(3));
    }
}
