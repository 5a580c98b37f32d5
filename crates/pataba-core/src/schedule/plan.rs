use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use super::ScheduleModel;
use crate::catalog::Product;
use crate::model::{round2, Stage};

/// The flattened plan record: a name, a cost string and one detail line
/// per product. The parser reads these lines back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanProjection {
    pub name: String,
    pub cost: String,
    pub details: Vec<String>,
}

/// Flatten a schedule into one line per product code:
/// `"<bags> bag(s) - <label> | <cur> <price>/bag | Subtotal: <cur> <subtotal>"`.
///
/// Codes without a catalog product, or whose subtotal does not fit a
/// decimal, get a bare `"<bags> bag(s) - <code>"` line. The cost is recomputed from catalog prices when every code is
/// priced, otherwise the schedule's own cost text is kept.
pub fn project(model: &ScheduleModel, products: &[Product], currency: &str) -> PlanProjection {
    let mut details = Vec::new();
    let mut total = Decimal::ZERO;
    let mut all_priced = true;

    for (code, bags) in model.totals_by_product() {
        let priced = products
            .iter()
            .find(|p| p.code == *code)
            .and_then(|p| bags.checked_mul(p.price_per_bag).map(|cost| (p, cost)));
        match priced {
            Some((product, cost)) => {
                match total.checked_add(cost) {
                    Some(sum) => total = sum,
                    None => all_priced = false,
                }
                details.push(format!(
                    "{} bag(s) - {} | {}/bag | Subtotal: {}",
                    format_bags(*bags),
                    product.display_name(),
                    format_money(currency, product.price_per_bag),
                    format_money(currency, cost),
                ));
            }
            None => {
                all_priced = false;
                details.push(format!("{} bag(s) - {}", format_bags(*bags), code));
            }
        }
    }

    let cost = if all_priced {
        format_money(currency, total)
    } else {
        model.total_cost_text().to_string()
    };

    PlanProjection {
        name: model.title().to_string(),
        cost,
        details,
    }
}

/// Render stage-headed free text: a header per stage followed by
/// `"CODE: N bags"` lines.
pub fn render_free_text(model: &ScheduleModel) -> Vec<String> {
    let mut lines = Vec::new();
    for (stage, amounts) in model.stage_amounts() {
        lines.push(format!("{stage} ({}):", stage.tagalog()));
        for (code, bags) in amounts {
            lines.push(format!("{code}: {} bags", format_bags(*bags)));
        }
    }
    lines
}

/// Two-language summary of a schedule (English, then Filipino).
pub fn narrative(model: &ScheduleModel) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", model.title());
    if !model.total_cost_text().is_empty() {
        let _ = writeln!(out, "Estimated cost: {}", model.total_cost_text());
    }
    for (stage, amounts) in model.stage_amounts() {
        let _ = writeln!(out, "{}: {}", stage_heading_en(*stage), join_amounts(amounts));
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Plano sa pagpapataba");
    if !model.total_cost_text().is_empty() {
        let _ = writeln!(out, "Tinatayang gastos: {}", model.total_cost_text());
    }
    for (stage, amounts) in model.stage_amounts() {
        let _ = writeln!(out, "{}: {}", stage_heading_tl(*stage), join_amounts(amounts));
    }

    out.trim_end().to_string()
}

fn stage_heading_en(stage: Stage) -> &'static str {
    match stage {
        Stage::Organic => "Organic fertilizer (before planting)",
        Stage::Basal => "Basal (at planting)",
        Stage::After30Dat => "30 days after transplanting",
        Stage::TopDress => "Top dress (around 60 days)",
    }
}

fn stage_heading_tl(stage: Stage) -> &'static str {
    match stage {
        Stage::Organic => "Organikong pataba (bago magtanim)",
        Stage::Basal => "Sa pagtanim",
        Stage::After30Dat => "Ika-30 araw matapos maglipat-tanim",
        Stage::TopDress => "Ika-60 araw (top dress)",
    }
}

fn join_amounts(amounts: &super::CodeAmounts) -> String {
    amounts
        .iter()
        .map(|(code, bags)| format!("{code} x {} bag(s)", format_bags(*bags)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Bag count without trailing zeros: `10`, `2.5`, `1.74`.
pub fn format_bags(bags: Decimal) -> String {
    round2(bags).normalize().to_string()
}

/// `"PHP 12,345.60"`: 2 decimals, comma thousands separators.
pub fn format_money(currency: &str, amount: Decimal) -> String {
    let rounded = round2(amount);
    let digits = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{currency} {sign}{grouped}.{frac_part}")
}
