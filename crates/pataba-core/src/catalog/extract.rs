use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::collections::HashSet;

use super::{Catalog, Product, DEFAULT_BAG_WEIGHT_KG, DEFAULT_CURRENCY};
use crate::model::Npk;
use crate::parsing::values::{field, value_amount, value_text};

const LABEL_KEYS: &[&str] = &["label", "name", "productname", "description"];
const PRICE_KEYS: &[&str] = &["priceperbag", "price", "costperbag", "cost"];
const BAG_KEYS: &[&str] = &["bagkg", "bagweightkg", "bagweight", "bagsize", "kgperbag"];
const NPK_KEYS: &[&str] = &["npk", "nutrientpercent", "nutrients", "grade"];
const ACTIVE_KEYS: &[&str] = &["active", "enabled", "available"];
const CODE_KEYS: &[&str] = &["code", "productcode", "id"];

/// Turn a raw catalog document into a normalized product list.
///
/// Expected shape:
/// `{ "currency": "PHP", "items": { "<code>": { "label", "pricePerBag", "bagKg", "npk": {N,P,K}, "active" } } }`.
/// `items` may also be an array of objects carrying a `code` field; the
/// first usable item per code is kept.
///
/// Missing nutrient percentages default to 0 and a missing bag weight to
/// 50 kg. Items without a usable price are skipped. Inactive items are kept.
pub fn extract(doc: &Value) -> Catalog {
    let currency = doc
        .get("currency")
        .and_then(value_text)
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    let mut products = Vec::new();
    match doc.get("items") {
        Some(Value::Object(items)) => {
            for (code, item) in items {
                if let Some(product) = item.as_object().and_then(|obj| extract_item(code, obj)) {
                    products.push(product);
                }
            }
        }
        Some(Value::Array(items)) => {
            let mut seen = HashSet::new();
            for item in items {
                let Some(obj) = item.as_object() else {
                    continue;
                };
                let Some(code) = field(obj, CODE_KEYS).and_then(value_text) else {
                    tracing::warn!("catalog item without a code skipped");
                    continue;
                };
                if seen.contains(code.trim()) {
                    tracing::warn!(code = code.trim(), "duplicate catalog code; later item skipped");
                    continue;
                }
                if let Some(product) = extract_item(&code, obj) {
                    seen.insert(product.code.clone());
                    products.push(product);
                }
            }
        }
        _ => {
            tracing::warn!("catalog document has no items");
        }
    }

    tracing::debug!(count = products.len(), %currency, "extracted catalog products");
    Catalog { currency, products }
}

fn extract_item(code: &str, item: &Map<String, Value>) -> Option<Product> {
    let code = code.trim();
    if code.is_empty() {
        return None;
    }

    let price = match field(item, PRICE_KEYS).and_then(value_amount) {
        Some(p) if !p.is_sign_negative() => p,
        _ => {
            tracing::warn!(code, "catalog item has no valid price; skipped");
            return None;
        }
    };

    let bag_weight_kg = field(item, BAG_KEYS)
        .and_then(value_amount)
        .filter(|w| *w > Decimal::ZERO)
        .unwrap_or(DEFAULT_BAG_WEIGHT_KG);

    let nutrient_percent = match field(item, NPK_KEYS) {
        Some(Value::Object(npk)) => Npk::new(
            percent(npk, &["n", "nitrogen"]),
            percent(npk, &["p", "phosphorus", "p2o5"]),
            percent(npk, &["k", "potassium", "k2o"]),
        ),
        Some(Value::String(grade)) => parse_grade(grade).unwrap_or_default(),
        _ => Npk::default(),
    };

    let active = match field(item, ACTIVE_KEYS) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::String(s)) => !matches!(s.trim().to_lowercase().as_str(), "false" | "no" | "0"),
        _ => true,
    };

    let label = field(item, LABEL_KEYS)
        .and_then(value_text)
        .unwrap_or_else(|| code.to_string());

    Some(Product {
        code: code.to_string(),
        label,
        price_per_bag: price,
        bag_weight_kg,
        nutrient_percent,
        active,
    })
}

/// Read a percentage, clamped to 0-100. Missing or unreadable values are 0.
fn percent(npk: &Map<String, Value>, aliases: &[&str]) -> Decimal {
    field(npk, aliases)
        .and_then(value_amount)
        .map(|v| v.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

/// Parse an NPK grade string like "14-14-14" into percentages, each
/// clamped to 0-100.
pub fn parse_grade(grade: &str) -> Option<Npk> {
    let parts: Vec<&str> = grade.trim().split('-').map(str::trim).collect();
    if parts.len() != 3 {
        return None;
    }
    let part = |s: &str| {
        s.parse::<Decimal>()
            .ok()
            .map(|v| v.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED))
    };
    Some(Npk::new(part(parts[0])?, part(parts[1])?, part(parts[2])?))
}
