use rust_decimal::Decimal;
use serde_json::{Map, Value};

use super::free_text;
use super::normalize::{stage_from_key, CodeResolver};
use super::values::{field, normalize_key, value_amount, value_text};
use crate::model::Stage;
use crate::schedule::{add_bags, StageBuckets};

const CODE_FIELDS: &[&str] = &[
    "code",
    "productcode",
    "grade",
    "fertilizer",
    "fertilizercode",
    "product",
    "name",
    "type",
    "label",
    "item",
];

const BAG_FIELDS: &[&str] = &[
    "bags",
    "bag",
    "qty",
    "quantity",
    "amount",
    "sacks",
    "sako",
    "count",
    "value",
    "numbags",
    "noofbags",
];

const STAGE_FIELDS: &[&str] = &["stage", "name", "label", "timing", "application"];

const ENTRY_LIST_FIELDS: &[&str] = &["items", "products", "fertilizers", "entries", "list", "amounts"];

/// Keys of a record that never name a product.
const METADATA_KEYS: &[&str] = &[
    "cost",
    "dacost",
    "total",
    "totalcost",
    "totalbags",
    "name",
    "title",
    "details",
    "currency",
    "date",
    "createdat",
    "updatedat",
    "id",
    "notes",
    "area",
    "areaha",
    "variety",
    "season",
    "soilclass",
    "n",
    "p",
    "k",
    "ph",
];

/// Read a stage-keyed object, or an array of `{stage, items}` elements,
/// into stage buckets. Array elements without a stage go under Basal.
pub(crate) fn stage_buckets(value: &Value, resolver: &CodeResolver<'_>) -> StageBuckets {
    let mut buckets = StageBuckets::new();
    match value {
        Value::Object(object) => {
            for (key, stage_value) in object {
                if let Some(stage) = stage_from_key(key) {
                    add_all(&mut buckets, stage, entries(stage_value, resolver));
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                stage_element(&mut buckets, item, resolver);
            }
        }
        _ => {}
    }
    buckets
}

fn stage_element(buckets: &mut StageBuckets, item: &Value, resolver: &CodeResolver<'_>) {
    let Value::Object(object) = item else {
        return;
    };

    let stage = field(object, STAGE_FIELDS)
        .and_then(value_text)
        .and_then(|s| stage_from_key(&s));

    if let Some(list) = field(object, ENTRY_LIST_FIELDS) {
        add_all(buckets, stage.unwrap_or(Stage::Basal), entries(list, resolver));
        return;
    }

    if let Some(entry) = code_entry(object, resolver) {
        // `name`/`label` may have been read as the stage; an element that
        // is a stage label and an entry at once keeps the entry.
        add_all(buckets, entry_stage(object).unwrap_or(Stage::Basal), vec![entry]);
        return;
    }

    for (stage, amounts) in stage_buckets(item, resolver) {
        let target = buckets.entry(stage).or_default();
        for (code, bags) in amounts {
            add_bags(target, code, bags);
        }
    }
}

/// Stage of a `{code, bags, stage}` element, from the dedicated stage
/// fields only.
fn entry_stage(object: &Map<String, Value>) -> Option<Stage> {
    field(object, &["stage", "timing", "application"])
        .and_then(value_text)
        .and_then(|s| stage_from_key(&s))
}

/// Read the product amounts of one stage value.
pub(crate) fn entries(value: &Value, resolver: &CodeResolver<'_>) -> Vec<(String, Decimal)> {
    match value {
        Value::Object(object) => {
            if let Some(entry) = code_entry(object, resolver) {
                return vec![entry];
            }
            object
                .iter()
                .filter_map(|(key, v)| {
                    let bags = match v {
                        Value::Object(inner) => field(inner, BAG_FIELDS).and_then(value_amount),
                        other => value_amount(other),
                    }?;
                    Some((resolver.resolve(key)?, bags))
                })
                .collect()
        }
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(object) => code_entry(object, resolver),
                Value::String(line) => {
                    free_text::parse_line(line, resolver).map(|e| (e.code, e.bags))
                }
                _ => None,
            })
            .collect(),
        Value::String(text) => free_text::parse_lines(&[text.as_str()], resolver)
            .into_values()
            .flatten()
            .collect(),
        _ => Vec::new(),
    }
}

/// A `{code, bags}`-like object under any of the field aliases.
fn code_entry(object: &Map<String, Value>, resolver: &CodeResolver<'_>) -> Option<(String, Decimal)> {
    let code = field(object, CODE_FIELDS).and_then(value_text)?;
    let bags = field(object, BAG_FIELDS).and_then(value_amount)?;
    Some((resolver.resolve(&code)?, bags))
}

/// Read a plain `{code: bags}` object into the Basal bucket, skipping
/// metadata keys, stage keys and non-numeric values. Organic products go
/// under Organic.
pub(crate) fn flat_code_map(object: &Map<String, Value>, resolver: &CodeResolver<'_>) -> StageBuckets {
    let mut buckets = StageBuckets::new();
    for (key, v) in object {
        if METADATA_KEYS.contains(&normalize_key(key).as_str()) {
            continue;
        }
        // a timing key with a bare number is a stage, not a product
        let stage = match stage_from_key(key) {
            Some(Stage::Organic) => Stage::Organic,
            Some(_) => continue,
            None => Stage::Basal,
        };
        let (Some(code), Some(bags)) = (resolver.resolve(key), value_amount(v)) else {
            continue;
        };
        add_all(&mut buckets, stage, vec![(code, bags)]);
    }
    buckets
}

fn add_all(buckets: &mut StageBuckets, stage: Stage, amounts: Vec<(String, Decimal)>) {
    if amounts.is_empty() {
        return;
    }
    let target = buckets.entry(stage).or_default();
    for (code, bags) in amounts {
        add_bags(target, code, bags);
    }
}
