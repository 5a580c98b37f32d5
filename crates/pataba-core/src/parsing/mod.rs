pub mod free_text;
pub mod nested;
pub mod normalize;
pub mod values;

use serde_json::{Map, Value};

use crate::catalog::Product;
use crate::schedule::{ScheduleModel, StageBuckets};
use normalize::{stage_from_key, CodeResolver};
use values::{field, value_text};

const SCHEDULE_FIELDS: &[&str] = &["daschedule", "schedule", "stages", "fertilizerschedule", "plan"];
const DETAIL_FIELDS: &[&str] = &["details", "lines", "recommendation"];
const TITLE_FIELDS: &[&str] = &["name", "title"];
const COST_FIELDS: &[&str] = &["cost", "dacost", "totalcost"];

/// The historical shapes a persisted plan comes in.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanShape {
    /// Free-text lines with stage headers and `CODE: N bags` style entries.
    FreeText(Vec<String>),
    /// Stage-keyed object, or an array of stage elements or `{code, bags}`.
    NestedStage(Value),
    /// A bare `{code: bags}` object.
    FlatCodeMap(Map<String, Value>),
}

impl PlanShape {
    pub fn kind(&self) -> &'static str {
        match self {
            PlanShape::FreeText(_) => "free-text",
            PlanShape::NestedStage(_) => "nested-stage",
            PlanShape::FlatCodeMap(_) => "flat-code-map",
        }
    }

    /// Candidate readings of a record, most specific first.
    pub fn candidates(raw: &Value) -> Vec<PlanShape> {
        let mut shapes = Vec::new();
        collect_shapes(raw, false, &mut shapes);
        shapes
    }

    fn read(&self, resolver: &CodeResolver<'_>) -> StageBuckets {
        match self {
            PlanShape::FreeText(lines) => free_text::parse_lines(lines, resolver),
            PlanShape::NestedStage(value) => nested::stage_buckets(value, resolver),
            PlanShape::FlatCodeMap(object) => nested::flat_code_map(object, resolver),
        }
    }
}

/// Reconstruct a schedule from a persisted plan of any known shape.
///
/// Never fails: `None` means no plan entry could be recovered.
pub fn parse(raw: &Value) -> Option<ScheduleModel> {
    parse_with_catalog(raw, &[])
}

/// Like [`parse`], resolving product names and labels against `products`.
pub fn parse_with_catalog(raw: &Value, products: &[Product]) -> Option<ScheduleModel> {
    let resolver = CodeResolver::new(products);
    let (title, cost) = match raw.as_object() {
        Some(object) => (
            field(object, TITLE_FIELDS).and_then(value_text),
            field(object, COST_FIELDS).and_then(value_text),
        ),
        None => (None, None),
    };

    for shape in PlanShape::candidates(raw) {
        let buckets = shape.read(&resolver);
        if let Some(model) = ScheduleModel::from_stages(
            buckets,
            title.clone().unwrap_or_default(),
            cost.clone().unwrap_or_default(),
        ) {
            tracing::debug!(shape = shape.kind(), codes = model.totals_by_product().len(), "parsed plan");
            return Some(model);
        }
    }

    tracing::debug!("no plan entries recovered");
    None
}

/// Parse raw text: JSON when it decodes, free-text lines otherwise.
pub fn parse_str(raw: &str, products: &[Product]) -> Option<ScheduleModel> {
    parse_with_catalog(&Value::String(raw.to_string()), products)
}

fn collect_shapes(value: &Value, decoded: bool, shapes: &mut Vec<PlanShape>) {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
        Value::String(text) => {
            let trimmed = text.trim();
            if !decoded && (trimmed.starts_with('{') || trimmed.starts_with('[')) {
                if let Ok(inner) = serde_json::from_str::<Value>(trimmed) {
                    collect_shapes(&inner, true, shapes);
                    return;
                }
            }
            if !trimmed.is_empty() {
                shapes.push(PlanShape::FreeText(vec![text.clone()]));
            }
        }
        Value::Array(items) => {
            if items.is_empty() {
                return;
            }
            if items.iter().all(|v| v.is_string()) {
                let lines = items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect();
                shapes.push(PlanShape::FreeText(lines));
            } else {
                shapes.push(PlanShape::NestedStage(value.clone()));
            }
        }
        Value::Object(object) => {
            if let Some(schedule) = field(object, SCHEDULE_FIELDS) {
                collect_shapes(schedule, decoded, shapes);
            }
            if let Some(details) = field(object, DETAIL_FIELDS) {
                collect_shapes(details, decoded, shapes);
            }
            if object.keys().any(|key| stage_from_key(key).is_some()) {
                shapes.push(PlanShape::NestedStage(value.clone()));
            }
            shapes.push(PlanShape::FlatCodeMap(object.clone()));
        }
    }
}
