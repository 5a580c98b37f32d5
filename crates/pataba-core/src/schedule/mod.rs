pub mod builder;
pub mod plan;

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::Stage;

pub use builder::{DaBreakdown, ScheduleBuilder, ScheduleSource};
pub use plan::{format_money, narrative, project, render_free_text, PlanProjection};

/// product code -> bags
pub type CodeAmounts = BTreeMap<String, Decimal>;

/// stage -> product code -> bags, before validation.
pub type StageBuckets = BTreeMap<Stage, CodeAmounts>;

/// Add `bags` to `code` in `amounts`. An addition that would overflow
/// leaves the existing amount alone and returns `false`.
pub fn add_bags(amounts: &mut CodeAmounts, code: String, bags: Decimal) -> bool {
    let current = amounts.get(&code).copied().unwrap_or_default();
    match current.checked_add(bags) {
        Some(sum) => {
            amounts.insert(code, sum);
            true
        }
        None => {
            tracing::warn!(code = %code, "bag amount overflow, entry dropped");
            false
        }
    }
}

/// A fertilizer plan as stage -> product code -> bags.
///
/// Only constructed through [`ScheduleModel::from_stages`], which keeps
/// `totals_by_product` equal to the per-code sum over stages and refuses
/// to build a plan with no entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleModel {
    stage_amounts: BTreeMap<Stage, CodeAmounts>,
    totals_by_product: CodeAmounts,
    title: String,
    total_cost_text: String,
}

impl ScheduleModel {
    /// Build from stage buckets. Non-positive amounts and empty stages are
    /// dropped; `None` when nothing is left.
    pub fn from_stages(
        stages: StageBuckets,
        title: impl Into<String>,
        total_cost_text: impl Into<String>,
    ) -> Option<Self> {
        let mut stage_amounts = BTreeMap::new();
        let mut totals_by_product = CodeAmounts::new();

        for (stage, amounts) in stages {
            let mut kept = CodeAmounts::new();
            for (code, bags) in amounts {
                if code.trim().is_empty() || bags <= Decimal::ZERO {
                    continue;
                }
                // A stage entry whose running total would overflow is left
                // out of both maps so totals stay equal to the stage sums.
                if add_bags(&mut totals_by_product, code.clone(), bags) {
                    kept.insert(code, bags);
                }
            }
            if kept.is_empty() {
                continue;
            }
            stage_amounts.insert(stage, kept);
        }

        if stage_amounts.is_empty() {
            return None;
        }

        Some(Self {
            stage_amounts,
            totals_by_product,
            title: title.into(),
            total_cost_text: total_cost_text.into(),
        })
    }

    pub fn stage_amounts(&self) -> &BTreeMap<Stage, CodeAmounts> {
        &self.stage_amounts
    }

    pub fn stage(&self, stage: Stage) -> Option<&CodeAmounts> {
        self.stage_amounts.get(&stage)
    }

    pub fn totals_by_product(&self) -> &CodeAmounts {
        &self.totals_by_product
    }

    pub fn total(&self, code: &str) -> Option<Decimal> {
        self.totals_by_product.get(code).copied()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn total_cost_text(&self) -> &str {
        &self.total_cost_text
    }

    /// Product codes in the plan, sorted.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.totals_by_product.keys().map(String::as_str)
    }
}
