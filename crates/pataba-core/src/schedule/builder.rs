use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use super::plan::format_money;
use super::{add_bags, ScheduleModel, StageBuckets};
use crate::agronomy::schema::{StageSplit, StageSplits};
use crate::allocate::AllocationResult;
use crate::catalog::ProductRole;
use crate::model::{round2, Stage};
use crate::parsing::nested;
use crate::parsing::normalize::CodeResolver;
use crate::parsing::values::{field, value_amount, value_text};

pub const DEFAULT_TITLE: &str = "Fertilizer plan";

const COST_FIELDS: &[&str] = &["dacost", "cost", "totalcost"];
const TITLE_FIELDS: &[&str] = &["title", "name"];
const SCHEDULE_FIELDS: &[&str] = &["daschedule", "schedule", "stages"];

/// A legacy DA-style breakdown that already names its stage buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DaBreakdown {
    pub stages: StageBuckets,
    pub cost: Option<Decimal>,
    pub title: Option<String>,
}

impl DaBreakdown {
    /// Read a breakdown record. Accepts `{daSchedule: {...}, daCost}` or the
    /// stage-keyed object itself. `None` when no stage bucket is found.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let schedule = field(object, SCHEDULE_FIELDS).unwrap_or(value);
        let stages = nested::stage_buckets(schedule, &CodeResolver::default());
        if stages.is_empty() {
            return None;
        }
        Some(Self {
            stages,
            cost: field(object, COST_FIELDS).and_then(value_amount),
            title: field(object, TITLE_FIELDS).and_then(value_text),
        })
    }
}

/// Where a schedule is built from.
#[derive(Debug, Clone, Copy)]
pub enum ScheduleSource<'a> {
    /// A fresh allocation; bags are spread across stages by role.
    Allocation(&'a AllocationResult),
    /// A breakdown whose buckets are copied as-is.
    DaBreakdown(&'a DaBreakdown),
}

/// Projects allocation results and DA breakdowns into [`ScheduleModel`]s.
#[derive(Debug, Clone)]
pub struct ScheduleBuilder<'a> {
    splits: &'a StageSplits,
    currency: String,
    title: Option<String>,
}

impl<'a> ScheduleBuilder<'a> {
    pub fn new(splits: &'a StageSplits, currency: impl Into<String>) -> Self {
        Self {
            splits,
            currency: currency.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// `None` when the source has no positive bag amount anywhere.
    pub fn build(&self, source: ScheduleSource<'_>) -> Option<ScheduleModel> {
        match source {
            ScheduleSource::Allocation(result) => self.allocation_schedule(result),
            ScheduleSource::DaBreakdown(da) => self.breakdown_schedule(da),
        }
    }

    fn allocation_schedule(&self, result: &AllocationResult) -> Option<ScheduleModel> {
        let mut stages = StageBuckets::new();
        for row in &result.rows {
            for (stage, bags) in split_bags(row.bags, self.split_for(row.role)) {
                add_bags(stages.entry(stage).or_default(), row.product.code.clone(), bags);
            }
        }

        let model = ScheduleModel::from_stages(
            stages,
            self.title.as_deref().unwrap_or(DEFAULT_TITLE),
            format_money(&self.currency, result.total_cost),
        );
        if model.is_none() {
            tracing::debug!("allocation has no rows; schedule unbuildable");
        }
        model
    }

    fn breakdown_schedule(&self, da: &DaBreakdown) -> Option<ScheduleModel> {
        let title = da
            .title
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or(DEFAULT_TITLE);
        let cost = da
            .cost
            .map(|c| format_money(&self.currency, c))
            .unwrap_or_default();
        ScheduleModel::from_stages(da.stages.clone(), title, cost)
    }

    fn split_for(&self, role: ProductRole) -> &StageSplit {
        match role {
            ProductRole::Balanced => &self.splits.balanced,
            ProductRole::NOnly => &self.splits.n_only,
            ProductRole::KOnly => &self.splits.k_only,
        }
    }
}

/// Spread `bags` over the stages of `split`. Each share is rounded to 2
/// decimals and the last stage takes the remainder, so the shares always
/// add up to `bags`.
fn split_bags(bags: Decimal, split: &StageSplit) -> Vec<(Stage, Decimal)> {
    let shares: Vec<(Stage, Decimal)> = split
        .iter()
        .filter(|(_, fraction)| **fraction > Decimal::ZERO)
        .map(|(stage, fraction)| (*stage, *fraction))
        .collect();

    if shares.is_empty() {
        return vec![(Stage::Basal, bags)];
    }

    let mut assigned = Decimal::ZERO;
    let last = shares.len() - 1;
    shares
        .into_iter()
        .enumerate()
        .map(|(i, (stage, fraction))| {
            let amount = if i == last {
                bags - assigned
            } else {
                round2(bags * fraction)
            };
            assigned += amount;
            (stage, amount)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agronomy::builtin::load_preset;
    use crate::allocate::AllocationRow;
    use crate::catalog::Product;
    use crate::model::Npk;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn row(code: &str, role: ProductRole, bags: Decimal, price: Decimal) -> AllocationRow {
        AllocationRow {
            product: Product {
                code: code.into(),
                label: code.into(),
                price_per_bag: price,
                bag_weight_kg: dec!(50),
                nutrient_percent: Npk::default(),
                active: true,
            },
            role,
            bags,
            subtotal: round2(bags * price),
        }
    }

    fn allocation() -> AllocationResult {
        let mut result = AllocationResult::empty(Npk::new(dec!(110), dec!(70), dec!(100)));
        result.rows = vec![
            row("14-14-14", ProductRole::Balanced, dec!(10), dec!(1400)),
            row("46-0-0", ProductRole::NOnly, dec!(1.75), dec!(1500)),
            row("0-0-60", ProductRole::KOnly, dec!(1), dec!(1700)),
        ];
        result.total_cost = dec!(18325);
        result
    }

    #[test]
    fn test_split_bags_remainder_on_last_stage() {
        let mut split = StageSplit::new();
        split.insert(Stage::Basal, dec!(0.5));
        split.insert(Stage::After30Dat, dec!(0.25));
        split.insert(Stage::TopDress, dec!(0.25));
        let shares = split_bags(dec!(1.75), &split);
        assert_eq!(
            shares,
            vec![
                (Stage::Basal, dec!(0.88)),
                (Stage::After30Dat, dec!(0.44)),
                (Stage::TopDress, dec!(0.43)),
            ]
        );
        let sum: Decimal = shares.iter().map(|(_, b)| *b).sum();
        assert_eq!(sum, dec!(1.75));
    }

    #[test]
    fn test_build_from_allocation_uses_default_splits() {
        let config = load_preset("default").unwrap();
        let model = ScheduleBuilder::new(&config.stage_splits, "PHP")
            .build(ScheduleSource::Allocation(&allocation()))
            .unwrap();

        assert_eq!(model.title(), DEFAULT_TITLE);
        assert_eq!(model.total_cost_text(), "PHP 18,325.00");

        let basal = model.stage(Stage::Basal).unwrap();
        assert_eq!(basal["14-14-14"], dec!(5));
        assert_eq!(basal["0-0-60"], dec!(1));
        assert!(!basal.contains_key("46-0-0"));

        let after30 = model.stage(Stage::After30Dat).unwrap();
        assert_eq!(after30["14-14-14"], dec!(2.5));
        assert_eq!(after30["46-0-0"], dec!(0.88));
        assert_eq!(model.stage(Stage::TopDress).unwrap()["46-0-0"], dec!(0.87));

        assert_eq!(model.total("14-14-14"), Some(dec!(10)));
        assert_eq!(model.total("46-0-0"), Some(dec!(1.75)));
        assert_eq!(model.total("0-0-60"), Some(dec!(1)));
        assert!(model.stage(Stage::Organic).is_none());
    }

    #[test]
    fn test_empty_allocation_is_unbuildable() {
        let config = load_preset("default").unwrap();
        let empty = AllocationResult::empty(Npk::default());
        assert!(ScheduleBuilder::new(&config.stage_splits, "PHP")
            .build(ScheduleSource::Allocation(&empty))
            .is_none());
    }

    #[test]
    fn test_breakdown_copied_verbatim() {
        let record = json!({
            "daSchedule": {
                "organic": { "Organic Fertilizer": 10 },
                "basal": [{ "code": "14-14-14", "bags": 4 }],
                "after30": { "46-0-0": "1.5" },
                "topdress": [{ "fertilizer": "46-0-0", "qty": 1 }, { "code": "0-0-60", "bags": 0.5 }]
            },
            "daCost": "12,450.50",
            "title": "DA recommendation"
        });
        let da = DaBreakdown::from_value(&record).unwrap();
        let config = load_preset("default").unwrap();
        let model = ScheduleBuilder::new(&config.stage_splits, "PHP")
            .build(ScheduleSource::DaBreakdown(&da))
            .unwrap();

        assert_eq!(model.title(), "DA recommendation");
        assert_eq!(model.total_cost_text(), "PHP 12,450.50");
        assert_eq!(model.stage(Stage::Organic).unwrap()["Organic Fertilizer"], dec!(10));
        assert_eq!(model.stage(Stage::Basal).unwrap()["14-14-14"], dec!(4));
        assert_eq!(model.stage(Stage::After30Dat).unwrap()["46-0-0"], dec!(1.5));
        assert_eq!(model.stage(Stage::TopDress).unwrap()["0-0-60"], dec!(0.5));
        assert_eq!(model.total("46-0-0"), Some(dec!(2.5)));
    }

    #[test]
    fn test_breakdown_with_all_zero_buckets_is_unbuildable() {
        let record = json!({ "basal": { "14-14-14": 0 }, "topDress": {} });
        let config = load_preset("default").unwrap();
        let builder = ScheduleBuilder::new(&config.stage_splits, "PHP");
        let model = DaBreakdown::from_value(&record)
            .and_then(|da| builder.build(ScheduleSource::DaBreakdown(&da)));
        assert!(model.is_none());
    }
}
