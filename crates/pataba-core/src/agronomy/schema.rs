use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{Nutrient, Rating, Season, SoilClass, Stage, Variety};

/// Agronomic constants the engine runs against: classifier breakpoints,
/// the kg/ha target table, stage splits and request defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgronomyConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    pub breakpoints: BreakpointTable,
    pub targets: TargetTable,
    pub stage_splits: StageSplits,
    pub defaults: RequestDefaults,
    pub ph_bands: PhBands,
}

pub type BreakpointTable = BTreeMap<Nutrient, Breakpoints>;

/// Two ppm breakpoints: `x <= low` is Low, `low < x <= mid` is Medium,
/// `x > mid` is High.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoints {
    pub low: Decimal,
    pub mid: Decimal,
}

/// kg/ha per rating for one nutrient.
pub type RatingTargets = BTreeMap<Rating, Decimal>;

/// kg/ha per nutrient per rating for one (variety, soil, season) cell.
pub type TargetCell = BTreeMap<Nutrient, RatingTargets>;

/// variety -> soil class -> season -> cell.
pub type TargetTable = BTreeMap<Variety, BTreeMap<SoilClass, BTreeMap<Season, TargetCell>>>;

/// Fraction of a product's bags applied at each stage.
pub type StageSplit = BTreeMap<Stage, Decimal>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSplits {
    pub balanced: StageSplit,
    pub n_only: StageSplit,
    pub k_only: StageSplit,
}

/// Values used when a recommendation request leaves a field out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDefaults {
    pub variety: Variety,
    pub soil_class: SoilClass,
    pub season: Season,
    pub area_ha: Decimal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PhBands {
    pub strongly_acidic_below: Decimal,
    pub acidic_below: Decimal,
    pub alkaline_above: Decimal,
}
