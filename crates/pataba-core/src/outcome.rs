use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::allocate::{AllocationPolicy, AllocationResult};
use crate::catalog::Selection;
use crate::classify::PhClass;
use crate::model::{Npk, NutrientReading, Ratings, Season, SoilClass, Variety};
use crate::schedule::{PlanProjection, ScheduleModel};

/// A recommendation request as sent by the app. N, P and K are in ppm;
/// omitted fields take the config defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub n: f64,
    pub p: f64,
    pub k: f64,
    #[serde(default)]
    pub ph: Option<f64>,
    #[serde(default)]
    pub area_ha: Option<f64>,
    #[serde(default)]
    pub variety: Option<Variety>,
    #[serde(default)]
    pub soil_class: Option<SoilClass>,
    #[serde(default)]
    pub season: Option<Season>,
}

impl RecommendationRequest {
    pub fn reading(&self) -> NutrientReading {
        NutrientReading {
            n: self.n,
            p: self.p,
            k: self.k,
            ph: self.ph,
        }
    }
}

/// Caller choices that are not part of the request itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecommendOptions {
    pub policy: AllocationPolicy,
    /// Leave inactive catalog products out of selection.
    pub active_only: bool,
}

/// Everything derived for one request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub variety: Variety,
    pub soil_class: SoilClass,
    pub season: Season,
    pub area_ha: Decimal,
    pub ratings: Ratings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ph_class: Option<PhClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ph_advisory: Option<String>,
    /// kg/ha from the target table.
    pub target_per_ha: Npk,
    /// kg for the whole area.
    pub target_kg: Npk,
    pub selection: Selection,
    pub strategy: String,
    pub allocation: AllocationResult,
    /// `None` when the allocation produced no rows.
    pub schedule: Option<ScheduleModel>,
    pub plan: Option<PlanProjection>,
    pub narrative: Option<String>,
}

impl Recommendation {
    pub fn has_plan(&self) -> bool {
        self.schedule.is_some()
    }
}
