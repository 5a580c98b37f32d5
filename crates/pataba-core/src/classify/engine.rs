use crate::agronomy::schema::{BreakpointTable, PhBands};
use crate::model::{f64_to_decimal, Nutrient, NutrientReading, Rating, Ratings};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classify a raw ppm reading for one nutrient.
///
/// Non-finite or non-positive input means the sensor was not seated or the
/// read failed, and yields `NotAvailable`. Otherwise the value is rounded to
/// the nearest whole ppm and compared against the nutrient's breakpoints
/// (both inclusive on the upper side).
pub fn classify(nutrient: Nutrient, ppm: f64, breakpoints: &BreakpointTable) -> Rating {
    if !ppm.is_finite() || ppm <= 0.0 {
        return Rating::NotAvailable;
    }

    let Some(bp) = breakpoints.get(&nutrient) else {
        tracing::warn!(
            nutrient = nutrient.symbol(),
            "no breakpoints configured, falling back to Medium"
        );
        return Rating::Medium;
    };

    let rounded = Decimal::from(ppm.round() as i64);
    if rounded <= bp.low {
        Rating::Low
    } else if rounded <= bp.mid {
        Rating::Medium
    } else {
        Rating::High
    }
}

/// Classify all three nutrients of a reading.
pub fn classify_reading(reading: &NutrientReading, breakpoints: &BreakpointTable) -> Ratings {
    Ratings {
        n: classify(Nutrient::Nitrogen, reading.n, breakpoints),
        p: classify(Nutrient::Phosphorus, reading.p, breakpoints),
        k: classify(Nutrient::Potassium, reading.k, breakpoints),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhClass {
    StronglyAcidic,
    Acidic,
    Neutral,
    Alkaline,
    #[serde(rename = "n/a")]
    NotAvailable,
}

impl PhClass {
    /// Short liming/amendment advice for the class.
    pub fn advisory(&self) -> &'static str {
        match self {
            PhClass::StronglyAcidic => {
                "Soil is strongly acidic. Apply agricultural lime before planting and retest."
            }
            PhClass::Acidic => "Soil is slightly acidic. Consider a light lime application.",
            PhClass::Neutral => "Soil pH is within the range rice tolerates well.",
            PhClass::Alkaline => {
                "Soil is alkaline. Zinc deficiency is likely; consider zinc sulfate or organic matter."
            }
            PhClass::NotAvailable => "No valid pH reading.",
        }
    }
}

impl fmt::Display for PhClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhClass::StronglyAcidic => write!(f, "Strongly acidic"),
            PhClass::Acidic => write!(f, "Acidic"),
            PhClass::Neutral => write!(f, "Neutral"),
            PhClass::Alkaline => write!(f, "Alkaline"),
            PhClass::NotAvailable => write!(f, "N/A"),
        }
    }
}

/// Classify a pH reading. Values outside (0, 14] are treated as invalid reads.
pub fn classify_ph(ph: f64, bands: &PhBands) -> PhClass {
    if ph <= 0.0 || ph > 14.0 {
        return PhClass::NotAvailable;
    }
    let Some(value) = f64_to_decimal(ph) else {
        return PhClass::NotAvailable;
    };

    if value < bands.strongly_acidic_below {
        PhClass::StronglyAcidic
    } else if value < bands.acidic_below {
        PhClass::Acidic
    } else if value > bands.alkaline_above {
        PhClass::Alkaline
    } else {
        PhClass::Neutral
    }
}
