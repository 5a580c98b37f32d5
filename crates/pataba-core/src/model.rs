use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PatabaError;

/// The three macronutrients the sensor reports and the engine plans for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Nutrient {
    #[serde(rename = "N")]
    Nitrogen,
    #[serde(rename = "P")]
    Phosphorus,
    #[serde(rename = "K")]
    Potassium,
}

impl Nutrient {
    pub const ALL: [Nutrient; 3] = [Nutrient::Nitrogen, Nutrient::Phosphorus, Nutrient::Potassium];

    pub fn symbol(&self) -> &'static str {
        match self {
            Nutrient::Nitrogen => "N",
            Nutrient::Phosphorus => "P",
            Nutrient::Potassium => "K",
        }
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Nutrient::Nitrogen => write!(f, "nitrogen (N)"),
            Nutrient::Phosphorus => write!(f, "phosphorus (P)"),
            Nutrient::Potassium => write!(f, "potassium (K)"),
        }
    }
}

/// An N/P/K triple. Used for nutrient percentages, kg targets and kg supplied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Npk {
    #[serde(rename = "N")]
    pub n: Decimal,
    #[serde(rename = "P")]
    pub p: Decimal,
    #[serde(rename = "K")]
    pub k: Decimal,
}

impl Npk {
    pub fn new(n: Decimal, p: Decimal, k: Decimal) -> Self {
        Self { n, p, k }
    }

    pub fn get(&self, nutrient: Nutrient) -> Decimal {
        match nutrient {
            Nutrient::Nitrogen => self.n,
            Nutrient::Phosphorus => self.p,
            Nutrient::Potassium => self.k,
        }
    }

    pub fn scale(&self, factor: Decimal) -> Npk {
        Npk::new(self.n * factor, self.p * factor, self.k * factor)
    }
}

impl std::ops::Add for Npk {
    type Output = Npk;

    fn add(self, rhs: Npk) -> Npk {
        Npk::new(self.n + rhs.n, self.p + rhs.p, self.k + rhs.k)
    }
}

impl fmt::Display for Npk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N {} / P {} / K {}", self.n, self.p, self.k)
    }
}

/// Raw soil sensor reading. N, P and K are in ppm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientReading {
    pub n: f64,
    pub p: f64,
    pub k: f64,
    #[serde(default)]
    pub ph: Option<f64>,
}

impl NutrientReading {
    pub fn ppm(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Nitrogen => self.n,
            Nutrient::Phosphorus => self.p,
            Nutrient::Potassium => self.k,
        }
    }
}

/// Three-level soil fertility rating, plus `NotAvailable` for an invalid read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Low,
    Medium,
    High,
    #[serde(rename = "n/a")]
    NotAvailable,
}

impl Rating {
    /// Ratings the target table is keyed by.
    pub const LEVELS: [Rating; 3] = [Rating::Low, Rating::Medium, Rating::High];
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::Low => write!(f, "Low"),
            Rating::Medium => write!(f, "Medium"),
            Rating::High => write!(f, "High"),
            Rating::NotAvailable => write!(f, "N/A"),
        }
    }
}

/// Per-nutrient ratings for one reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratings {
    #[serde(rename = "N")]
    pub n: Rating,
    #[serde(rename = "P")]
    pub p: Rating,
    #[serde(rename = "K")]
    pub k: Rating,
}

impl Ratings {
    pub fn get(&self, nutrient: Nutrient) -> Rating {
        match nutrient {
            Nutrient::Nitrogen => self.n,
            Nutrient::Phosphorus => self.p,
            Nutrient::Potassium => self.k,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variety {
    Hybrid,
    Inbred,
}

impl Variety {
    pub const ALL: [Variety; 2] = [Variety::Hybrid, Variety::Inbred];
}

impl fmt::Display for Variety {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variety::Hybrid => write!(f, "hybrid"),
            Variety::Inbred => write!(f, "inbred"),
        }
    }
}

impl FromStr for Variety {
    type Err = PatabaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hybrid" => Ok(Variety::Hybrid),
            "inbred" => Ok(Variety::Inbred),
            other => Err(PatabaError::InvalidInput(format!(
                "unknown variety '{other}' (expected 'hybrid' or 'inbred')"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SoilClass {
    Light,
    MedHeavy,
}

impl SoilClass {
    pub const ALL: [SoilClass; 2] = [SoilClass::Light, SoilClass::MedHeavy];
}

impl fmt::Display for SoilClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoilClass::Light => write!(f, "light"),
            SoilClass::MedHeavy => write!(f, "medHeavy"),
        }
    }
}

impl FromStr for SoilClass {
    type Err = PatabaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match key.as_str() {
            "light" => Ok(SoilClass::Light),
            "medheavy" | "mediumheavy" | "medium" | "heavy" => Ok(SoilClass::MedHeavy),
            _ => Err(PatabaError::InvalidInput(format!(
                "unknown soil class '{}' (expected 'light' or 'medHeavy')",
                s.trim()
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Wet,
    Dry,
}

impl Season {
    pub const ALL: [Season; 2] = [Season::Wet, Season::Dry];
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::Wet => write!(f, "wet"),
            Season::Dry => write!(f, "dry"),
        }
    }
}

impl FromStr for Season {
    type Err = PatabaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wet" => Ok(Season::Wet),
            "dry" => Ok(Season::Dry),
            other => Err(PatabaError::InvalidInput(format!(
                "unknown season '{other}' (expected 'wet' or 'dry')"
            ))),
        }
    }
}

/// Fixed application points in the rice growing cycle, in timeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Organic,
    Basal,
    #[serde(rename = "after30DAT")]
    After30Dat,
    TopDress,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Organic, Stage::Basal, Stage::After30Dat, Stage::TopDress];

    /// Filipino label used in the bilingual narrative and free-text headers.
    pub fn tagalog(&self) -> &'static str {
        match self {
            Stage::Organic => "Organikong pataba",
            Stage::Basal => "sa pagtanim",
            Stage::After30Dat => "ika-30 araw",
            Stage::TopDress => "ika-60 araw",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Organic => write!(f, "Organic"),
            Stage::Basal => write!(f, "Basal"),
            Stage::After30Dat => write!(f, "After 30 DAT"),
            Stage::TopDress => write!(f, "Top dress"),
        }
    }
}

/// Round a bag count or peso amount to 2 decimal places (half away from zero).
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a bag count up to 2 decimal places so a target is never under-supplied.
pub fn round_bags_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::AwayFromZero)
}

/// Convert f64 to Decimal through its shortest display form so that
/// e.g. 0.1 stays 0.1 instead of picking up binary noise.
pub fn f64_to_decimal(f: f64) -> Option<Decimal> {
    if !f.is_finite() {
        return None;
    }
    let s = format!("{f}");
    s.parse::<Decimal>().ok().or_else(|| Decimal::try_from(f).ok())
}
