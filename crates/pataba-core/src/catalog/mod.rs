pub mod extract;
pub mod select;
pub mod xlsx;

use crate::error::PatabaError;
use crate::model::{Npk, Nutrient};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use extract::extract;
pub use select::{select, ProductRole, Selection};

pub const DEFAULT_BAG_WEIGHT_KG: Decimal = Decimal::from_parts(50, 0, 0, false, 0);
pub const DEFAULT_CURRENCY: &str = "PHP";

/// A fertilizer product from the price catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub code: String,
    pub label: String,
    pub price_per_bag: Decimal,
    pub bag_weight_kg: Decimal,
    /// Nutrient content in percent by weight (0-100 each).
    pub nutrient_percent: Npk,
    pub active: bool,
}

impl Product {
    /// kg of `nutrient` in one bag.
    pub fn kg_per_bag(&self, nutrient: Nutrient) -> Decimal {
        self.nutrient_percent.get(nutrient) / Decimal::ONE_HUNDRED * self.bag_weight_kg
    }

    /// Price per kg of `nutrient`. `None` when the product supplies none of it.
    pub fn cost_per_kg(&self, nutrient: Nutrient) -> Option<Decimal> {
        let kg = self.kg_per_bag(nutrient);
        if kg <= Decimal::ZERO {
            None
        } else {
            Some(self.price_per_bag / kg)
        }
    }

    /// Label as shown in plan lines. The code is appended in parentheses
    /// when the label differs from it so the line can be parsed back.
    pub fn display_name(&self) -> String {
        if self.label.trim().is_empty() || self.label.eq_ignore_ascii_case(&self.code) {
            self.code.clone()
        } else {
            format!("{} ({})", self.label, self.code)
        }
    }
}

/// Snapshot of the admin-maintained price catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub currency: String,
    pub products: Vec<Product>,
}

impl Catalog {
    /// Products flagged active. The extractor keeps inactive products;
    /// callers opt into this filter.
    pub fn active_products(&self) -> Vec<Product> {
        self.products.iter().filter(|p| p.active).cloned().collect()
    }

    pub fn find(&self, code: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.code == code)
    }
}

/// Parse a catalog document from a JSON string.
pub fn parse_catalog_str(json: &str) -> Result<Catalog, PatabaError> {
    let doc: serde_json::Value =
        serde_json::from_str(json).map_err(|e| PatabaError::CatalogLoad(e.to_string()))?;
    Ok(extract(&doc))
}

/// Load a catalog from a JSON document or an `.xlsx` price sheet.
pub fn load_catalog(path: &Path) -> Result<Catalog, PatabaError> {
    let is_xlsx = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false);

    let bytes = std::fs::read(path)
        .map_err(|e| PatabaError::CatalogLoad(format!("{}: {e}", path.display())))?;

    if is_xlsx {
        let products = xlsx::parse_price_sheet(&bytes)?;
        Ok(Catalog {
            currency: DEFAULT_CURRENCY.to_string(),
            products,
        })
    } else {
        let json = String::from_utf8(bytes)
            .map_err(|e| PatabaError::CatalogLoad(format!("{}: {e}", path.display())))?;
        parse_catalog_str(&json)
    }
}
