pub mod heuristic;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{Product, ProductRole, Selection};
use crate::error::PatabaError;
use crate::model::{Npk, Nutrient};

pub use heuristic::ThreePhaseHeuristic;

/// What to do when a product role the plan needs has no product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationPolicy {
    /// Return an empty plan if any role is missing.
    #[default]
    AllOrNothing,
    /// Keep the rows that can be bought and report the unmet nutrients.
    Partial,
}

/// One product line of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRow {
    pub product: Product,
    pub role: ProductRole,
    /// Bag count, 2 decimal places.
    pub bags: Decimal,
    /// `bags * price_per_bag`, 2 decimal places.
    pub subtotal: Decimal,
}

/// Bag quantities and cost for a nutrient target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub target_kg: Npk,
    pub rows: Vec<AllocationRow>,
    pub supplied_kg: Npk,
    pub total_cost: Decimal,
    /// Roles the catalog had no product for.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_roles: Vec<ProductRole>,
    /// Nutrients whose target the plan does not reach.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unmet: Vec<Nutrient>,
}

impl AllocationResult {
    /// A plan with no rows, used when allocation cannot proceed.
    pub fn empty(target_kg: Npk) -> Self {
        Self {
            target_kg,
            rows: Vec::new(),
            supplied_kg: Npk::default(),
            total_cost: Decimal::ZERO,
            missing_roles: Vec::new(),
            unmet: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, role: ProductRole) -> Option<&AllocationRow> {
        self.rows.iter().find(|r| r.role == role)
    }
}

/// Turns a kg target and selected products into bag quantities.
pub trait AllocationStrategy: Send + Sync {
    fn allocate(&self, target: &Npk, selection: &Selection)
        -> Result<AllocationResult, PatabaError>;

    /// Name of this strategy (for diagnostics).
    fn name(&self) -> &str;
}

/// Allocate with the default three-phase heuristic and all-or-nothing policy.
pub fn allocate(target: &Npk, selection: &Selection) -> Result<AllocationResult, PatabaError> {
    ThreePhaseHeuristic::default().allocate(target, selection)
}
