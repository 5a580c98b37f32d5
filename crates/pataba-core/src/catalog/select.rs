use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Product;
use crate::model::Nutrient;

/// The part a product plays in a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductRole {
    /// Supplies N, P and K.
    Balanced,
    /// Supplies N only.
    NOnly,
    /// Supplies K only.
    KOnly,
}

impl ProductRole {
    pub const ALL: [ProductRole; 3] = [ProductRole::Balanced, ProductRole::NOnly, ProductRole::KOnly];

    /// The nutrient a role is bought for, and priced by.
    pub fn defining_nutrient(&self) -> Nutrient {
        match self {
            ProductRole::Balanced => Nutrient::Phosphorus,
            ProductRole::NOnly => Nutrient::Nitrogen,
            ProductRole::KOnly => Nutrient::Potassium,
        }
    }

    /// Which role a product qualifies for, if any.
    pub fn of(product: &Product) -> Option<ProductRole> {
        let pct = &product.nutrient_percent;
        let zero = Decimal::ZERO;
        match (pct.n > zero, pct.p > zero, pct.k > zero) {
            (true, true, true) => Some(ProductRole::Balanced),
            (true, false, false) => Some(ProductRole::NOnly),
            (false, false, true) => Some(ProductRole::KOnly),
            _ => None,
        }
    }
}

impl fmt::Display for ProductRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductRole::Balanced => write!(f, "balanced"),
            ProductRole::NOnly => write!(f, "N-only"),
            ProductRole::KOnly => write!(f, "K-only"),
        }
    }
}

/// Cheapest product per role. A `None` field means the catalog has no
/// qualifying product for that role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub balanced: Option<Product>,
    pub n_only: Option<Product>,
    pub k_only: Option<Product>,
}

impl Selection {
    pub fn get(&self, role: ProductRole) -> Option<&Product> {
        match role {
            ProductRole::Balanced => self.balanced.as_ref(),
            ProductRole::NOnly => self.n_only.as_ref(),
            ProductRole::KOnly => self.k_only.as_ref(),
        }
    }

    fn slot(&mut self, role: ProductRole) -> &mut Option<Product> {
        match role {
            ProductRole::Balanced => &mut self.balanced,
            ProductRole::NOnly => &mut self.n_only,
            ProductRole::KOnly => &mut self.k_only,
        }
    }

    /// Roles with no product.
    pub fn missing(&self) -> Vec<ProductRole> {
        ProductRole::ALL
            .into_iter()
            .filter(|role| self.get(*role).is_none())
            .collect()
    }
}

/// Partition products into roles and pick the cheapest per kg of each
/// role's defining nutrient. Equal cost is broken by code so the choice
/// does not depend on catalog order.
pub fn select(products: &[Product]) -> Selection {
    let mut selection = Selection::default();
    let mut best_cost: [Option<Decimal>; 3] = [None; 3];

    for product in products {
        let Some(role) = ProductRole::of(product) else {
            continue;
        };
        let Some(cost) = product.cost_per_kg(role.defining_nutrient()) else {
            continue;
        };

        let idx = role as usize;
        let replace = match (&best_cost[idx], selection.get(role)) {
            (Some(best), Some(current)) => {
                cost < *best || (cost == *best && product.code < current.code)
            }
            _ => true,
        };
        if replace {
            best_cost[idx] = Some(cost);
            *selection.slot(role) = Some(product.clone());
        }
    }

    for role in ProductRole::ALL {
        match selection.get(role) {
            Some(p) => tracing::debug!(%role, code = %p.code, "selected product"),
            None => tracing::debug!(%role, "no qualifying product"),
        }
    }

    selection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Npk;
    use rust_decimal_macros::dec;

    fn product(code: &str, price: Decimal, n: Decimal, p: Decimal, k: Decimal) -> Product {
        Product {
            code: code.into(),
            label: code.into(),
            price_per_bag: price,
            bag_weight_kg: dec!(50),
            nutrient_percent: Npk::new(n, p, k),
            active: true,
        }
    }

    #[test]
    fn test_role_partition() {
        let complete = product("14-14-14", dec!(1400), dec!(14), dec!(14), dec!(14));
        let urea = product("46-0-0", dec!(1500), dec!(46), dec!(0), dec!(0));
        let mop = product("0-0-60", dec!(1700), dec!(0), dec!(0), dec!(60));
        let dap = product("18-46-0", dec!(1800), dec!(18), dec!(46), dec!(0));
        let empty = product("X", dec!(100), dec!(0), dec!(0), dec!(0));
        assert_eq!(ProductRole::of(&complete), Some(ProductRole::Balanced));
        assert_eq!(ProductRole::of(&urea), Some(ProductRole::NOnly));
        assert_eq!(ProductRole::of(&mop), Some(ProductRole::KOnly));
        assert_eq!(ProductRole::of(&dap), None);
        assert_eq!(ProductRole::of(&empty), None);
    }

    #[test]
    fn test_cheapest_per_kg_wins() {
        // 14-14-14 at 1400: 200/kg P. 16-16-16 at 1500: 187.5/kg P.
        let products = vec![
            product("14-14-14", dec!(1400), dec!(14), dec!(14), dec!(14)),
            product("16-16-16", dec!(1500), dec!(16), dec!(16), dec!(16)),
            // cheaper per bag but dearer per kg N
            product("21-0-0", dec!(900), dec!(21), dec!(0), dec!(0)),
            product("46-0-0", dec!(1500), dec!(46), dec!(0), dec!(0)),
        ];
        let sel = select(&products);
        assert_eq!(sel.balanced.unwrap().code, "16-16-16");
        assert_eq!(sel.n_only.unwrap().code, "46-0-0");
        assert!(sel.k_only.is_none());
    }

    #[test]
    fn test_tie_broken_by_code() {
        let products = vec![
            product("B", dec!(1700), dec!(0), dec!(0), dec!(60)),
            product("A", dec!(1700), dec!(0), dec!(0), dec!(60)),
        ];
        assert_eq!(select(&products).k_only.unwrap().code, "A");
    }

    #[test]
    fn test_missing_roles() {
        let products = vec![product("46-0-0", dec!(1500), dec!(46), dec!(0), dec!(0))];
        let sel = select(&products);
        assert_eq!(sel.missing(), vec![ProductRole::Balanced, ProductRole::KOnly]);
    }

    #[test]
    fn test_empty_catalog() {
        assert_eq!(select(&[]), Selection::default());
    }
}
