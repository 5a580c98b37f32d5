use rust_decimal::Decimal;

use super::{AllocationPolicy, AllocationResult, AllocationRow, AllocationStrategy};
use crate::catalog::{Product, ProductRole, Selection};
use crate::error::PatabaError;
use crate::model::{round2, round_bags_up, Npk, Nutrient};

/// Fixed-order greedy allocation.
///
/// 1. Buy the balanced product to cover the P target exactly.
/// 2. Top up the remaining N with the N-only product.
/// 3. Top up the remaining K with the K-only product.
///
/// The balanced product is sized to P alone, never to N or K.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreePhaseHeuristic {
    pub policy: AllocationPolicy,
}

impl ThreePhaseHeuristic {
    pub fn new(policy: AllocationPolicy) -> Self {
        Self { policy }
    }
}

impl AllocationStrategy for ThreePhaseHeuristic {
    fn allocate(
        &self,
        target: &Npk,
        selection: &Selection,
    ) -> Result<AllocationResult, PatabaError> {
        if let Some(nutrient) = Nutrient::ALL
            .into_iter()
            .find(|n| target.get(*n).is_sign_negative())
        {
            return Err(PatabaError::InvalidInput(format!(
                "negative {nutrient} target {}",
                target.get(nutrient)
            )));
        }

        if selection.balanced.is_none() && target.p > Decimal::ZERO {
            return Err(PatabaError::CatalogInsufficient {
                nutrient: Nutrient::Phosphorus,
                category: "balanced",
            });
        }

        let missing = selection.missing();
        if self.policy == AllocationPolicy::AllOrNothing && !missing.is_empty() {
            tracing::debug!(?missing, "product role missing, returning empty plan");
            let mut result = AllocationResult::empty(*target);
            result.unmet = Nutrient::ALL
                .into_iter()
                .filter(|n| target.get(*n) > Decimal::ZERO)
                .collect();
            result.missing_roles = missing;
            return Ok(result);
        }

        let mut plan = PlanAccumulator::default();

        // Phase 1: balanced product sized to the P target.
        if let Some(balanced) = &selection.balanced {
            let bags = bags_for(target.p, balanced.kg_per_bag(Nutrient::Phosphorus));
            tracing::debug!(code = %balanced.code, %bags, "phase 1: balanced");
            plan.add(balanced, ProductRole::Balanced, bags);
        }

        // Phase 2: N top-up.
        let remaining_n = (target.n - plan.supplied.n).max(Decimal::ZERO);
        if let Some(n_only) = &selection.n_only {
            let bags = bags_for(remaining_n, n_only.kg_per_bag(Nutrient::Nitrogen));
            tracing::debug!(code = %n_only.code, %remaining_n, %bags, "phase 2: N top-up");
            plan.add(n_only, ProductRole::NOnly, bags);
        }

        // Phase 3: K top-up.
        let remaining_k = (target.k - plan.supplied.k).max(Decimal::ZERO);
        if let Some(k_only) = &selection.k_only {
            let bags = bags_for(remaining_k, k_only.kg_per_bag(Nutrient::Potassium));
            tracing::debug!(code = %k_only.code, %remaining_k, %bags, "phase 3: K top-up");
            plan.add(k_only, ProductRole::KOnly, bags);
        }

        let unmet = Nutrient::ALL
            .into_iter()
            .filter(|n| plan.supplied.get(*n) < target.get(*n))
            .collect();

        Ok(AllocationResult {
            target_kg: *target,
            total_cost: round2(plan.cost),
            rows: plan.rows,
            supplied_kg: plan.supplied,
            missing_roles: missing,
            unmet,
        })
    }

    fn name(&self) -> &str {
        "three-phase"
    }
}

#[derive(Default)]
struct PlanAccumulator {
    rows: Vec<AllocationRow>,
    supplied: Npk,
    cost: Decimal,
}

impl PlanAccumulator {
    /// Record a row. Zero-bag rows are dropped.
    fn add(&mut self, product: &Product, role: ProductRole, bags: Decimal) {
        if bags <= Decimal::ZERO {
            return;
        }
        let supplied = Npk::new(
            bags * product.kg_per_bag(Nutrient::Nitrogen),
            bags * product.kg_per_bag(Nutrient::Phosphorus),
            bags * product.kg_per_bag(Nutrient::Potassium),
        );
        let cost = bags * product.price_per_bag;
        self.supplied = self.supplied + supplied;
        self.cost += cost;
        self.rows.push(AllocationRow {
            product: product.clone(),
            role,
            bags,
            subtotal: round2(cost),
        });
    }
}

fn bags_for(kg: Decimal, kg_per_bag: Decimal) -> Decimal {
    if kg <= Decimal::ZERO || kg_per_bag <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    round_bags_up(kg / kg_per_bag)
}
