//! Pure cost computation: required resources, affordability, budget cost.
//!
//! None of these functions touch game state. Calling them twice with the
//! same inputs yields the same result.

use crate::error::InvariantViolation;
use crate::state::{ActionKind, CountryStats, MilitaryAction, ResourceInventory, ResourceKind};

use super::tiers::{CostCategory, PricingConfig};

/// Result of comparing required resources against an inventory.
#[derive(Debug, Clone, PartialEq)]
pub struct Affordability {
    pub can_afford: bool,
    /// Shortfall per insufficient resource, in resource order.
    pub missing: Vec<(ResourceKind, u64)>,
    /// 1.0 when affordable; grows per missing resource type up to the cap.
    pub penalty_multiplier: f64,
}

/// Everything needed to approve and charge one action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionPricing {
    pub category: CostCategory,
    pub required: Vec<(ResourceKind, u64)>,
    pub affordability: Affordability,
    /// Base budget cost before modifiers (already scaled by unit count).
    pub base_cost: i64,
    /// Level and profile modifiers combined.
    pub modifier: f64,
    /// base × modifier × penalty, rounded.
    pub total_cost: i64,
}

/// Number of units an action is priced for.
fn unit_count(kind: &ActionKind) -> u64 {
    match kind {
        ActionKind::Military(MilitaryAction::Recruit { units }) => u64::from(*units),
        _ => 1,
    }
}

/// Returns the resource basket `kind` needs from a country with `stats`.
///
/// Quantities come from the band in force for the country's level, scaled
/// by unit count and the profile's per-resource cost modifier (rounded up).
pub fn required_resources(
    kind: &ActionKind,
    stats: &CountryStats,
    pricing: &PricingConfig,
) -> Vec<(ResourceKind, u64)> {
    let category = CostCategory::of(kind);
    let table = pricing.category(category);
    let Some((_, band)) = table.band_for(category.level(stats)) else {
        return Vec::new();
    };
    let units = unit_count(kind);

    band.basket
        .iter()
        .map(|(&resource, &qty)| {
            let scaled = qty.saturating_mul(units) as f64 * stats.profile.cost_modifier(resource);
            (resource, (scaled - 1e-9).ceil().max(0.0) as u64)
        })
        .filter(|&(_, qty)| qty > 0)
        .collect()
}

/// Compares `required` against `available`.
pub fn check_affordability(
    required: &[(ResourceKind, u64)],
    available: &ResourceInventory,
    pricing: &PricingConfig,
) -> Affordability {
    let missing: Vec<(ResourceKind, u64)> = required
        .iter()
        .filter_map(|&(resource, qty)| {
            let have = available.get(resource);
            (have < qty).then(|| (resource, qty - have))
        })
        .collect();

    let penalty_multiplier = if missing.is_empty() {
        1.0
    } else {
        (1.0 + pricing.penalty_per_missing * missing.len() as f64).min(pricing.penalty_cap)
    };

    Affordability {
        can_afford: missing.is_empty(),
        missing,
        penalty_multiplier,
    }
}

/// Prices `kind` for a country in its current state.
pub fn price_action(
    kind: &ActionKind,
    stats: &CountryStats,
    pricing: &PricingConfig,
) -> ActionPricing {
    let category = CostCategory::of(kind);
    let table = pricing.category(category);
    let required = required_resources(kind, stats, pricing);
    let affordability = check_affordability(&required, &stats.resources, pricing);

    let base_cost = table.base_cost.saturating_mul(unit_count(kind) as i64);
    let modifier = table.level_modifier(category.level(stats)) * stats.profile.action_cost;
    let total_cost =
        (base_cost as f64 * modifier * affordability.penalty_multiplier).round() as i64;

    ActionPricing {
        category,
        required,
        affordability,
        base_cost,
        modifier,
        total_cost,
    }
}

/// Charges an approved action. Budget is always deducted; resources are
/// deducted only when the pricing says they were affordable.
pub fn apply_action_cost(
    pricing: &ActionPricing,
    stats: &CountryStats,
) -> Result<CountryStats, InvariantViolation> {
    let mut next = stats.clone();
    next.budget -= pricing.total_cost;

    if pricing.affordability.can_afford {
        for &(resource, qty) in &pricing.required {
            let available = next.resources.get(resource);
            if next.resources.checked_remove(resource, qty).is_none() {
                return Err(InvariantViolation::NegativeResource {
                    country: stats.country,
                    resource,
                    available,
                    requested: qty,
                });
            }
        }
    }

    Ok(next)
}
