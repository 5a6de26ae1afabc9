//! Tiered pricing tables.
//!
//! Each action category has a base budget cost and an ordered list of level
//! bands. A band holds a fixed resource basket; the band in force is the last
//! one whose `min_level` does not exceed the country's relevant level. Baskets
//! change discretely between bands rather than scaling smoothly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::state::{ActionKind, CountryStats, MilitaryAction, ResourceKind};

/// Pricing bucket an action falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CostCategory {
    Research,
    Infrastructure,
    Recruit,
    Attack,
    Defend,
    Diplomacy,
}

impl CostCategory {
    /// Maps an action kind to its pricing bucket. Both infrastructure
    /// variants share one table.
    pub fn of(kind: &ActionKind) -> CostCategory {
        match kind {
            ActionKind::Research => CostCategory::Research,
            ActionKind::Infrastructure | ActionKind::Economic(_) => CostCategory::Infrastructure,
            ActionKind::Military(MilitaryAction::Recruit { .. }) => CostCategory::Recruit,
            ActionKind::Military(MilitaryAction::Attack { .. }) => CostCategory::Attack,
            ActionKind::Military(MilitaryAction::Defend { .. }) => CostCategory::Defend,
            ActionKind::Diplomacy(_) => CostCategory::Diplomacy,
        }
    }

    /// The level that selects the band and drives cost growth.
    pub fn level(self, stats: &CountryStats) -> u32 {
        match self {
            CostCategory::Infrastructure => stats.infrastructure_level,
            _ => stats.tech_level,
        }
    }
}

/// One level band and the basket it requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBand {
    pub min_level: u32,
    pub basket: BTreeMap<ResourceKind, u64>,
}

impl TierBand {
    pub fn new(min_level: u32, basket: &[(ResourceKind, u64)]) -> Self {
        TierBand {
            min_level,
            basket: basket.iter().copied().collect(),
        }
    }
}

/// Base cost and bands for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPricing {
    /// Budget cost at level 0 (per unit for recruitment).
    pub base_cost: i64,
    /// Fractional budget-cost growth per level.
    #[serde(default)]
    pub cost_growth_per_level: f64,
    /// Bands in ascending `min_level` order. Empty means no resources needed.
    #[serde(default)]
    pub bands: Vec<TierBand>,
}

impl CategoryPricing {
    /// Returns the index and band in force at `level`, if any.
    pub fn band_for(&self, level: u32) -> Option<(usize, &TierBand)> {
        self.bands
            .iter()
            .enumerate()
            .rev()
            .find(|(_, band)| band.min_level <= level)
    }

    /// Level-scaled cost multiplier, before profile and penalty.
    pub fn level_modifier(&self, level: u32) -> f64 {
        1.0 + self.cost_growth_per_level * level as f64
    }
}

/// All pricing tables plus the shortage penalty curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub research: CategoryPricing,
    pub infrastructure: CategoryPricing,
    pub recruit: CategoryPricing,
    pub attack: CategoryPricing,
    pub defend: CategoryPricing,
    pub diplomacy: CategoryPricing,
    /// Penalty added per insufficient resource type.
    pub penalty_per_missing: f64,
    /// Upper bound on the penalty multiplier.
    pub penalty_cap: f64,
}

impl PricingConfig {
    pub fn category(&self, category: CostCategory) -> &CategoryPricing {
        match category {
            CostCategory::Research => &self.research,
            CostCategory::Infrastructure => &self.infrastructure,
            CostCategory::Recruit => &self.recruit,
            CostCategory::Attack => &self.attack,
            CostCategory::Defend => &self.defend,
            CostCategory::Diplomacy => &self.diplomacy,
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        use ResourceKind::*;

        PricingConfig {
            research: CategoryPricing {
                base_cost: 500,
                cost_growth_per_level: 0.1,
                bands: vec![
                    TierBand::new(0, &[(Copper, 10), (Coal, 10)]),
                    TierBand::new(3, &[(Copper, 15), (Coal, 10), (Oil, 5)]),
                    TierBand::new(6, &[(Copper, 20), (Oil, 10), (Steel, 10)]),
                ],
            },
            infrastructure: CategoryPricing {
                base_cost: 400,
                cost_growth_per_level: 0.1,
                bands: vec![
                    TierBand::new(0, &[(Timber, 20), (Iron, 10)]),
                    TierBand::new(3, &[(Iron, 15), (Steel, 10), (Coal, 10)]),
                    TierBand::new(6, &[(Steel, 20), (Oil, 10), (Copper, 10)]),
                ],
            },
            recruit: CategoryPricing {
                base_cost: 20,
                cost_growth_per_level: 0.05,
                bands: vec![
                    TierBand::new(0, &[(Iron, 2), (Timber, 2)]),
                    TierBand::new(3, &[(Iron, 2), (Steel, 1), (Oil, 1)]),
                    TierBand::new(6, &[(Steel, 2), (Oil, 2), (Copper, 1)]),
                ],
            },
            attack: CategoryPricing {
                base_cost: 150,
                cost_growth_per_level: 0.05,
                bands: vec![
                    TierBand::new(0, &[(Food, 20), (Iron, 5)]),
                    TierBand::new(3, &[(Food, 20), (Oil, 10)]),
                    TierBand::new(6, &[(Food, 20), (Oil, 15), (Steel, 5)]),
                ],
            },
            defend: CategoryPricing {
                base_cost: 0,
                cost_growth_per_level: 0.0,
                bands: Vec::new(),
            },
            diplomacy: CategoryPricing {
                base_cost: 100,
                cost_growth_per_level: 0.0,
                bands: Vec::new(),
            },
            penalty_per_missing: 0.4,
            penalty_cap: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{CityId, CountryId};

    #[test]
    fn band_selection_is_stepwise() {
        let cfg = PricingConfig::default();
        let research = &cfg.research;
        assert_eq!(research.band_for(0).unwrap().0, 0);
        assert_eq!(research.band_for(2).unwrap().0, 0);
        assert_eq!(research.band_for(3).unwrap().0, 1);
        assert_eq!(research.band_for(5).unwrap().0, 1);
        assert_eq!(research.band_for(40).unwrap().0, 2);
    }

    #[test]
    fn empty_bands_have_no_basket() {
        let cfg = PricingConfig::default();
        assert!(cfg.diplomacy.band_for(10).is_none());
    }

    #[test]
    fn infrastructure_keys_on_infrastructure_level() {
        let mut stats = CountryStats::new(CountryId(1));
        stats.tech_level = 7;
        stats.infrastructure_level = 2;
        assert_eq!(CostCategory::Infrastructure.level(&stats), 2);
        assert_eq!(CostCategory::Research.level(&stats), 7);
    }

    #[test]
    fn categories_of_action_kinds() {
        let attack = ActionKind::Military(MilitaryAction::Attack {
            target_city: CityId(1),
            strength: 10.0,
        });
        assert_eq!(CostCategory::of(&attack), CostCategory::Attack);
        assert_eq!(
            CostCategory::of(&ActionKind::Economic(crate::state::EconomicAction::Infrastructure)),
            CostCategory::Infrastructure
        );
    }

    #[test]
    fn partial_json_override_keeps_defaults() {
        let cfg: PricingConfig = serde_json::from_str(r#"{"penalty_cap": 3.0}"#).unwrap();
        assert_eq!(cfg.penalty_cap, 3.0);
        assert_eq!(cfg.research.base_cost, 500);
    }
}
