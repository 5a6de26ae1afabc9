//! Economic engine.
//!
//! Each country's delta depends only on its own stats, so deltas are
//! computed in parallel and then folded into the game state one country at a
//! time, in country order.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{InvariantViolation, TurnError};
use crate::state::{CountryId, CountryStats, GameState, ResourceKind, ALL_RESOURCES, RESOURCE_COUNT};

/// Production multiplier in force from `min_level` upward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TechBand {
    pub min_level: u32,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Budget raised per inhabitant.
    pub tax_per_capita: f64,
    /// Fractional tax boost per infrastructure level.
    pub infrastructure_tax_bonus: f64,
    /// Base yield per 1000 inhabitants.
    pub base_yield: BTreeMap<ResourceKind, f64>,
    /// Discrete technology multipliers, ascending by `min_level`.
    pub tech_bands: Vec<TechBand>,
    /// Food eaten per 1000 inhabitants.
    pub food_per_thousand: f64,
    /// Food eaten per point of military strength.
    pub food_per_strength: f64,
    /// Budget upkeep per point of military strength.
    pub upkeep_per_strength: f64,
    /// Budget maintenance per infrastructure level.
    pub maintenance_per_infrastructure: f64,
    /// Fraction of a positive budget lost to administration each turn.
    pub budget_maintenance_rate: f64,
    /// Population growth rate on a food surplus.
    pub growth_rate: f64,
    /// Food coverage ratio below which a country starves.
    pub starvation_threshold: f64,
    /// Population fraction lost while starving.
    pub starvation_decline: f64,
    /// Fraction of non-food stock lost while starving.
    pub starvation_resource_decay: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        use ResourceKind::*;

        EconomyConfig {
            tax_per_capita: 0.05,
            infrastructure_tax_bonus: 0.05,
            base_yield: [
                (Food, 12.0),
                (Timber, 4.0),
                (Iron, 3.0),
                (Copper, 2.0),
                (Coal, 3.0),
                (Oil, 1.5),
                (Steel, 1.0),
                (Gold, 0.5),
            ]
            .into_iter()
            .collect(),
            tech_bands: vec![
                TechBand { min_level: 0, multiplier: 1.0 },
                TechBand { min_level: 3, multiplier: 1.25 },
                TechBand { min_level: 6, multiplier: 1.5 },
                TechBand { min_level: 10, multiplier: 1.8 },
            ],
            food_per_thousand: 10.0,
            food_per_strength: 0.1,
            upkeep_per_strength: 0.5,
            maintenance_per_infrastructure: 10.0,
            budget_maintenance_rate: 0.01,
            growth_rate: 0.02,
            starvation_threshold: 1.0,
            starvation_decline: 0.05,
            starvation_resource_decay: 0.02,
        }
    }
}

impl EconomyConfig {
    /// Production multiplier for `tech_level`. Stepwise, not continuous.
    pub fn tech_multiplier(&self, tech_level: u32) -> f64 {
        self.tech_bands
            .iter()
            .rev()
            .find(|band| band.min_level <= tech_level)
            .map_or(1.0, |band| band.multiplier)
    }
}

/// One country's change for the turn. Computed, never applied in place.
#[derive(Debug, Clone, PartialEq)]
pub struct EconomicDelta {
    pub country: CountryId,
    pub tax: i64,
    pub upkeep: i64,
    pub maintenance: i64,
    pub budget: i64,
    pub population: i64,
    pub resources: [i64; RESOURCE_COUNT],
    pub starving: bool,
}

impl EconomicDelta {
    pub fn resource(&self, kind: ResourceKind) -> i64 {
        self.resources[kind as usize]
    }
}

/// Computes the turn's economic delta for one country.
pub fn compute_delta(stats: &CountryStats, config: &EconomyConfig) -> EconomicDelta {
    let population = stats.population as f64;
    let thousands = population / 1000.0;

    let tax = (population
        * config.tax_per_capita
        * (1.0 + stats.infrastructure_level as f64 * config.infrastructure_tax_bonus))
        .floor() as i64;
    let upkeep = (stats.military_strength.max(0.0) * config.upkeep_per_strength).ceil() as i64;
    let maintenance = (stats.infrastructure_level as f64 * config.maintenance_per_infrastructure
        + stats.budget.max(0) as f64 * config.budget_maintenance_rate)
        .ceil() as i64;
    // The economy never pushes the treasury below zero.
    let budget = (tax - upkeep - maintenance).max(-stats.budget.max(0));

    let tech = config.tech_multiplier(stats.tech_level);
    let mut resources = [0i64; RESOURCE_COUNT];
    for kind in ALL_RESOURCES {
        let base = config.base_yield.get(&kind).copied().unwrap_or(0.0);
        let produced = base * thousands * tech * stats.profile.production_modifier(kind);
        resources[kind as usize] = produced.max(0.0).floor() as i64;
    }

    let food_needed = (thousands * config.food_per_thousand
        + stats.military_strength.max(0.0) * config.food_per_strength)
        .ceil() as i64;
    let food_stock = stats.resources.get(ResourceKind::Food) as i64;
    let food_available = food_stock + resources[ResourceKind::Food as usize];
    let coverage = if food_needed == 0 {
        f64::INFINITY
    } else {
        food_available as f64 / food_needed as f64
    };

    let starving = coverage < config.starvation_threshold;
    let population_change;
    if starving {
        resources[ResourceKind::Food as usize] = -food_stock;
        let lost = (population * config.starvation_decline).ceil() as i64;
        population_change = -lost.min(stats.population as i64);
        for kind in ALL_RESOURCES {
            if kind == ResourceKind::Food {
                continue;
            }
            let stock = stats.resources.get(kind) as f64;
            let decay = (stock * config.starvation_resource_decay).floor() as i64;
            resources[kind as usize] -= decay;
        }
    } else {
        let surplus = resources[ResourceKind::Food as usize] - food_needed;
        resources[ResourceKind::Food as usize] = surplus.max(-food_stock);
        population_change = if surplus > 0 {
            (population * config.growth_rate).floor() as i64
        } else {
            0
        };
    }

    EconomicDelta {
        country: stats.country,
        tax,
        upkeep,
        maintenance,
        budget,
        population: population_change,
        resources,
        starving,
    }
}

/// Folds a delta into `stats`. Any quantity going negative is an error.
pub fn apply_economic_delta(
    stats: &CountryStats,
    delta: &EconomicDelta,
) -> Result<CountryStats, InvariantViolation> {
    let mut next = stats.clone();
    next.budget += delta.budget;

    next.population = offset(stats.population, delta.population).ok_or(
        InvariantViolation::NegativePopulation {
            country: stats.country,
            available: stats.population,
            requested: delta.population.unsigned_abs(),
        },
    )?;

    for kind in ALL_RESOURCES {
        let change = delta.resource(kind);
        let have = stats.resources.get(kind);
        let updated = offset(have, change).ok_or(InvariantViolation::NegativeResource {
            country: stats.country,
            resource: kind,
            available: have,
            requested: change.unsigned_abs(),
        })?;
        next.resources.set(kind, updated);
    }
    Ok(next)
}

fn offset(value: u64, change: i64) -> Option<u64> {
    if change >= 0 {
        Some(value.saturating_add(change as u64))
    } else {
        value.checked_sub(change.unsigned_abs())
    }
}

/// Runs the economic pass for every active country and folds the results.
pub fn run_economy(
    state: &mut GameState,
    config: &EconomyConfig,
) -> Result<Vec<EconomicDelta>, TurnError> {
    let rows: Vec<&CountryStats> = state
        .all_stats()
        .filter(|s| !state.is_eliminated(s.country))
        .collect();
    let deltas: Vec<EconomicDelta> = rows.par_iter().map(|s| compute_delta(s, config)).collect();

    for delta in &deltas {
        let Some(stats) = state.stats(delta.country) else {
            continue;
        };
        let next = apply_economic_delta(stats, delta)?;
        debug!(
            country = %delta.country,
            budget = delta.budget,
            population = delta.population,
            starving = delta.starving,
            "economy applied"
        );
        state.with_updated_stats(delta.country, next)?;
    }
    Ok(deltas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Controller, Country, ResourceInventory, ResourceProfile, TurnSnapshot};

    fn stats(pop: u64, food: u64) -> CountryStats {
        let mut s = CountryStats::new(CountryId(1));
        s.population = pop;
        s.budget = 1000;
        s.tech_level = 1;
        s.infrastructure_level = 2;
        s.military_strength = 50.0;
        s.resources =
            ResourceInventory::from_pairs(&[(ResourceKind::Food, food), (ResourceKind::Iron, 100)]);
        s
    }

    #[test]
    fn tech_multiplier_is_stepwise() {
        let cfg = EconomyConfig::default();
        assert_eq!(cfg.tech_multiplier(0), 1.0);
        assert_eq!(cfg.tech_multiplier(2), 1.0);
        assert_eq!(cfg.tech_multiplier(3), 1.25);
        assert_eq!(cfg.tech_multiplier(9), 1.5);
        assert_eq!(cfg.tech_multiplier(50), 1.8);
    }

    #[test]
    fn fed_country_grows() {
        let cfg = EconomyConfig::default();
        let s = stats(10_000, 200);
        let d = compute_delta(&s, &cfg);
        // tax 10000 × 0.05 × 1.1 = 550; upkeep 25; maintenance 20 + 10
        assert_eq!(d.tax, 550);
        assert_eq!(d.upkeep, 25);
        assert_eq!(d.maintenance, 30);
        assert_eq!(d.budget, 495);
        // food: produce 120, eat 100 + 5
        assert_eq!(d.resource(ResourceKind::Food), 15);
        assert_eq!(d.resource(ResourceKind::Iron), 30);
        assert_eq!(d.population, 200);
        assert!(!d.starving);
    }

    #[test]
    fn starving_country_shrinks_and_decays() {
        let mut cfg = EconomyConfig::default();
        cfg.base_yield.insert(ResourceKind::Food, 0.0);
        let s = stats(10_000, 20);
        let d = compute_delta(&s, &cfg);
        assert!(d.starving);
        assert_eq!(d.resource(ResourceKind::Food), -20);
        assert_eq!(d.population, -500);
        assert_eq!(d.resource(ResourceKind::Iron), 30 - 2);

        let after = apply_economic_delta(&s, &d).unwrap();
        assert_eq!(after.resources.get(ResourceKind::Food), 0);
        assert_eq!(after.population, 9_500);
    }

    #[test]
    fn stock_covers_deficit_without_growth() {
        let mut cfg = EconomyConfig::default();
        cfg.base_yield.insert(ResourceKind::Food, 5.0);
        let s = stats(10_000, 500);
        let d = compute_delta(&s, &cfg);
        assert!(!d.starving);
        assert_eq!(d.resource(ResourceKind::Food), 50 - 105);
        assert_eq!(d.population, 0);
    }

    #[test]
    fn profile_scales_production() {
        let cfg = EconomyConfig::default();
        let mut s = stats(10_000, 200);
        s.profile = ResourceProfile::petrostate();
        let d = compute_delta(&s, &cfg);
        assert_eq!(d.resource(ResourceKind::Oil), 24);
    }

    #[test]
    fn budget_never_driven_negative() {
        let cfg = EconomyConfig::default();
        let mut s = stats(0, 0);
        s.budget = 10;
        s.military_strength = 500.0;
        let d = compute_delta(&s, &cfg);
        assert_eq!(d.budget, -10);
        assert_eq!(apply_economic_delta(&s, &d).unwrap().budget, 0);
    }

    #[test]
    fn delta_is_pure() {
        let cfg = EconomyConfig::default();
        let s = stats(7_500, 80);
        assert_eq!(compute_delta(&s, &cfg), compute_delta(&s, &cfg));
    }

    #[test]
    fn run_economy_skips_eliminated() {
        let countries = vec![
            Country::new(CountryId(1), "Avalon", Controller::Ai),
            Country::new(CountryId(2), "Brisa", Controller::Ai),
        ];
        let a = stats(10_000, 200);
        let mut b = stats(10_000, 200);
        b.country = CountryId(2);
        let mut state = GameState::from_snapshot(TurnSnapshot {
            turn: 0,
            countries,
            stats: vec![a, b.clone()],
            cities: Vec::new(),
            pending_actions: Vec::new(),
            deals: Vec::new(),
            eliminated: vec![CountryId(2)],
            next_action_id: 0,
        })
        .unwrap();
        let deltas = run_economy(&mut state, &EconomyConfig::default()).unwrap();
        assert_eq!(deltas.len(), 1);
        assert_eq!(state.stats(CountryId(1)).unwrap().budget, 1495);
        assert_eq!(state.stats(CountryId(2)).unwrap(), &b);
        assert_eq!(state.stats_revision(), 1);
    }
}
