//! AI action proposals.
//!
//! A planner only proposes. Its actions are queued like any submitted action
//! and go through the same validation, pricing, and gating.

use crate::config::RulesConfig;
use crate::cost::{apply_action_cost, price_action};
use crate::resolve::combat::{effective_strength, max_effective_strength};
use crate::resolve::diplomacy::{get_score, RELATION_NEUTRAL};
use crate::state::{ActionKind, CityId, CountryId, CountryStats, GameState, MilitaryAction};

/// Source of proposed actions for countries that submitted none.
pub trait ActionPlanner: Send + Sync {
    fn plan(&self, country: CountryId, state: &GameState, rules: &RulesConfig) -> Vec<ActionKind>;
}

/// Greedy planner: at most one attack, then research, infrastructure, and
/// recruitment while the budget and stockpile allow.
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicPlanner {
    /// Attack countries whose relation score is below this.
    pub hostility_threshold: i32,
    /// Or whose defended strength this country exceeds by this ratio.
    pub dominance_ratio: f64,
    /// Share of current strength committed to an attack.
    pub attack_share: f64,
    pub recruit_units: u32,
}

impl Default for HeuristicPlanner {
    fn default() -> Self {
        HeuristicPlanner {
            hostility_threshold: 40,
            dominance_ratio: 2.5,
            attack_share: 0.6,
            recruit_units: 10,
        }
    }
}

impl HeuristicPlanner {
    /// Picks the weakest city of the most attractive rival, if any.
    fn pick_target(
        &self,
        country: CountryId,
        stats: &CountryStats,
        state: &GameState,
        rules: &RulesConfig,
    ) -> Option<CityId> {
        let own = max_effective_strength(stats, &rules.combat);
        let mut best: Option<(f64, CityId)> = None;

        for rival in state.active_countries().filter(|c| c.id != country) {
            let Some(rival_stats) = state.stats(rival.id) else {
                continue;
            };
            let score = get_score(&stats.relations, rival.id, RELATION_NEUTRAL);
            let defended = effective_strength(
                rival_stats.military_strength,
                rival_stats.tech_level,
                &rules.combat,
            ) * rules.combat.home_advantage;
            let ratio = if defended > 0.0 { own / defended } else { f64::INFINITY };
            if score >= self.hostility_threshold && ratio <= self.dominance_ratio {
                continue;
            }
            let Some(city) = state
                .cities_of(rival.id)
                .min_by_key(|c| (c.population, c.id))
            else {
                continue;
            };
            if best.map_or(true, |(r, _)| ratio > r) {
                best = Some((ratio, city.id));
            }
        }
        best.map(|(_, city)| city)
    }
}

impl ActionPlanner for HeuristicPlanner {
    fn plan(&self, country: CountryId, state: &GameState, rules: &RulesConfig) -> Vec<ActionKind> {
        let Some(stats) = state.stats(country) else {
            return Vec::new();
        };
        let mut scratch = stats.clone();
        let mut plan = Vec::new();

        let mut take = |kind: ActionKind, scratch: &mut CountryStats| -> bool {
            let pricing = price_action(&kind, scratch, &rules.pricing);
            if !pricing.affordability.can_afford || scratch.budget < pricing.total_cost {
                return false;
            }
            let Ok(next) = apply_action_cost(&pricing, scratch) else {
                return false;
            };
            *scratch = next;
            plan.push(kind);
            true
        };

        let strength = stats.military_strength * self.attack_share;
        if strength > 0.0 {
            if let Some(target_city) = self.pick_target(country, stats, state, rules) {
                take(
                    ActionKind::Military(MilitaryAction::Attack { target_city, strength }),
                    &mut scratch,
                );
            }
        }
        if take(ActionKind::Research, &mut scratch) {
            scratch.tech_level += 1;
        }
        if take(ActionKind::Infrastructure, &mut scratch) {
            scratch.infrastructure_level += 1;
        }
        if self.recruit_units > 0 {
            take(
                ActionKind::Military(MilitaryAction::Recruit {
                    units: self.recruit_units,
                }),
                &mut scratch,
            );
        }
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::standard_scenario;
    use crate::state::GameState;

    #[test]
    fn proposes_affordable_development() {
        let state = GameState::from_snapshot(standard_scenario(2, 2)).unwrap();
        let rules = RulesConfig::default();
        let plan = HeuristicPlanner::default().plan(CountryId(1), &state, &rules);
        assert!(plan.contains(&ActionKind::Research));
        assert!(!plan.iter().any(|k| k.is_attack()));
    }

    #[test]
    fn attacks_hostile_neighbour() {
        let mut snapshot = standard_scenario(2, 2);
        snapshot.stats[0].relations.insert(CountryId(2), 10);
        let state = GameState::from_snapshot(snapshot).unwrap();
        let rules = RulesConfig::default();
        let plan = HeuristicPlanner::default().plan(CountryId(1), &state, &rules);
        let attack = plan.iter().find(|k| k.is_attack()).copied();
        let Some(ActionKind::Military(MilitaryAction::Attack {
            target_city,
            strength,
        })) = attack
        else {
            panic!("expected an attack, got {:?}", plan);
        };
        assert_eq!(state.city(target_city).unwrap().owner, CountryId(2));
        assert!((strength - 30.0).abs() < 1e-9);
    }

    #[test]
    fn broke_country_proposes_nothing() {
        let mut snapshot = standard_scenario(2, 1);
        snapshot.stats[0].budget = 0;
        let state = GameState::from_snapshot(snapshot).unwrap();
        let plan = HeuristicPlanner::default().plan(CountryId(1), &state, &RulesConfig::default());
        assert!(plan.is_empty());
    }

    #[test]
    fn unknown_country_gets_empty_plan() {
        let state = GameState::from_snapshot(standard_scenario(2, 1)).unwrap();
        assert!(HeuristicPlanner::default()
            .plan(CountryId(42), &state, &RulesConfig::default())
            .is_empty());
    }
}
