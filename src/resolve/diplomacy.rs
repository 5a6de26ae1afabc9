//! Diplomatic relation scores.
//!
//! Scores live in `0..=100` with 50 as neutral. Every adjustment is clamped
//! and every write goes through `GameState::with_updated_stats`. Combat
//! fallout is applied in one batch after all of a turn's combats, so
//! third-party reactions see the complete outcome set.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ActionError;
use crate::state::{CountryId, CountryStats, DealKind, GameState};

pub const RELATION_MIN: i32 = 0;
pub const RELATION_MAX: i32 = 100;
pub const RELATION_NEUTRAL: i32 = 50;

/// Relation deltas applied by combat, deals, and gestures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiplomacyConfig {
    /// Mutual loss between attacker and defender when the attack is repelled.
    pub combat_penalty: i32,
    /// Mutual loss between attacker and defender when the city falls.
    pub capture_penalty: i32,
    /// Loss between every bystander and the attacker.
    pub aggression_penalty: i32,
    /// Gain between every bystander and the defender.
    pub sympathy_bonus: i32,
    /// Extra mutual loss when an attack breaks an active pact.
    pub betrayal_penalty: i32,
    pub alliance_boost: i32,
    pub non_aggression_boost: i32,
    pub military_aid_boost: i32,
    pub trade_boost: i32,
    /// Mutual gain from an `Improve` gesture.
    pub improve_delta: i32,
    /// Mutual loss from a `Denounce` gesture.
    pub denounce_delta: i32,
}

impl Default for DiplomacyConfig {
    fn default() -> Self {
        DiplomacyConfig {
            combat_penalty: 10,
            capture_penalty: 20,
            aggression_penalty: 3,
            sympathy_bonus: 2,
            betrayal_penalty: 25,
            alliance_boost: 20,
            non_aggression_boost: 12,
            military_aid_boost: 8,
            trade_boost: 5,
            improve_delta: 5,
            denounce_delta: 8,
        }
    }
}

impl DiplomacyConfig {
    /// Standing boost between the parties of a freshly executed deal.
    pub fn deal_boost(&self, kind: DealKind) -> i32 {
        match kind {
            DealKind::Alliance => self.alliance_boost,
            DealKind::NonAggression => self.non_aggression_boost,
            DealKind::MilitaryAid => self.military_aid_boost,
            DealKind::Trade => self.trade_boost,
        }
    }
}

/// Returns the score toward `other`, or `fallback` if none is recorded,
/// clamped into range.
pub fn get_score(relations: &BTreeMap<CountryId, i32>, other: CountryId, fallback: i32) -> i32 {
    relations
        .get(&other)
        .copied()
        .unwrap_or(fallback)
        .clamp(RELATION_MIN, RELATION_MAX)
}

/// Returns `stats` with its score toward `other` shifted by `delta`.
pub fn apply_delta(stats: &CountryStats, other: CountryId, delta: i32) -> CountryStats {
    let mut next = stats.clone();
    let current = get_score(&next.relations, other, RELATION_NEUTRAL);
    let updated = current.saturating_add(delta).clamp(RELATION_MIN, RELATION_MAX);
    next.relations.insert(other, updated);
    next
}

/// Outcome of one resolved combat, as seen by diplomacy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatFallout {
    pub attacker: CountryId,
    pub defender: CountryId,
    pub captured: bool,
    pub pact_broken: bool,
}

/// Directed relation deltas accumulated before a batched write.
#[derive(Debug, Default)]
pub struct RelationLedger {
    deltas: BTreeMap<CountryId, BTreeMap<CountryId, i32>>,
}

impl RelationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `delta` for `from`'s view of `to`.
    pub fn add(&mut self, from: CountryId, to: CountryId, delta: i32) {
        if from == to || delta == 0 {
            return;
        }
        let slot = self.deltas.entry(from).or_default().entry(to).or_insert(0);
        *slot = slot.saturating_add(delta);
    }

    /// Records `delta` in both directions.
    pub fn add_mutual(&mut self, a: CountryId, b: CountryId, delta: i32) {
        self.add(a, b, delta);
        self.add(b, a, delta);
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Net delta recorded for `from`'s view of `to`.
    pub fn delta(&self, from: CountryId, to: CountryId) -> i32 {
        self.deltas
            .get(&from)
            .and_then(|m| m.get(&to))
            .copied()
            .unwrap_or(0)
    }

    /// Applies every recorded delta with one stats write per country.
    /// Countries missing from the state are skipped and returned.
    pub fn commit(self, state: &mut GameState) -> Vec<CountryId> {
        let mut skipped = Vec::new();
        for (from, row) in self.deltas {
            let Some(stats) = state.stats(from) else {
                skipped.push(from);
                continue;
            };
            let next = row
                .iter()
                .fold(stats.clone(), |acc, (&to, &delta)| apply_delta(&acc, to, delta));
            if state.with_updated_stats(from, next).is_err() {
                skipped.push(from);
            }
        }
        skipped
    }
}

/// Builds the relation deltas for a turn's combat set.
///
/// Attacker and defender lose standing with each other (more if the city
/// fell, more again if a pact was broken). Every other active country loses
/// standing with the attacker and gains sympathy toward the defender.
pub fn combat_fallout(
    state: &GameState,
    combats: &[CombatFallout],
    config: &DiplomacyConfig,
) -> RelationLedger {
    let mut ledger = RelationLedger::new();
    let bystanders: Vec<CountryId> = state.active_countries().map(|c| c.id).collect();

    for fallout in combats {
        let mut penalty = if fallout.captured {
            config.capture_penalty
        } else {
            config.combat_penalty
        };
        if fallout.pact_broken {
            penalty += config.betrayal_penalty;
        }
        ledger.add_mutual(fallout.attacker, fallout.defender, -penalty);

        for &other in &bystanders {
            if other == fallout.attacker || other == fallout.defender {
                continue;
            }
            ledger.add_mutual(other, fallout.attacker, -config.aggression_penalty);
            ledger.add_mutual(other, fallout.defender, config.sympathy_bonus);
        }
    }

    debug!(combats = combats.len(), "combat fallout computed");
    ledger
}

/// Shifts the mutual standing of `a` and `b` by `delta`, writing both rows.
pub fn adjust_mutual(
    state: &mut GameState,
    a: CountryId,
    b: CountryId,
    delta: i32,
) -> Result<(), ActionError> {
    let stats_a = state.stats(a).ok_or(ActionError::UnknownCountry(a))?;
    let stats_b = state.stats(b).ok_or(ActionError::UnknownCountry(b))?;
    let next_a = apply_delta(stats_a, b, delta);
    let next_b = apply_delta(stats_b, a, delta);
    state
        .with_updated_stats(a, next_a)
        .map_err(|_| ActionError::UnknownCountry(a))?;
    state
        .with_updated_stats(b, next_b)
        .map_err(|_| ActionError::UnknownCountry(b))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Country, Controller, TurnSnapshot};

    fn three_countries() -> GameState {
        let countries = (1..=3)
            .map(|i| Country::new(CountryId(i), format!("C{}", i), Controller::Ai))
            .collect();
        let stats = (1..=3).map(|i| CountryStats::new(CountryId(i))).collect();
        GameState::from_snapshot(TurnSnapshot {
            turn: 0,
            countries,
            stats,
            cities: Vec::new(),
            pending_actions: Vec::new(),
            deals: Vec::new(),
            eliminated: Vec::new(),
            next_action_id: 0,
        })
        .unwrap()
    }

    #[test]
    fn get_score_falls_back_and_clamps() {
        let mut rel = BTreeMap::new();
        assert_eq!(get_score(&rel, CountryId(2), RELATION_NEUTRAL), 50);
        rel.insert(CountryId(2), 130);
        assert_eq!(get_score(&rel, CountryId(2), RELATION_NEUTRAL), 100);
        assert_eq!(get_score(&rel, CountryId(3), -7), 0);
    }

    #[test]
    fn repeated_negative_deltas_floor_at_zero() {
        let mut stats = CountryStats::new(CountryId(1));
        for _ in 0..20 {
            stats = apply_delta(&stats, CountryId(2), -35);
            assert!(stats.relations[&CountryId(2)] >= RELATION_MIN);
        }
        assert_eq!(stats.relations[&CountryId(2)], 0);
    }

    #[test]
    fn repeated_positive_deltas_cap_at_hundred() {
        let mut stats = CountryStats::new(CountryId(1));
        for _ in 0..20 {
            stats = apply_delta(&stats, CountryId(2), 35);
            assert!(stats.relations[&CountryId(2)] <= RELATION_MAX);
        }
        assert_eq!(stats.relations[&CountryId(2)], 100);
    }

    #[test]
    fn extreme_delta_does_not_overflow() {
        let stats = apply_delta(&CountryStats::new(CountryId(1)), CountryId(2), i32::MIN);
        assert_eq!(stats.relations[&CountryId(2)], 0);
    }

    #[test]
    fn deal_boost_ordering() {
        let cfg = DiplomacyConfig::default();
        assert!(cfg.deal_boost(DealKind::Alliance) > cfg.deal_boost(DealKind::NonAggression));
        assert!(cfg.deal_boost(DealKind::NonAggression) > cfg.deal_boost(DealKind::MilitaryAid));
        assert!(cfg.deal_boost(DealKind::MilitaryAid) > cfg.deal_boost(DealKind::Trade));
    }

    #[test]
    fn combat_fallout_hits_all_parties() {
        let mut state = three_countries();
        let cfg = DiplomacyConfig::default();
        let ledger = combat_fallout(
            &state,
            &[CombatFallout {
                attacker: CountryId(1),
                defender: CountryId(2),
                captured: true,
                pact_broken: false,
            }],
            &cfg,
        );
        assert_eq!(ledger.delta(CountryId(1), CountryId(2)), -20);
        assert_eq!(ledger.delta(CountryId(2), CountryId(1)), -20);
        assert_eq!(ledger.delta(CountryId(3), CountryId(1)), -3);
        assert_eq!(ledger.delta(CountryId(1), CountryId(3)), -3);
        assert_eq!(ledger.delta(CountryId(3), CountryId(2)), 2);

        ledger.commit(&mut state);
        assert_eq!(state.stats(CountryId(1)).unwrap().relations[&CountryId(2)], 30);
        assert_eq!(state.stats(CountryId(3)).unwrap().relations[&CountryId(1)], 47);
        assert_eq!(state.stats(CountryId(3)).unwrap().relations[&CountryId(2)], 52);
        // One write per country touched.
        assert_eq!(state.stats_revision(), 3);
    }

    #[test]
    fn repelled_attack_costs_less_than_capture() {
        let state = three_countries();
        let cfg = DiplomacyConfig::default();
        let repelled = combat_fallout(
            &state,
            &[CombatFallout {
                attacker: CountryId(1),
                defender: CountryId(2),
                captured: false,
                pact_broken: false,
            }],
            &cfg,
        );
        assert_eq!(repelled.delta(CountryId(1), CountryId(2)), -10);
    }

    #[test]
    fn adjust_mutual_is_symmetric() {
        let mut state = three_countries();
        adjust_mutual(&mut state, CountryId(1), CountryId(3), 12).unwrap();
        assert_eq!(state.stats(CountryId(1)).unwrap().relations[&CountryId(3)], 62);
        assert_eq!(state.stats(CountryId(3)).unwrap().relations[&CountryId(1)], 62);
    }

    #[test]
    fn adjust_mutual_unknown_country() {
        let mut state = three_countries();
        assert_eq!(
            adjust_mutual(&mut state, CountryId(1), CountryId(9), 5),
            Err(ActionError::UnknownCountry(CountryId(9)))
        );
        assert_eq!(state.stats_revision(), 0);
    }
}
