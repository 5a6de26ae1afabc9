//! The authoritative in-memory snapshot for one turn.
//!
//! `TurnSnapshot` is the plain-data unit of input/output at the persistence
//! boundary. `GameState` wraps it for the duration of one turn and is the
//! shared context every resolver reads and writes through. It implements no
//! game rules; it only guards structure and records every stats write.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use super::action::{Action, ActionId};
use super::city::{City, CityId};
use super::country::{Country, CountryId, CountryStats};
use super::deal::{Deal, DealId};
use super::resource::ResourceInventory;
use crate::error::StateError;
use crate::resolve::diplomacy::{RELATION_MAX, RELATION_MIN};

/// Complete serializable game state for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnSnapshot {
    pub turn: u32,
    pub countries: Vec<Country>,
    pub stats: Vec<CountryStats>,
    pub cities: Vec<City>,
    #[serde(default)]
    pub pending_actions: Vec<Action>,
    #[serde(default)]
    pub deals: Vec<Deal>,
    #[serde(default)]
    pub eliminated: Vec<CountryId>,
    /// Lower bound for ids handed to engine-generated actions.
    #[serde(default)]
    pub next_action_id: u64,
}

/// Mutable turn state, owned exclusively by the turn processor.
#[derive(Debug, Clone)]
pub struct GameState {
    turn: u32,
    countries: Vec<Country>,
    stats: BTreeMap<CountryId, CountryStats>,
    cities: Vec<City>,
    city_index: BTreeMap<CityId, usize>,
    pending: Vec<Action>,
    deals: Vec<Deal>,
    eliminated: BTreeSet<CountryId>,
    defense_commitments: BTreeMap<(CountryId, CityId), f64>,
    next_action_id: u64,
    /// Set once `u64::MAX` has been used as an action id.
    ids_exhausted: bool,
    stats_revision: u64,
}

impl GameState {
    /// Validates a snapshot and takes ownership of it.
    pub fn from_snapshot(snapshot: TurnSnapshot) -> Result<Self, StateError> {
        let TurnSnapshot {
            turn,
            countries,
            stats: stats_rows,
            cities,
            pending_actions,
            deals,
            eliminated,
            next_action_id,
        } = snapshot;

        let mut known = BTreeSet::new();
        for country in &countries {
            if !known.insert(country.id) {
                return Err(StateError::DuplicateCountry(country.id));
            }
        }

        let mut stats = BTreeMap::new();
        for row in stats_rows {
            if !known.contains(&row.country) {
                return Err(StateError::UnknownCountry(row.country));
            }
            for (&other, &score) in &row.relations {
                if !(RELATION_MIN..=RELATION_MAX).contains(&score) {
                    return Err(StateError::RelationOutOfRange {
                        country: row.country,
                        other,
                        score,
                    });
                }
            }
            let id = row.country;
            if stats.insert(id, row).is_some() {
                return Err(StateError::DuplicateStats(id));
            }
        }
        for &id in &known {
            if !stats.contains_key(&id) {
                warn!(country = %id, "no stats row; country is skipped by every phase");
            }
        }

        let mut city_index = BTreeMap::new();
        for (i, city) in cities.iter().enumerate() {
            if !known.contains(&city.owner) {
                warn!(city = %city.id, owner = %city.owner, "city owned by unknown country");
            }
            if city_index.insert(city.id, i).is_some() {
                return Err(StateError::DuplicateCity(city.id));
            }
        }

        let mut action_ids = BTreeSet::new();
        for action in &pending_actions {
            if !action_ids.insert(action.id) {
                return Err(StateError::DuplicateAction(action.id));
            }
        }
        let highest = pending_actions.iter().map(|a| a.id.0).max();

        Ok(GameState {
            turn,
            countries,
            stats,
            cities,
            city_index,
            pending: pending_actions,
            deals,
            eliminated: eliminated.into_iter().collect(),
            defense_commitments: BTreeMap::new(),
            next_action_id,
            ids_exhausted: false,
            stats_revision: 0,
        }
        .with_ids_above(highest))
    }

    /// Returns a plain-data copy of the current state.
    pub fn snapshot(&self) -> TurnSnapshot {
        self.clone().into_snapshot()
    }

    /// Consumes the state, returning its plain-data form.
    pub fn into_snapshot(self) -> TurnSnapshot {
        TurnSnapshot {
            turn: self.turn,
            countries: self.countries,
            stats: self.stats.into_values().collect(),
            cities: self.cities,
            pending_actions: self.pending,
            deals: self.deals,
            eliminated: self.eliminated.into_iter().collect(),
            next_action_id: self.next_action_id,
        }
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn country(&self, id: CountryId) -> Option<&Country> {
        self.countries.iter().find(|c| c.id == id)
    }

    pub fn stats(&self, id: CountryId) -> Option<&CountryStats> {
        self.stats.get(&id)
    }

    /// All stats rows, ordered by country id.
    pub fn all_stats(&self) -> impl Iterator<Item = &CountryStats> {
        self.stats.values()
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn city(&self, id: CityId) -> Option<&City> {
        self.city_index.get(&id).map(|&i| &self.cities[i])
    }

    /// Cities currently owned by `owner`, in snapshot order.
    pub fn cities_of(&self, owner: CountryId) -> impl Iterator<Item = &City> {
        self.cities.iter().filter(move |c| c.owner == owner)
    }

    pub fn pending_actions(&self) -> &[Action] {
        &self.pending
    }

    pub fn deals(&self) -> &[Deal] {
        &self.deals
    }

    pub fn is_eliminated(&self, id: CountryId) -> bool {
        self.eliminated.contains(&id)
    }

    /// Countries still in the game, in snapshot order.
    pub fn active_countries(&self) -> impl Iterator<Item = &Country> {
        self.countries
            .iter()
            .filter(move |c| !self.eliminated.contains(&c.id))
    }

    /// Number of `with_updated_stats` writes since this state was built.
    pub fn stats_revision(&self) -> u64 {
        self.stats_revision
    }

    /// Replaces one country's stats in a single write.
    pub fn with_updated_stats(
        &mut self,
        id: CountryId,
        new_stats: CountryStats,
    ) -> Result<(), StateError> {
        if new_stats.country != id {
            return Err(StateError::MismatchedStats {
                expected: id,
                found: new_stats.country,
            });
        }
        let slot = self.stats.get_mut(&id).ok_or(StateError::UnknownCountry(id))?;
        *slot = new_stats;
        self.stats_revision += 1;
        trace!(country = %id, revision = self.stats_revision, "stats updated");
        Ok(())
    }

    /// Replaces the pending action queue.
    pub fn set_pending_actions(&mut self, actions: Vec<Action>) {
        let highest = actions.iter().map(|a| a.id.0).max();
        self.bump_ids_above(highest);
        self.pending = actions;
    }

    fn with_ids_above(mut self, highest: Option<u64>) -> Self {
        self.bump_ids_above(highest);
        self
    }

    /// Keeps the allocator past every id in use.
    fn bump_ids_above(&mut self, highest: Option<u64>) {
        match highest.map(|id| id.checked_add(1)) {
            Some(Some(next)) => self.next_action_id = self.next_action_id.max(next),
            Some(None) => self.ids_exhausted = true,
            None => {}
        }
    }

    /// Removes and returns the pending action queue.
    pub(crate) fn take_pending_actions(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.pending)
    }

    /// Reserves a fresh action id.
    pub fn allocate_action_id(&mut self) -> Result<ActionId, StateError> {
        if self.ids_exhausted {
            return Err(StateError::ActionIdExhausted);
        }
        let id = ActionId(self.next_action_id);
        match self.next_action_id.checked_add(1) {
            Some(next) => self.next_action_id = next,
            None => self.ids_exhausted = true,
        }
        Ok(id)
    }

    /// Countries with no stats row. Every phase skips them.
    pub fn countries_without_stats(&self) -> Vec<CountryId> {
        self.countries
            .iter()
            .map(|c| c.id)
            .filter(|id| !self.stats.contains_key(id))
            .collect()
    }

    /// Cities whose owner is not a known country, as `(city, owner)`.
    pub fn orphaned_cities(&self) -> Vec<(CityId, CountryId)> {
        self.cities
            .iter()
            .filter(|c| !self.countries.iter().any(|k| k.id == c.owner))
            .map(|c| (c.id, c.owner))
            .collect()
    }

    pub(crate) fn deal_mut(&mut self, id: DealId) -> Option<&mut Deal> {
        self.deals.iter_mut().find(|d| d.id == id)
    }

    pub(crate) fn set_city_owner(
        &mut self,
        city: CityId,
        owner: CountryId,
    ) -> Result<(), StateError> {
        if !self.stats.contains_key(&owner) {
            return Err(StateError::UnknownCountry(owner));
        }
        let &i = self.city_index.get(&city).ok_or(StateError::UnknownCity(city))?;
        self.cities[i].owner = owner;
        Ok(())
    }

    pub(crate) fn set_city_holdings(
        &mut self,
        city: CityId,
        population: u64,
        resources: ResourceInventory,
    ) -> Result<(), StateError> {
        let &i = self.city_index.get(&city).ok_or(StateError::UnknownCity(city))?;
        self.cities[i].population = population;
        self.cities[i].resources = resources;
        Ok(())
    }

    pub(crate) fn mark_eliminated(&mut self, id: CountryId) {
        self.eliminated.insert(id);
    }

    /// Records a submitted defense commitment for this turn. Later
    /// commitments for the same city replace earlier ones.
    pub(crate) fn record_defense_commitment(
        &mut self,
        country: CountryId,
        city: CityId,
        strength: f64,
    ) {
        self.defense_commitments.insert((country, city), strength);
    }

    pub fn defense_commitment(&self, country: CountryId, city: CityId) -> Option<f64> {
        self.defense_commitments.get(&(country, city)).copied()
    }

    /// Ends the turn: clears per-turn commitments and advances the counter.
    pub(crate) fn advance_turn(&mut self) {
        self.defense_commitments.clear();
        self.turn += 1;
    }

    /// Sum of population over all stats rows.
    pub fn total_population(&self) -> u64 {
        self.stats.values().map(|s| s.population).sum()
    }

    /// Sum of every resource over all stats rows.
    pub fn total_resources(&self) -> ResourceInventory {
        self.stats
            .values()
            .fold(ResourceInventory::empty(), |acc, s| acc.merged(&s.resources))
    }

    /// Countries whose city shares no longer sum to their aggregate stats.
    pub fn city_share_mismatches(&self) -> Vec<CountryId> {
        let mut mismatched = Vec::new();
        for (&id, stats) in &self.stats {
            let mut population = 0u64;
            let mut resources = ResourceInventory::empty();
            let mut any = false;
            for city in self.cities_of(id) {
                any = true;
                population += city.population;
                resources = resources.merged(&city.resources);
            }
            if any && (population != stats.population || resources != stats.resources) {
                mismatched.push(id);
            }
        }
        mismatched
    }
}
