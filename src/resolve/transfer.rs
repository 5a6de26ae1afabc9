//! City capture and city-share bookkeeping.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ActionError, InvariantViolation, StateError, StepError};
use crate::state::{apportion, CityId, CountryId, ResourceInventory, ALL_RESOURCES};
use crate::state::GameState;

/// What moved when a city changed hands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferRecord {
    pub city: CityId,
    pub from: CountryId,
    pub to: CountryId,
    pub population: u64,
    pub resources: ResourceInventory,
    /// The loser owned no cities afterwards.
    pub eliminated: bool,
}

/// Moves `city` and its share of holdings from its owner to `winner`.
///
/// The amount moved is the city's share, capped at what the loser actually
/// holds. A loser's last city carries everything it still holds. The pair's
/// combined population and resources are unchanged.
pub fn transfer_city(
    state: &mut GameState,
    city_id: CityId,
    winner: CountryId,
) -> Result<TransferRecord, StepError> {
    let city = state.city(city_id).ok_or(ActionError::UnknownCity(city_id))?;
    let loser = city.owner;
    let (city_population, city_resources) = (city.population, city.resources);
    if loser == winner {
        let reason = format!("{} already owns city {}", winner, city_id);
        return Err(ActionError::Validation(reason).into());
    }

    let loser_stats = state.stats(loser).ok_or(ActionError::UnknownCountry(loser))?;
    let winner_stats = state.stats(winner).ok_or(ActionError::UnknownCountry(winner))?;
    let population_before = loser_stats.population + winner_stats.population;
    let resources_before = loser_stats.resources.merged(&winner_stats.resources);

    let last_city = state.cities_of(loser).count() == 1;
    let mut next_loser = loser_stats.clone();
    let mut next_winner = winner_stats.clone();

    let population = if last_city {
        next_loser.population
    } else {
        city_population.min(next_loser.population)
    };
    next_loser.population -= population;
    next_winner.population += population;

    let mut moved = ResourceInventory::empty();
    for kind in ALL_RESOURCES {
        let held = next_loser.resources.get(kind);
        let amount = if last_city { held } else { city_resources.get(kind).min(held) };
        if next_loser.resources.checked_remove(kind, amount).is_none() {
            return Err(InvariantViolation::NegativeResource {
                country: loser,
                resource: kind,
                available: next_loser.resources.get(kind),
                requested: amount,
            }
            .into());
        }
        next_winner.resources.add(kind, amount);
        moved.set(kind, amount);
    }

    let population_after = next_loser.population + next_winner.population;
    if population_after != population_before {
        return Err(InvariantViolation::NotConserved {
            quantity: "population".to_string(),
            before: population_before,
            after: population_after,
        }
        .into());
    }
    let resources_after = next_loser.resources.merged(&next_winner.resources);
    for kind in ALL_RESOURCES {
        if resources_after.get(kind) != resources_before.get(kind) {
            return Err(InvariantViolation::NotConserved {
                quantity: kind.to_string(),
                before: resources_before.get(kind),
                after: resources_after.get(kind),
            }
            .into());
        }
    }

    state
        .with_updated_stats(loser, next_loser)
        .map_err(|_| ActionError::UnknownCountry(loser))?;
    state
        .with_updated_stats(winner, next_winner)
        .map_err(|_| ActionError::UnknownCountry(winner))?;
    state
        .set_city_holdings(city_id, population, moved)
        .map_err(|_| ActionError::UnknownCity(city_id))?;
    state
        .set_city_owner(city_id, winner)
        .map_err(|_| ActionError::UnknownCity(city_id))?;

    let eliminated = state.cities_of(loser).next().is_none();
    if eliminated {
        state.mark_eliminated(loser);
        info!(country = %loser, "country eliminated");
    }
    info!(city = %city_id, from = %loser, to = %winner, population, "city captured");

    Ok(TransferRecord {
        city: city_id,
        from: loser,
        to: winner,
        population,
        resources: moved,
        eliminated,
    })
}

/// Re-apportions every country's totals across its cities so the city sums
/// match the aggregate stats exactly.
///
/// Each quantity is split in proportion to the cities' current shares of it,
/// falling back to population shares, then to an even split. Returns the
/// city-owning countries left as-is because they have no stats row.
pub fn sync_city_shares(state: &mut GameState) -> Result<Vec<CountryId>, StateError> {
    let owners: Vec<CountryId> = state.countries().iter().map(|c| c.id).collect();
    let mut skipped = Vec::new();
    for owner in owners {
        let cities: Vec<(CityId, u64, ResourceInventory)> = state
            .cities_of(owner)
            .map(|c| (c.id, c.population, c.resources))
            .collect();
        if cities.is_empty() {
            continue;
        }
        let Some(stats) = state.stats(owner) else {
            warn!(country = %owner, "no stats row; city shares left as-is");
            skipped.push(owner);
            continue;
        };
        let (total_population, totals) = (stats.population, stats.resources);

        let population_weights: Vec<u64> = cities.iter().map(|&(_, p, _)| p).collect();
        let populations = apportion(total_population, &population_weights);

        let mut holdings = vec![ResourceInventory::empty(); cities.len()];
        for kind in ALL_RESOURCES {
            let mut weights: Vec<u64> = cities.iter().map(|(_, _, r)| r.get(kind)).collect();
            if weights.iter().all(|&w| w == 0) {
                weights = population_weights.clone();
            }
            for (slot, part) in holdings.iter_mut().zip(apportion(totals.get(kind), &weights)) {
                slot.set(kind, part);
            }
        }

        for ((&(id, _, _), population), resources) in cities.iter().zip(populations).zip(holdings) {
            state.set_city_holdings(id, population, resources)?;
        }
    }
    Ok(skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{City, Controller, Country, CountryStats, ResourceKind, TurnSnapshot};

    fn world() -> GameState {
        let countries = vec![
            Country::new(CountryId(1), "Aster", Controller::Ai),
            Country::new(CountryId(2), "Bryn", Controller::Ai),
        ];
        let mut a = CountryStats::new(CountryId(1));
        a.population = 500;
        a.resources = ResourceInventory::from_pairs(&[(ResourceKind::Iron, 40)]);
        let mut b = CountryStats::new(CountryId(2));
        b.population = 300;
        b.resources =
            ResourceInventory::from_pairs(&[(ResourceKind::Iron, 30), (ResourceKind::Oil, 9)]);

        let mut ca = City::new(CityId(1), "Aster Keep", CountryId(1));
        ca.population = 500;
        ca.resources = a.resources;
        let mut cb1 = City::new(CityId(2), "Bryn Hold", CountryId(2));
        cb1.population = 200;
        cb1.resources =
            ResourceInventory::from_pairs(&[(ResourceKind::Iron, 20), (ResourceKind::Oil, 6)]);
        let mut cb2 = City::new(CityId(3), "Bryn Ford", CountryId(2));
        cb2.population = 100;
        cb2.resources =
            ResourceInventory::from_pairs(&[(ResourceKind::Iron, 10), (ResourceKind::Oil, 3)]);

        GameState::from_snapshot(TurnSnapshot {
            turn: 1,
            countries,
            stats: vec![a, b],
            cities: vec![ca, cb1, cb2],
            pending_actions: Vec::new(),
            deals: Vec::new(),
            eliminated: Vec::new(),
            next_action_id: 0,
        })
        .unwrap()
    }

    #[test]
    fn capture_conserves_pair_totals() {
        let mut state = world();
        let pop_before = state.total_population();
        let res_before = state.total_resources();

        let record = transfer_city(&mut state, CityId(2), CountryId(1)).unwrap();
        assert_eq!(record.population, 200);
        assert_eq!(record.resources.get(ResourceKind::Oil), 6);
        assert!(!record.eliminated);

        assert_eq!(state.total_population(), pop_before);
        assert_eq!(state.total_resources(), res_before);
        assert_eq!(state.stats(CountryId(1)).unwrap().population, 700);
        assert_eq!(state.stats(CountryId(2)).unwrap().population, 100);
        assert_eq!(state.city(CityId(2)).unwrap().owner, CountryId(1));
        assert!(state.city_share_mismatches().is_empty());
    }

    #[test]
    fn last_city_eliminates_owner() {
        let mut state = world();
        transfer_city(&mut state, CityId(2), CountryId(1)).unwrap();
        let record = transfer_city(&mut state, CityId(3), CountryId(1)).unwrap();
        assert!(record.eliminated);
        assert!(state.is_eliminated(CountryId(2)));
        assert_eq!(state.active_countries().count(), 1);
    }

    #[test]
    fn last_city_takes_everything_left() {
        let mut state = world();
        transfer_city(&mut state, CityId(2), CountryId(1)).unwrap();
        let mut b = state.stats(CountryId(2)).unwrap().clone();
        b.population = 150;
        b.resources.set(ResourceKind::Gold, 4);
        state.with_updated_stats(CountryId(2), b).unwrap();

        let record = transfer_city(&mut state, CityId(3), CountryId(1)).unwrap();
        assert_eq!(record.population, 150);
        assert_eq!(record.resources.get(ResourceKind::Gold), 4);
        let loser = state.stats(CountryId(2)).unwrap();
        assert_eq!(loser.population, 0);
        assert!(loser.resources.is_empty());
    }

    #[test]
    fn capture_caps_at_loser_holdings() {
        let mut state = world();
        let mut b = state.stats(CountryId(2)).unwrap().clone();
        b.population = 50;
        state.with_updated_stats(CountryId(2), b).unwrap();

        let record = transfer_city(&mut state, CityId(2), CountryId(1)).unwrap();
        assert_eq!(record.population, 50);
        assert_eq!(state.stats(CountryId(2)).unwrap().population, 0);
        assert_eq!(state.stats(CountryId(1)).unwrap().population, 550);
    }

    #[test]
    fn capture_of_unknown_city_is_missing_reference() {
        let mut state = world();
        assert_eq!(
            transfer_city(&mut state, CityId(99), CountryId(1)),
            Err(StepError::Action(ActionError::UnknownCity(CityId(99))))
        );
    }

    #[test]
    fn sync_restores_city_sums() {
        let mut state = world();
        let mut b = state.stats(CountryId(2)).unwrap().clone();
        b.population = 330;
        b.resources.set(ResourceKind::Oil, 10);
        b.resources.set(ResourceKind::Gold, 5);
        state.with_updated_stats(CountryId(2), b).unwrap();
        assert_eq!(state.city_share_mismatches(), vec![CountryId(2)]);

        assert!(sync_city_shares(&mut state).unwrap().is_empty());
        assert!(state.city_share_mismatches().is_empty());
        assert_eq!(state.city(CityId(2)).unwrap().population, 220);
        assert_eq!(state.city(CityId(3)).unwrap().population, 110);
        // Gold had no city shares; it follows population.
        assert_eq!(state.city(CityId(2)).unwrap().resources.get(ResourceKind::Gold), 3);
        assert_eq!(state.city(CityId(3)).unwrap().resources.get(ResourceKind::Gold), 2);
    }

    #[test]
    fn sync_skips_owner_without_stats() {
        let countries = vec![
            Country::new(CountryId(1), "Aster", Controller::Ai),
            Country::new(CountryId(2), "Bryn", Controller::Ai),
        ];
        let mut keep = City::new(CityId(1), "Bryn Hold", CountryId(2));
        keep.population = 70;
        let mut state = GameState::from_snapshot(TurnSnapshot {
            turn: 0,
            countries,
            stats: vec![CountryStats::new(CountryId(1))],
            cities: vec![keep],
            pending_actions: Vec::new(),
            deals: Vec::new(),
            eliminated: Vec::new(),
            next_action_id: 0,
        })
        .unwrap();

        assert_eq!(sync_city_shares(&mut state).unwrap(), vec![CountryId(2)]);
        assert_eq!(state.city(CityId(1)).unwrap().population, 70);
    }
}
