//! Starting-world generation.
//!
//! Builds symmetric worlds for tests, benchmarks, and batch simulation.
//! City shares are apportioned so they sum exactly to each country's totals.

use crate::resolve::diplomacy::RELATION_NEUTRAL;
use crate::state::{
    apportion, City, CityId, Controller, Country, CountryId, CountryStats, ResourceInventory,
    ResourceKind, ResourceProfile, TurnSnapshot, ALL_RESOURCES,
};

const NAMES: [&str; 8] = [
    "Aldoria", "Brevik", "Castamar", "Dunmere", "Estrel", "Falkony", "Gorsk", "Hallin",
];

const STARTING_POPULATION: u64 = 10_000;
const STARTING_BUDGET: i64 = 1000;
const STARTING_STRENGTH: f64 = 50.0;

fn starting_resources() -> ResourceInventory {
    use ResourceKind::*;
    ResourceInventory::from_pairs(&[
        (Food, 200),
        (Timber, 60),
        (Iron, 60),
        (Copper, 50),
        (Coal, 50),
        (Oil, 30),
        (Steel, 20),
        (Gold, 10),
    ])
}

fn profile_for(index: usize) -> ResourceProfile {
    match index % 4 {
        0 => ResourceProfile::balanced(),
        1 => ResourceProfile::industrial(),
        2 => ResourceProfile::agrarian(),
        _ => ResourceProfile::petrostate(),
    }
}

/// A turn-0 world of `countries` AI countries with `cities_per_country`
/// cities each. The first city of each country is its largest.
pub fn standard_scenario(countries: usize, cities_per_country: usize) -> TurnSnapshot {
    let cities_per_country = cities_per_country.max(1);
    let ids: Vec<CountryId> = (1..=countries as u32).map(CountryId).collect();
    let resources = starting_resources();
    let weights: Vec<u64> = (0..cities_per_country)
        .map(|i| (cities_per_country - i) as u64)
        .collect();

    let mut country_rows = Vec::with_capacity(countries);
    let mut stats_rows = Vec::with_capacity(countries);
    let mut cities = Vec::with_capacity(countries * cities_per_country);

    for (index, &id) in ids.iter().enumerate() {
        let name = match NAMES.get(index) {
            Some(name) => name.to_string(),
            None => format!("Country {}", id.0),
        };
        country_rows.push(Country::new(id, name.clone(), Controller::Ai));

        let mut stats = CountryStats::new(id);
        stats.population = STARTING_POPULATION;
        stats.budget = STARTING_BUDGET;
        stats.tech_level = 1;
        stats.infrastructure_level = 1;
        stats.military_strength = STARTING_STRENGTH;
        stats.resources = resources;
        stats.profile = profile_for(index);
        stats.relations = ids
            .iter()
            .filter(|&&other| other != id)
            .map(|&other| (other, RELATION_NEUTRAL))
            .collect();
        stats_rows.push(stats);

        let populations = apportion(STARTING_POPULATION, &weights);
        let mut holdings = vec![ResourceInventory::empty(); cities_per_country];
        for kind in ALL_RESOURCES {
            for (slot, part) in holdings.iter_mut().zip(apportion(resources.get(kind), &weights)) {
                slot.set(kind, part);
            }
        }
        for (i, (population, held)) in populations.into_iter().zip(holdings).enumerate() {
            let city_id = CityId((index * cities_per_country + i + 1) as u32);
            let mut city = City::new(city_id, format!("{} {}", name, i + 1), id);
            city.population = population;
            city.resources = held;
            cities.push(city);
        }
    }

    TurnSnapshot {
        turn: 0,
        countries: country_rows,
        stats: stats_rows,
        cities,
        pending_actions: Vec::new(),
        deals: Vec::new(),
        eliminated: Vec::new(),
        next_action_id: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::GameState;

    #[test]
    fn scenario_is_valid_and_consistent() {
        let state = GameState::from_snapshot(standard_scenario(4, 3)).unwrap();
        assert_eq!(state.countries().len(), 4);
        assert_eq!(state.cities().len(), 12);
        assert!(state.city_share_mismatches().is_empty());
        assert_eq!(state.total_population(), 40_000);
    }

    #[test]
    fn capital_is_largest() {
        let snapshot = standard_scenario(1, 3);
        let pops: Vec<u64> = snapshot.cities.iter().map(|c| c.population).collect();
        assert_eq!(pops, vec![5000, 3333, 1667]);
    }

    #[test]
    fn relations_start_neutral() {
        let snapshot = standard_scenario(3, 1);
        assert_eq!(snapshot.stats[0].relations.len(), 2);
        assert!(snapshot.stats[0].relations.values().all(|&s| s == RELATION_NEUTRAL));
        assert_eq!(snapshot.stats[2].profile.name, "agrarian");
    }
}
