//! Defense allocation boundary.
//!
//! The turn processor asks a `DefenseAllocator` how much strength a defender
//! commits to a threatened city. The request carries nothing about the
//! attacker's allocation, so a defender never commits with knowledge of it.

use thiserror::Error;

use crate::state::{City, CountryId, CountryStats};

use super::combat::{allocation_within_limit, CombatConfig};

/// Everything a defender may see when committing.
#[derive(Debug, Clone, Copy)]
pub struct DefenseRequest<'a> {
    pub defender: CountryId,
    pub attacker: CountryId,
    pub city: &'a City,
    pub defender_stats: &'a CountryStats,
    /// Strength the defender submitted through a `Defend` action this turn.
    pub submitted: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AllocationError {
    #[error("defense allocation is not a finite number")]
    NotFinite,
    #[error("defense allocation {0} is negative")]
    Negative(f64),
    #[error("defense allocation {allocated} exceeds available strength {available}")]
    ExceedsStrength { allocated: f64, available: f64 },
    #[error("defense provider unavailable: {0}")]
    Unavailable(String),
}

/// Source of defender allocations (heuristic, human, or advisory).
pub trait DefenseAllocator: Send + Sync {
    fn resolve_defense_allocation(
        &self,
        request: &DefenseRequest<'_>,
    ) -> Result<f64, AllocationError>;
}

impl<F> DefenseAllocator for F
where
    F: Fn(&DefenseRequest<'_>) -> Result<f64, AllocationError> + Send + Sync,
{
    fn resolve_defense_allocation(
        &self,
        request: &DefenseRequest<'_>,
    ) -> Result<f64, AllocationError> {
        self(request)
    }
}

/// Checks a provider's answer against the defender's current strength.
pub fn validate_allocation(
    allocated: f64,
    stats: &CountryStats,
    config: &CombatConfig,
) -> Result<f64, AllocationError> {
    if !allocated.is_finite() {
        return Err(AllocationError::NotFinite);
    }
    if allocated < 0.0 {
        return Err(AllocationError::Negative(allocated));
    }
    if !allocation_within_limit(allocated, stats, config) {
        return Err(AllocationError::ExceedsStrength {
            allocated,
            available: stats.military_strength,
        });
    }
    Ok(allocated.min(stats.military_strength))
}

/// Rule-based defender: honours a submitted commitment, otherwise weighs the
/// city's share of the defender's population against total strength.
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicDefense {
    pub min_share: f64,
    pub max_share: f64,
    /// Scales the city's population share into a strength share.
    pub value_weight: f64,
}

impl Default for HeuristicDefense {
    fn default() -> Self {
        HeuristicDefense {
            min_share: 0.2,
            max_share: 0.8,
            value_weight: 2.0,
        }
    }
}

impl DefenseAllocator for HeuristicDefense {
    fn resolve_defense_allocation(
        &self,
        request: &DefenseRequest<'_>,
    ) -> Result<f64, AllocationError> {
        let strength = request.defender_stats.military_strength.max(0.0);
        if let Some(submitted) = request.submitted {
            return Ok(submitted.clamp(0.0, strength));
        }
        let population = request.defender_stats.population;
        let value = if population == 0 {
            1.0
        } else {
            request.city.population as f64 / population as f64
        };
        let share = (self.value_weight * value).clamp(self.min_share, self.max_share);
        Ok(strength * share)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::CityId;

    fn defender(pop: u64, strength: f64) -> CountryStats {
        let mut s = CountryStats::new(CountryId(2));
        s.population = pop;
        s.military_strength = strength;
        s
    }

    fn city(pop: u64) -> City {
        let mut c = City::new(CityId(5), "Harbor", CountryId(2));
        c.population = pop;
        c
    }

    #[test]
    fn heuristic_weighs_city_value() {
        let h = HeuristicDefense::default();
        let stats = defender(1000, 100.0);
        let small = city(50);
        let req = DefenseRequest {
            defender: CountryId(2),
            attacker: CountryId(1),
            city: &small,
            defender_stats: &stats,
            submitted: None,
        };
        // 2 × 0.05 = 0.1, clamped up to 0.2
        assert!((h.resolve_defense_allocation(&req).unwrap() - 20.0).abs() < 1e-9);

        let capital = city(600);
        let req = DefenseRequest { city: &capital, ..req };
        assert!((h.resolve_defense_allocation(&req).unwrap() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn heuristic_honours_submission_within_strength() {
        let h = HeuristicDefense::default();
        let stats = defender(1000, 40.0);
        let c = city(100);
        let req = DefenseRequest {
            defender: CountryId(2),
            attacker: CountryId(1),
            city: &c,
            defender_stats: &stats,
            submitted: Some(75.0),
        };
        assert_eq!(h.resolve_defense_allocation(&req).unwrap(), 40.0);
    }

    #[test]
    fn functions_are_allocators() {
        fn fixed(_: &DefenseRequest<'_>) -> Result<f64, AllocationError> {
            Ok(12.0)
        }
        let stats = defender(10, 20.0);
        let c = city(10);
        let req = DefenseRequest {
            defender: CountryId(2),
            attacker: CountryId(1),
            city: &c,
            defender_stats: &stats,
            submitted: None,
        };
        let provider: &dyn DefenseAllocator = &fixed;
        assert_eq!(provider.resolve_defense_allocation(&req).unwrap(), 12.0);
    }

    #[test]
    fn validation_rejects_bad_answers() {
        let cfg = CombatConfig::default();
        let stats = defender(10, 20.0);
        assert_eq!(validate_allocation(20.0, &stats, &cfg), Ok(20.0));
        assert_eq!(
            validate_allocation(f64::INFINITY, &stats, &cfg),
            Err(AllocationError::NotFinite)
        );
        assert_eq!(validate_allocation(-2.0, &stats, &cfg), Err(AllocationError::Negative(-2.0)));
        assert!(matches!(
            validate_allocation(25.0, &stats, &cfg),
            Err(AllocationError::ExceedsStrength { .. })
        ));
    }
}
