//! Combat resolution.
//!
//! `resolve_combat` is pure: it reads two allocations and two stats rows and
//! draws from the injected random source. The same seed always produces the
//! same result.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::InvariantViolation;
use crate::state::CountryStats;

const STRENGTH_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Effective-strength bonus per technology level.
    pub tech_bonus_per_level: f64,
    /// Multiplier applied to the defender's effective strength.
    pub home_advantage: f64,
    /// Slope of the logistic curve over the strength ratio.
    pub logistic_steepness: f64,
    pub min_win_probability: f64,
    pub max_win_probability: f64,
    /// Loss fraction range of allocated strength for the winning side.
    pub winner_loss_min: f64,
    pub winner_loss_max: f64,
    /// Loss fraction range of allocated strength for the losing side.
    pub loser_loss_min: f64,
    pub loser_loss_max: f64,
    /// Military strength gained per recruited unit.
    pub strength_per_unit: f64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        CombatConfig {
            tech_bonus_per_level: 0.05,
            home_advantage: 1.2,
            logistic_steepness: 4.0,
            min_win_probability: 0.05,
            max_win_probability: 0.95,
            winner_loss_min: 0.05,
            winner_loss_max: 0.15,
            loser_loss_min: 0.2,
            loser_loss_max: 0.4,
            strength_per_unit: 1.0,
        }
    }
}

/// Ephemeral outcome of one attack. Folded into state immediately.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatResult {
    pub attacker_wins: bool,
    pub attacker_losses: f64,
    pub defender_losses: f64,
}

impl CombatResult {
    /// Whether the target city changes owner.
    pub fn captures_city(&self) -> bool {
        self.attacker_wins
    }
}

/// Allocated strength after the technology multiplier.
///
/// This is the only effective-strength formula in the crate. Both the value
/// shown to a player and the value checked at submission go through it.
pub fn effective_strength(allocated: f64, tech_level: u32, config: &CombatConfig) -> f64 {
    allocated.max(0.0) * (1.0 + tech_level as f64 * config.tech_bonus_per_level)
}

/// The largest effective strength `stats` can commit to one battle.
pub fn max_effective_strength(stats: &CountryStats, config: &CombatConfig) -> f64 {
    effective_strength(stats.military_strength, stats.tech_level, config)
}

/// Whether `allocated` is a legal commitment for `stats`.
pub fn allocation_within_limit(
    allocated: f64,
    stats: &CountryStats,
    config: &CombatConfig,
) -> bool {
    allocated.is_finite()
        && allocated >= 0.0
        && effective_strength(allocated, stats.tech_level, config)
            <= max_effective_strength(stats, config) + STRENGTH_EPSILON
}

/// Attacker win probability for the given effective strengths.
pub fn win_probability(
    attacker_effective: f64,
    defender_effective: f64,
    config: &CombatConfig,
) -> f64 {
    let (lo, hi) = ordered(config.min_win_probability, config.max_win_probability);
    if attacker_effective <= 0.0 {
        return lo;
    }
    if defender_effective <= 0.0 {
        return hi;
    }
    let ratio = attacker_effective / defender_effective;
    let p = 1.0 / (1.0 + (-config.logistic_steepness * (ratio - 1.0)).exp());
    p.clamp(lo, hi)
}

/// Resolves one battle.
///
/// Draw order is fixed: winner, attacker loss fraction, defender loss fraction.
pub fn resolve_combat<R: Rng + ?Sized>(
    attacker_allocated: f64,
    defender_allocated: f64,
    attacker: &CountryStats,
    defender: &CountryStats,
    config: &CombatConfig,
    rng: &mut R,
) -> CombatResult {
    let attacker_eff = effective_strength(attacker_allocated, attacker.tech_level, config);
    let defender_eff =
        effective_strength(defender_allocated, defender.tech_level, config) * config.home_advantage;
    let p = win_probability(attacker_eff, defender_eff, config);

    let attacker_wins = rng.gen::<f64>() < p;
    let winner = ordered(config.winner_loss_min, config.winner_loss_max);
    let loser = ordered(config.loser_loss_min, config.loser_loss_max);
    let (att_range, def_range) = if attacker_wins {
        (winner, loser)
    } else {
        (loser, winner)
    };
    let attacker_fraction = draw_fraction(rng, att_range);
    let defender_fraction = draw_fraction(rng, def_range);

    CombatResult {
        attacker_wins,
        attacker_losses: attacker_allocated.max(0.0) * attacker_fraction,
        defender_losses: defender_allocated.max(0.0) * defender_fraction,
    }
}

/// Returns `stats` with `losses` subtracted from military strength.
pub fn apply_losses(stats: &CountryStats, losses: f64) -> Result<CountryStats, InvariantViolation> {
    if !losses.is_finite() || losses < 0.0 || losses > stats.military_strength + STRENGTH_EPSILON {
        return Err(InvariantViolation::NegativeStrength {
            country: stats.country,
            available: stats.military_strength,
            requested: losses,
        });
    }
    let mut next = stats.clone();
    next.military_strength = (next.military_strength - losses).max(0.0);
    Ok(next)
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn draw_fraction<R: Rng + ?Sized>(rng: &mut R, (lo, hi): (f64, f64)) -> f64 {
    if hi <= lo {
        lo.clamp(0.0, 1.0)
    } else {
        rng.gen_range(lo..=hi).clamp(0.0, 1.0)
    }
}
