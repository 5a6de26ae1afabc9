//! Action resolution: validate, price, gate, commit.
//!
//! Every action, whoever submitted it, goes through the same path. An action
//! is resolved at most once and ends `Executed` or `Failed`. Each executed
//! action performs exactly one stats write for the acting country; a
//! diplomatic gesture also writes the target's row so the score change is
//! symmetric.

use tracing::{debug, error, warn};

use crate::config::RulesConfig;
use crate::cost::{apply_action_cost, price_action, ActionPricing};
use crate::error::{ActionError, InvariantViolation, StepError};
use crate::state::{
    Action, ActionKind, CountryStats, DiplomacyAction, EconomicAction, GameState, MilitaryAction,
    Stance,
};

use super::combat::allocation_within_limit;
use super::diplomacy::apply_delta;

/// Resolves non-combat actions and approves attacks against the live state.
#[derive(Debug, Clone, Copy)]
pub struct ActionResolver<'a> {
    rules: &'a RulesConfig,
}

impl<'a> ActionResolver<'a> {
    pub fn new(rules: &'a RulesConfig) -> Self {
        ActionResolver { rules }
    }

    pub fn rules(&self) -> &'a RulesConfig {
        self.rules
    }

    /// Resolves one action.
    ///
    /// Recoverable failures come back as a `Failed` action with its reason.
    /// Only a broken invariant is returned as an error.
    pub fn resolve(
        &self,
        state: &mut GameState,
        action: Action,
    ) -> Result<Action, InvariantViolation> {
        if !action.is_pending() {
            warn!(action = %action.id, "action already resolved; left unchanged");
            return Ok(action);
        }
        match self.execute(state, &action) {
            Ok(()) => {
                debug!(
                    action = %action.id,
                    country = %action.country,
                    kind = action.kind.label(),
                    "action executed"
                );
                Ok(action.into_executed())
            }
            Err(StepError::Action(err)) => {
                warn!(
                    action = %action.id,
                    country = %action.country,
                    kind = action.kind.label(),
                    reason = %err,
                    "action failed"
                );
                Ok(action.into_failed(err))
            }
            Err(StepError::Invariant(violation)) => {
                error!(
                    action = %action.id,
                    %violation,
                    "invariant violated while resolving action"
                );
                Err(violation)
            }
        }
    }

    /// Checks the action's shape and references against the current state.
    pub fn validate(&self, state: &GameState, action: &Action) -> Result<(), ActionError> {
        if !action.is_pending() {
            return Err(ActionError::AlreadyResolved(action.id));
        }
        if action.turn < state.turn() {
            return Err(ActionError::Stale {
                action_turn: action.turn,
                current_turn: state.turn(),
            });
        }
        if action.turn > state.turn() {
            return Err(ActionError::Validation(format!(
                "action targets future turn {}",
                action.turn
            )));
        }

        let actor = action.country;
        let stats = state.stats(actor).ok_or(ActionError::UnknownCountry(actor))?;
        if state.is_eliminated(actor) {
            return Err(ActionError::Eliminated(actor));
        }

        match action.kind {
            ActionKind::Research | ActionKind::Infrastructure | ActionKind::Economic(_) => Ok(()),
            ActionKind::Military(MilitaryAction::Recruit { units }) => {
                if units == 0 {
                    return Err(ActionError::Validation(
                        "recruitment needs at least one unit".into(),
                    ));
                }
                Ok(())
            }
            ActionKind::Military(MilitaryAction::Attack { target_city, strength }) => {
                if !strength.is_finite() || strength <= 0.0 {
                    return Err(ActionError::Validation(
                        "attack strength must be a positive number".into(),
                    ));
                }
                if !allocation_within_limit(strength, stats, &self.rules.combat) {
                    return Err(ActionError::Validation(format!(
                        "attack strength {:.1} exceeds available strength {:.1}",
                        strength, stats.military_strength
                    )));
                }
                let city = state.city(target_city).ok_or(ActionError::UnknownCity(target_city))?;
                if city.owner == actor {
                    return Err(ActionError::Validation(format!(
                        "city {} is already owned by the attacker",
                        target_city
                    )));
                }
                Ok(())
            }
            ActionKind::Military(MilitaryAction::Defend { city, strength }) => {
                let target = state.city(city).ok_or(ActionError::UnknownCity(city))?;
                if target.owner != actor {
                    return Err(ActionError::Validation(format!(
                        "city {} is not owned by the defender",
                        city
                    )));
                }
                if !strength.is_finite() || strength < 0.0 {
                    return Err(ActionError::Validation(
                        "defense strength must be a non-negative number".into(),
                    ));
                }
                if !allocation_within_limit(strength, stats, &self.rules.combat) {
                    return Err(ActionError::Validation(format!(
                        "defense strength {:.1} exceeds available strength {:.1}",
                        strength, stats.military_strength
                    )));
                }
                Ok(())
            }
            ActionKind::Diplomacy(DiplomacyAction { target, .. }) => {
                if target == actor {
                    return Err(ActionError::Validation(
                        "a country cannot court or denounce itself".into(),
                    ));
                }
                if state.stats(target).is_none() {
                    return Err(ActionError::UnknownCountry(target));
                }
                if state.is_eliminated(target) {
                    return Err(ActionError::Eliminated(target));
                }
                Ok(())
            }
        }
    }

    /// Validates, prices, and gates an action without touching state.
    ///
    /// Missing resources fail the action outright, whatever the budget.
    pub fn approve(
        &self,
        state: &GameState,
        action: &Action,
    ) -> Result<ActionPricing, ActionError> {
        self.validate(state, action)?;
        let stats = state
            .stats(action.country)
            .ok_or(ActionError::UnknownCountry(action.country))?;
        let pricing = price_action(&action.kind, stats, &self.rules.pricing);

        if !pricing.affordability.can_afford {
            return Err(ActionError::MissingResources {
                missing: pricing.affordability.missing.clone(),
                penalty_multiplier: pricing.affordability.penalty_multiplier,
            });
        }
        if stats.budget < pricing.total_cost {
            return Err(ActionError::InsufficientBudget {
                required: pricing.total_cost,
                available: stats.budget,
            });
        }
        Ok(pricing)
    }

    fn execute(&self, state: &mut GameState, action: &Action) -> Result<(), StepError> {
        if action.is_attack() {
            return Err(ActionError::Validation(
                "attacks are resolved in the combat phase".into(),
            )
            .into());
        }
        let pricing = self.approve(state, action)?;
        let actor = action.country;
        let stats = state.stats(actor).ok_or(ActionError::UnknownCountry(actor))?;
        let charged = apply_action_cost(&pricing, stats)?;
        if charged.budget < 0 {
            return Err(InvariantViolation::NegativeBudget {
                country: actor,
                budget: charged.budget,
            }
            .into());
        }
        let next = self.apply_effect(state, action, charged)?;

        state
            .with_updated_stats(actor, next)
            .map_err(|_| ActionError::UnknownCountry(actor))?;
        Ok(())
    }

    /// Applies the action's stat effect to the already-charged stats row.
    fn apply_effect(
        &self,
        state: &mut GameState,
        action: &Action,
        mut next: CountryStats,
    ) -> Result<CountryStats, StepError> {
        match action.kind {
            ActionKind::Research => next.tech_level += 1,
            ActionKind::Infrastructure | ActionKind::Economic(EconomicAction::Infrastructure) => {
                next.infrastructure_level += 1
            }
            ActionKind::Military(MilitaryAction::Recruit { units }) => {
                next.military_strength += f64::from(units) * self.rules.combat.strength_per_unit;
            }
            ActionKind::Military(MilitaryAction::Defend { city, strength }) => {
                state.record_defense_commitment(action.country, city, strength);
            }
            ActionKind::Military(MilitaryAction::Attack { .. }) => {}
            ActionKind::Diplomacy(DiplomacyAction { target, stance }) => {
                let delta = match stance {
                    Stance::Improve => self.rules.diplomacy.improve_delta,
                    Stance::Denounce => -self.rules.diplomacy.denounce_delta,
                };
                next = apply_delta(&next, target, delta);
                let target_stats = state.stats(target).ok_or(ActionError::UnknownCountry(target))?;
                let target_next = apply_delta(target_stats, action.country, delta);
                state
                    .with_updated_stats(target, target_next)
                    .map_err(|_| ActionError::UnknownCountry(target))?;
            }
        }
        Ok(next)
    }
}
