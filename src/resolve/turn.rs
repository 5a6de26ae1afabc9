//! Turn processor.
//!
//! Runs the fixed phase order for one turn:
//!
//! 1. advance deals
//! 2. economy (computed in parallel, folded sequentially), then city shares
//!    re-apportioned to the new totals
//! 3. non-attack actions, in submission order
//! 4. attacks, in submission order
//! 5. diplomatic fallout from every combat of the turn, in one batch
//! 6. city-share sync, turn advance, snapshot and log
//!
//! Combat reads post-economy state, so attack costs are never overwritten by
//! the economic fold. A failing action or combat never aborts the turn; a
//! broken invariant does, and the caller keeps its prior snapshot. A country
//! with no stats row, or a city with an unknown owner, is skipped by each
//! phase that touches it and reported as a `Skipped` event.

use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::config::RulesConfig;
use crate::cost::apply_action_cost;
use crate::error::{ActionError, StepError, TurnError};
use crate::planner::ActionPlanner;
use crate::state::{Action, ActionKind, ActionStatus, GameState, MilitaryAction, TurnSnapshot};

use super::action::ActionResolver;
use super::combat::{apply_losses, resolve_combat, CombatResult};
use super::deal::{advance_deals, violate_pacts_between};
use super::defense::{validate_allocation, DefenseAllocator, DefenseRequest, HeuristicDefense};
use super::diplomacy::{combat_fallout, CombatFallout};
use super::economy::run_economy;
use super::event::{TurnEvent, TurnLog};
use super::transfer::{sync_city_shares, transfer_city};

/// Result of a successfully processed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// State for the next turn. Holds only actions deferred to later turns.
    pub snapshot: TurnSnapshot,
    pub log: TurnLog,
    /// Every action consumed this turn, with its terminal status.
    pub resolved: Vec<Action>,
}

/// Drives one turn with the given rules and collaborators.
pub struct TurnProcessor<'a> {
    rules: &'a RulesConfig,
    defense: &'a dyn DefenseAllocator,
    planner: Option<&'a dyn ActionPlanner>,
}

impl<'a> TurnProcessor<'a> {
    pub fn new(rules: &'a RulesConfig, defense: &'a dyn DefenseAllocator) -> Self {
        TurnProcessor {
            rules,
            defense,
            planner: None,
        }
    }

    /// Lets `planner` propose actions for AI countries that submitted none.
    pub fn with_planner(mut self, planner: &'a dyn ActionPlanner) -> Self {
        self.planner = Some(planner);
        self
    }

    /// Resolves one turn.
    pub fn process<R: Rng + ?Sized>(
        &self,
        snapshot: TurnSnapshot,
        rng: &mut R,
    ) -> Result<TurnOutcome, TurnError> {
        let mut state = GameState::from_snapshot(snapshot)?;
        let turn = state.turn();
        let mut log = TurnLog::new(turn);
        info!(turn, "resolving turn");

        log.extend(advance_deals(&mut state, &self.rules.diplomacy)?);

        for country in state.countries_without_stats() {
            if !state.is_eliminated(country) {
                skip(&mut log, "economy", format!("no stats for {}", country));
            }
        }

        for delta in run_economy(&mut state, &self.rules.economy)? {
            log.push(TurnEvent::Economy {
                country: delta.country,
                budget_change: delta.budget,
                population_change: delta.population,
                starving: delta.starving,
            });
        }
        // Owners without stats are reported once, after the closing sync.
        sync_city_shares(&mut state)?;

        if let Some(planner) = self.planner {
            self.append_planned(&mut state, planner, &mut log);
        }

        let mut deferred = Vec::new();
        let mut attacks = Vec::new();
        let mut others = Vec::new();
        let mut resolved = Vec::new();
        for action in state.take_pending_actions() {
            if !action.is_pending() {
                warn!(action = %action.id, "already-resolved action in queue; dropped");
            } else if action.turn > turn {
                log.push(TurnEvent::ActionDeferred {
                    action: action.id,
                    country: action.country,
                    turn: action.turn,
                });
                deferred.push(action);
            } else if action.is_attack() {
                attacks.push(action);
            } else {
                others.push(action);
            }
        }

        let resolver = ActionResolver::new(self.rules);
        for action in others {
            let done = resolver.resolve(&mut state, action).map_err(|violation| {
                error!(%violation, "turn aborted");
                TurnError::from(violation)
            })?;
            log_action(&mut log, &done);
            resolved.push(done);
        }

        let mut combats = Vec::new();
        for action in attacks {
            let step = self.resolve_attack(
                &mut state,
                &resolver,
                &action,
                &mut log,
                &mut combats,
                rng,
            );
            let done = match step {
                Ok(status) => match status {
                    ActionStatus::Executed => action.into_executed(),
                    _ => action.into_failed(ActionError::AttackFailed),
                },
                Err(StepError::Action(err)) => {
                    warn!(
                        action = %action.id,
                        country = %action.country,
                        reason = %err,
                        "attack rejected"
                    );
                    action.into_failed(err)
                }
                Err(StepError::Invariant(violation)) => {
                    error!(%violation, "turn aborted during combat");
                    return Err(violation.into());
                }
            };
            log_action(&mut log, &done);
            resolved.push(done);
        }

        if !combats.is_empty() {
            let ledger = combat_fallout(&state, &combats, &self.rules.diplomacy);
            for country in ledger.commit(&mut state) {
                skip(&mut log, "diplomatic fallout", format!("no stats for {}", country));
            }
        }

        for country in sync_city_shares(&mut state)? {
            skip(&mut log, "city shares", format!("no stats for {}", country));
        }
        for (city, owner) in state.orphaned_cities() {
            skip(
                &mut log,
                "city shares",
                format!("city {} owned by unknown country {}", city, owner),
            );
        }
        state.set_pending_actions(deferred);
        state.advance_turn();

        info!(turn, events = log.len(), "turn resolved");
        Ok(TurnOutcome {
            snapshot: state.into_snapshot(),
            log,
            resolved,
        })
    }

    /// Returns `Executed` for a won attack and `Failed` for a lost or
    /// undefendable one. Validation and affordability failures come back as
    /// errors with their own reason.
    fn resolve_attack<R: Rng + ?Sized>(
        &self,
        state: &mut GameState,
        resolver: &ActionResolver<'_>,
        action: &Action,
        log: &mut TurnLog,
        combats: &mut Vec<CombatFallout>,
        rng: &mut R,
    ) -> Result<ActionStatus, StepError> {
        let ActionKind::Military(MilitaryAction::Attack {
            target_city,
            strength,
        }) = action.kind
        else {
            return Err(ActionError::Validation("not an attack".into()).into());
        };
        let pricing = resolver.approve(state, action)?;
        let attacker = action.country;

        let city = state
            .city(target_city)
            .ok_or(ActionError::UnknownCity(target_city))?;
        let defender = city.owner;
        let attacker_stats = state
            .stats(attacker)
            .ok_or(ActionError::UnknownCountry(attacker))?;
        let defender_stats = state
            .stats(defender)
            .ok_or(ActionError::UnknownCountry(defender))?;

        let request = DefenseRequest {
            defender,
            attacker,
            city,
            defender_stats,
            submitted: state.defense_commitment(defender, target_city),
        };
        let allocation = self
            .defense
            .resolve_defense_allocation(&request)
            .and_then(|value| validate_allocation(value, defender_stats, &self.rules.combat));
        let defense = match allocation {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    action = %action.id,
                    %defender,
                    reason = %err,
                    "invalid defense allocation"
                );
                log.push(TurnEvent::Skipped {
                    phase: "combat".into(),
                    reason: format!("no valid defense allocation for city {}", target_city),
                });
                return Ok(ActionStatus::Failed);
            }
        };

        let result: CombatResult = resolve_combat(
            strength,
            defense,
            attacker_stats,
            defender_stats,
            &self.rules.combat,
            rng,
        );
        let charged = apply_action_cost(&pricing, attacker_stats)?;
        let attacker_next = apply_losses(&charged, result.attacker_losses)?;
        let defender_next = apply_losses(defender_stats, result.defender_losses)?;

        state
            .with_updated_stats(attacker, attacker_next)
            .map_err(|_| ActionError::UnknownCountry(attacker))?;
        state
            .with_updated_stats(defender, defender_next)
            .map_err(|_| ActionError::UnknownCountry(defender))?;

        let broken = violate_pacts_between(state, attacker, defender);
        let pact_broken = !broken.is_empty();
        log.extend(broken);

        debug!(
            action = %action.id,
            %attacker,
            %defender,
            attacker_wins = result.attacker_wins,
            "combat resolved"
        );
        log.push(TurnEvent::Combat {
            action: action.id,
            attacker,
            defender,
            city: target_city,
            attacker_wins: result.attacker_wins,
            attacker_losses: result.attacker_losses,
            defender_losses: result.defender_losses,
        });
        combats.push(CombatFallout {
            attacker,
            defender,
            captured: result.captures_city(),
            pact_broken,
        });

        if !result.captures_city() {
            return Ok(ActionStatus::Failed);
        }
        match transfer_city(state, target_city, attacker) {
            Ok(record) => {
                log.push(TurnEvent::CityCaptured {
                    city: record.city,
                    from: record.from,
                    to: record.to,
                    population: record.population,
                });
                if record.eliminated {
                    log.push(TurnEvent::CountryEliminated { country: record.from });
                }
            }
            Err(StepError::Action(err)) => {
                warn!(city = %target_city, reason = %err, "city transfer skipped");
                log.push(TurnEvent::Skipped {
                    phase: "city transfer".into(),
                    reason: err.to_string(),
                });
            }
            Err(violation) => return Err(violation),
        }
        Ok(ActionStatus::Executed)
    }

    fn append_planned(
        &self,
        state: &mut GameState,
        planner: &dyn ActionPlanner,
        log: &mut TurnLog,
    ) {
        let turn = state.turn();
        let idle: Vec<_> = state
            .active_countries()
            .filter(|c| !c.is_player_controlled())
            .map(|c| c.id)
            .filter(|&id| {
                !state
                    .pending_actions()
                    .iter()
                    .any(|a| a.country == id && a.turn == turn && a.is_pending())
            })
            .collect();
        if idle.is_empty() {
            return;
        }

        let mut queue = state.pending_actions().to_vec();
        'plan: for country in idle {
            for kind in planner.plan(country, state, self.rules) {
                match state.allocate_action_id() {
                    Ok(id) => queue.push(Action::new(id, country, turn, kind)),
                    Err(err) => {
                        skip(log, "planner", err.to_string());
                        break 'plan;
                    }
                }
            }
        }
        debug!(
            added = queue.len() - state.pending_actions().len(),
            "planner actions queued"
        );
        state.set_pending_actions(queue);
    }
}

/// Resolves one turn with the rule-based defender and no planner.
pub fn process_turn<R: Rng + ?Sized>(
    snapshot: TurnSnapshot,
    rules: &RulesConfig,
    rng: &mut R,
) -> Result<TurnOutcome, TurnError> {
    let defense = HeuristicDefense::default();
    TurnProcessor::new(rules, &defense).process(snapshot, rng)
}

fn skip(log: &mut TurnLog, phase: &str, reason: String) {
    warn!(phase, %reason, "skipped");
    log.push(TurnEvent::Skipped {
        phase: phase.into(),
        reason,
    });
}

fn log_action(log: &mut TurnLog, action: &Action) {
    let event = match action.status {
        ActionStatus::Executed => TurnEvent::ActionExecuted {
            action: action.id,
            country: action.country,
            kind: action.kind.label().to_string(),
        },
        _ => TurnEvent::ActionFailed {
            action: action.id,
            country: action.country,
            kind: action.kind.label().to_string(),
            reason: action.reason.clone().unwrap_or_default(),
        },
    };
    log.push(event);
}
