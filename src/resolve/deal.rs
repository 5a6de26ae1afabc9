//! Deal execution and lifecycle.
//!
//! An accepted deal executes every commitment from both sides at once, or
//! none of them. Execution happens exactly once; the deal then stays
//! `Active` until its duration runs out or one party attacks the other.

use tracing::{info, warn};

use crate::error::{InvariantViolation, TurnError};
use crate::state::{
    Commitment, CountryId, CountryStats, Deal, DealId, DealStatus, GameState, ResourceInventory,
    ALL_RESOURCES,
};

use super::diplomacy::{apply_delta, DiplomacyConfig};
use super::event::TurnEvent;

/// Totals one party has promised to hand over.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Obligation {
    resources: ResourceInventory,
    budget: u64,
    strength: f64,
}

impl Obligation {
    fn of(commitments: &[Commitment]) -> Self {
        commitments.iter().fold(Obligation::default(), |mut acc, c| {
            match *c {
                Commitment::Resource { resource, amount } => acc.resources.add(resource, amount),
                Commitment::Budget { amount } => acc.budget = acc.budget.saturating_add(amount),
                Commitment::Military { strength } => acc.strength += strength.max(0.0),
            }
            acc
        })
    }

    /// Names the first thing `stats` cannot cover, if any.
    fn shortfall(&self, stats: &CountryStats) -> Option<String> {
        for kind in ALL_RESOURCES {
            let owed = self.resources.get(kind);
            if stats.resources.get(kind) < owed {
                return Some(format!("{} cannot deliver {} {}", stats.country, owed, kind));
            }
        }
        if stats.budget < 0 || (stats.budget as u64) < self.budget {
            return Some(format!("{} cannot pay {} budget", stats.country, self.budget));
        }
        if stats.military_strength < self.strength {
            return Some(format!("{} cannot send {:.1} strength", stats.country, self.strength));
        }
        None
    }

    /// Moves this obligation from `giver` to `taker`.
    fn transfer(
        &self,
        giver: &mut CountryStats,
        taker: &mut CountryStats,
    ) -> Result<(), InvariantViolation> {
        for kind in ALL_RESOURCES {
            let amount = self.resources.get(kind);
            let available = giver.resources.get(kind);
            if giver.resources.checked_remove(kind, amount).is_none() {
                return Err(InvariantViolation::NegativeResource {
                    country: giver.country,
                    resource: kind,
                    available,
                    requested: amount,
                });
            }
            taker.resources.add(kind, amount);
        }
        let budget = i64::try_from(self.budget).unwrap_or(i64::MAX);
        giver.budget -= budget;
        taker.budget += budget;
        if giver.budget < 0 {
            return Err(InvariantViolation::NegativeBudget {
                country: giver.country,
                budget: giver.budget,
            });
        }
        if giver.military_strength + 1e-9 < self.strength {
            return Err(InvariantViolation::NegativeStrength {
                country: giver.country,
                available: giver.military_strength,
                requested: self.strength,
            });
        }
        giver.military_strength = (giver.military_strength - self.strength).max(0.0);
        taker.military_strength += self.strength;
        Ok(())
    }
}

/// Executes accepted deals and expires finished ones for the turn being
/// resolved. Returns the lifecycle events in deal order.
pub fn advance_deals(
    state: &mut GameState,
    config: &DiplomacyConfig,
) -> Result<Vec<TurnEvent>, TurnError> {
    let turn = state.turn();
    let deals: Vec<Deal> = state.deals().to_vec();
    let mut events = Vec::new();

    for deal in deals {
        match deal.status {
            DealStatus::Active => {
                let (Some(start), Some(duration)) = (deal.activated_turn, deal.duration) else {
                    continue;
                };
                if turn >= start.saturating_add(duration) {
                    set_status(state, deal.id, DealStatus::Completed);
                    info!(deal = %deal.id, "deal completed");
                    events.push(TurnEvent::DealCompleted {
                        deal: deal.id,
                        kind: deal.kind,
                        proposer: deal.proposer,
                        receiver: deal.receiver,
                    });
                }
            }
            DealStatus::Accepted => events.push(execute_deal(state, &deal, config)?),
            _ => {}
        }
    }
    Ok(events)
}

fn execute_deal(
    state: &mut GameState,
    deal: &Deal,
    config: &DiplomacyConfig,
) -> Result<TurnEvent, TurnError> {
    let violated = |state: &mut GameState, reason: String| {
        warn!(deal = %deal.id, %reason, "deal could not be executed");
        set_status(state, deal.id, DealStatus::Violated);
        TurnEvent::DealViolated {
            deal: deal.id,
            kind: deal.kind,
            proposer: deal.proposer,
            receiver: deal.receiver,
            reason,
        }
    };

    if deal.proposer == deal.receiver {
        return Ok(violated(state, "a deal needs two distinct parties".into()));
    }
    for party in [deal.proposer, deal.receiver] {
        if state.is_eliminated(party) {
            return Ok(violated(state, format!("{} has been eliminated", party)));
        }
    }
    let (Some(mut next_proposer), Some(mut next_receiver)) = (
        state.stats(deal.proposer).cloned(),
        state.stats(deal.receiver).cloned(),
    ) else {
        return Ok(violated(state, "a party is missing from the game".into()));
    };

    let from_proposer = Obligation::of(&deal.proposer_commitments);
    let from_receiver = Obligation::of(&deal.receiver_commitments);
    if let Some(reason) = from_proposer
        .shortfall(&next_proposer)
        .or_else(|| from_receiver.shortfall(&next_receiver))
    {
        return Ok(violated(state, reason));
    }

    from_proposer.transfer(&mut next_proposer, &mut next_receiver)?;
    from_receiver.transfer(&mut next_receiver, &mut next_proposer)?;

    let boost = config.deal_boost(deal.kind);
    let next_proposer = apply_delta(&next_proposer, deal.receiver, boost);
    let next_receiver = apply_delta(&next_receiver, deal.proposer, boost);

    state.with_updated_stats(deal.proposer, next_proposer)?;
    state.with_updated_stats(deal.receiver, next_receiver)?;
    let turn = state.turn();
    if let Some(d) = state.deal_mut(deal.id) {
        d.status = DealStatus::Active;
        d.activated_turn = Some(turn);
    }

    info!(deal = %deal.id, kind = deal.kind.label(), "deal executed");
    Ok(TurnEvent::DealExecuted {
        deal: deal.id,
        kind: deal.kind,
        proposer: deal.proposer,
        receiver: deal.receiver,
    })
}

/// Marks every active pact between `a` and `b` as violated.
pub fn violate_pacts_between(state: &mut GameState, a: CountryId, b: CountryId) -> Vec<TurnEvent> {
    let broken: Vec<Deal> = state
        .deals()
        .iter()
        .filter(|d| d.is_active_pact_between(a, b))
        .cloned()
        .collect();
    broken
        .into_iter()
        .map(|deal| {
            set_status(state, deal.id, DealStatus::Violated);
            warn!(deal = %deal.id, attacker = %a, "pact broken by attack");
            TurnEvent::DealViolated {
                deal: deal.id,
                kind: deal.kind,
                proposer: deal.proposer,
                receiver: deal.receiver,
                reason: format!("{} attacked {}", a, b),
            }
        })
        .collect()
}

fn set_status(state: &mut GameState, id: DealId, status: DealStatus) {
    if let Some(d) = state.deal_mut(id) {
        d.status = status;
    }
}
