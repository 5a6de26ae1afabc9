//! Turn event log.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::{ActionId, CityId, CountryId, DealId, DealKind};

/// One thing that happened while resolving a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TurnEvent {
    DealExecuted {
        deal: DealId,
        kind: DealKind,
        proposer: CountryId,
        receiver: CountryId,
    },
    DealViolated {
        deal: DealId,
        kind: DealKind,
        proposer: CountryId,
        receiver: CountryId,
        reason: String,
    },
    DealCompleted {
        deal: DealId,
        kind: DealKind,
        proposer: CountryId,
        receiver: CountryId,
    },
    Economy {
        country: CountryId,
        budget_change: i64,
        population_change: i64,
        starving: bool,
    },
    ActionExecuted {
        action: ActionId,
        country: CountryId,
        kind: String,
    },
    ActionFailed {
        action: ActionId,
        country: CountryId,
        kind: String,
        reason: String,
    },
    ActionDeferred {
        action: ActionId,
        country: CountryId,
        turn: u32,
    },
    /// Allocations stay hidden; only the outcome is reported.
    Combat {
        action: ActionId,
        attacker: CountryId,
        defender: CountryId,
        city: CityId,
        attacker_wins: bool,
        attacker_losses: f64,
        defender_losses: f64,
    },
    CityCaptured {
        city: CityId,
        from: CountryId,
        to: CountryId,
        population: u64,
    },
    CountryEliminated {
        country: CountryId,
    },
    /// A sub-step skipped because its input referenced something missing.
    Skipped {
        phase: String,
        reason: String,
    },
}

impl fmt::Display for TurnEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnEvent::DealExecuted { deal, kind, proposer, receiver } => {
                let kind = kind.label();
                write!(f, "{} {} between {} and {} took effect", kind, deal, proposer, receiver)
            }
            TurnEvent::DealViolated { deal, kind, proposer, receiver, reason } => write!(
                f,
                "{} {} between {} and {} was violated: {}",
                kind.label(),
                deal,
                proposer,
                receiver,
                reason
            ),
            TurnEvent::DealCompleted { deal, kind, proposer, receiver } => {
                let kind = kind.label();
                write!(f, "{} {} between {} and {} ran its course", kind, deal, proposer, receiver)
            }
            TurnEvent::Economy { country, budget_change, population_change, starving } => {
                write!(
                    f,
                    "country {}: budget {:+}, population {:+}",
                    country, budget_change, population_change
                )?;
                if *starving {
                    write!(f, " (starving)")?;
                }
                Ok(())
            }
            TurnEvent::ActionExecuted { action, country, kind } => {
                write!(f, "country {} completed {} (action {})", country, kind, action)
            }
            TurnEvent::ActionFailed { action, country, kind, reason } => {
                write!(f, "country {}: {} failed (action {}): {}", country, kind, action, reason)
            }
            TurnEvent::ActionDeferred { action, country, turn } => {
                write!(f, "country {}: action {} deferred to turn {}", country, action, turn)
            }
            TurnEvent::Combat { attacker, defender, city, attacker_wins, .. } => {
                if *attacker_wins {
                    write!(f, "country {} defeated {} at city {}", attacker, defender, city)
                } else {
                    write!(f, "country {} repelled {} at city {}", defender, attacker, city)
                }
            }
            TurnEvent::CityCaptured { city, from, to, population } => write!(
                f,
                "city {} passed from {} to {} with {} inhabitants",
                city, from, to, population
            ),
            TurnEvent::CountryEliminated { country } => {
                write!(f, "country {} was eliminated", country)
            }
            TurnEvent::Skipped { phase, reason } => write!(f, "{} skipped: {}", phase, reason),
        }
    }
}

/// Ordered event log for one turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnLog {
    /// The turn that was resolved.
    pub turn: u32,
    pub events: Vec<TurnEvent>,
}

impl TurnLog {
    pub fn new(turn: u32) -> Self {
        TurnLog {
            turn,
            events: Vec::new(),
        }
    }

    pub fn push(&mut self, event: TurnEvent) {
        self.events.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = TurnEvent>) {
        self.events.extend(events);
    }

    pub fn iter(&self) -> impl Iterator<Item = &TurnEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Human-readable one-line summaries, in order.
    pub fn summaries(&self) -> Vec<String> {
        self.events.iter().map(ToString::to_string).collect()
    }

    /// Number of cities that changed hands.
    pub fn captures(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, TurnEvent::CityCaptured { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_action_summary_carries_reason() {
        let e = TurnEvent::ActionFailed {
            action: ActionId(4),
            country: CountryId(2),
            kind: "research".into(),
            reason: "insufficient resources: missing 10 copper".into(),
        };
        assert_eq!(
            e.to_string(),
            "country #2: research failed (action #4): insufficient resources: missing 10 copper"
        );
    }

    #[test]
    fn combat_summary_hides_allocations() {
        let e = TurnEvent::Combat {
            action: ActionId(1),
            attacker: CountryId(1),
            defender: CountryId(2),
            city: CityId(3),
            attacker_wins: false,
            attacker_losses: 9.0,
            defender_losses: 2.0,
        };
        let text = e.to_string();
        assert_eq!(text, "country #2 repelled #1 at city #3");
    }

    #[test]
    fn events_serialize_with_tag() {
        let event = TurnEvent::CountryEliminated { country: CountryId(5) };
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json["event"], "country_eliminated");
        assert_eq!(json["country"], 5);
    }

    #[test]
    fn counts_captures() {
        let mut log = TurnLog::new(2);
        log.push(TurnEvent::CityCaptured {
            city: CityId(1),
            from: CountryId(1),
            to: CountryId(2),
            population: 10,
        });
        log.push(TurnEvent::CountryEliminated { country: CountryId(1) });
        assert_eq!(log.captures(), 1);
        assert_eq!(log.summaries().len(), 2);
    }
}
