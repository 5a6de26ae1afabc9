//! Submitted actions: a closed tagged union over every action kind.
//!
//! Each action is created by a country for a specific turn, consumed
//! exactly once by the action resolver, and kept afterwards as history
//! with a terminal status.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::city::CityId;
use super::country::CountryId;

/// Stable identifier of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub u64);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of an action. `Executed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    #[default]
    Pending,
    Executed,
    Failed,
}

/// Military orders.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "order", rename_all = "snake_case")]
pub enum MilitaryAction {
    /// Raise `units` worth of new military strength.
    Recruit { units: u32 },
    /// Commit `strength` to capture `target_city`.
    Attack { target_city: CityId, strength: f64 },
    /// Pre-commit `strength` to hold one of the actor's own cities this turn.
    Defend { city: CityId, strength: f64 },
}

/// Economic projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "project", rename_all = "snake_case")]
pub enum EconomicAction {
    Infrastructure,
}

/// Direction of a diplomatic gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Improve,
    Denounce,
}

/// A diplomatic gesture toward another country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiplomacyAction {
    pub target: CountryId,
    pub stance: Stance,
}

/// What an action does, with the payload its kind requires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ActionKind {
    Research,
    Infrastructure,
    Military(MilitaryAction),
    Economic(EconomicAction),
    Diplomacy(DiplomacyAction),
}

impl ActionKind {
    /// Short human-readable label used in the event log.
    pub const fn label(&self) -> &'static str {
        match self {
            ActionKind::Research => "research",
            ActionKind::Infrastructure => "infrastructure",
            ActionKind::Military(MilitaryAction::Recruit { .. }) => "recruitment",
            ActionKind::Military(MilitaryAction::Attack { .. }) => "attack",
            ActionKind::Military(MilitaryAction::Defend { .. }) => "defense",
            ActionKind::Economic(EconomicAction::Infrastructure) => "economic infrastructure",
            ActionKind::Diplomacy(DiplomacyAction {
                stance: Stance::Improve,
                ..
            }) => "diplomatic outreach",
            ActionKind::Diplomacy(DiplomacyAction {
                stance: Stance::Denounce,
                ..
            }) => "denunciation",
        }
    }

    pub const fn is_attack(&self) -> bool {
        matches!(self, ActionKind::Military(MilitaryAction::Attack { .. }))
    }
}

/// A submitted action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub country: CountryId,
    /// The turn this action is meant to be resolved in.
    pub turn: u32,
    pub kind: ActionKind,
    #[serde(default)]
    pub status: ActionStatus,
    /// Failure reason, surfaced to the submitting party.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Action {
    /// Creates a pending action.
    pub fn new(id: ActionId, country: CountryId, turn: u32, kind: ActionKind) -> Self {
        Action {
            id,
            country,
            turn,
            kind,
            status: ActionStatus::Pending,
            reason: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ActionStatus::Pending
    }

    pub fn is_attack(&self) -> bool {
        self.kind.is_attack()
    }

    /// Moves the action to `Executed`.
    pub(crate) fn into_executed(mut self) -> Self {
        debug_assert!(self.is_pending(), "action {} resolved twice", self.id);
        self.status = ActionStatus::Executed;
        self.reason = None;
        self
    }

    /// Moves the action to `Failed` with a reason.
    pub(crate) fn into_failed(mut self, reason: impl fmt::Display) -> Self {
        debug_assert!(self.is_pending(), "action {} resolved twice", self.id);
        self.status = ActionStatus::Failed;
        self.reason = Some(reason.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_kind_json_has_no_payload() {
        let json = serde_json::to_string(&ActionKind::Research).unwrap();
        assert_eq!(json, r#"{"type":"research"}"#);
        let back: ActionKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ActionKind::Research);
    }

    #[test]
    fn attack_json_shape() {
        let json =
            r#"{"type":"military","payload":{"order":"attack","target_city":7,"strength":30.0}}"#;
        let kind: ActionKind = serde_json::from_str(json).unwrap();
        assert_eq!(
            kind,
            ActionKind::Military(MilitaryAction::Attack {
                target_city: CityId(7),
                strength: 30.0
            })
        );
        assert!(kind.is_attack());
    }

    #[test]
    fn payload_missing_required_field_is_rejected() {
        let json = r#"{"type":"military","payload":{"order":"recruit"}}"#;
        assert!(serde_json::from_str::<ActionKind>(json).is_err());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let json = r#"{"type":"espionage","payload":{}}"#;
        assert!(serde_json::from_str::<ActionKind>(json).is_err());
    }

    #[test]
    fn action_defaults_to_pending() {
        let json = r#"{"id": 1, "country": 2, "turn": 5,
                       "kind": {"type": "economic", "payload": {"project": "infrastructure"}}}"#;
        let action: Action = serde_json::from_str(json).unwrap();
        assert!(action.is_pending());
        assert_eq!(action.kind.label(), "economic infrastructure");
    }

    #[test]
    fn terminal_transitions() {
        let a = Action::new(ActionId(1), CountryId(1), 0, ActionKind::Research);
        let failed = a.clone().into_failed("no copper");
        assert_eq!(failed.status, ActionStatus::Failed);
        assert_eq!(failed.reason.as_deref(), Some("no copper"));
        let done = a.into_executed();
        assert_eq!(done.status, ActionStatus::Executed);
        assert!(done.reason.is_none());
    }
}
