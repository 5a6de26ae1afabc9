//! Snapshot and outcome JSON.
//!
//! A snapshot document is a serialized `TurnSnapshot`. An outcome document
//! wraps the next snapshot, the event log, the human-readable summaries, and
//! the actions consumed this turn:
//!
//! ```text
//! {"snapshot": {...}, "log": [{"event": "action_executed", ...}],
//!  "summaries": ["..."], "resolved": [...]}
//! ```
//!
//! Submitted actions arrive as JSON lines, one pending action per line.

use std::io::{BufRead, Read};

use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::resolve::{TurnEvent, TurnOutcome};
use crate::state::{Action, GameState, TurnSnapshot};

/// Errors that can occur reading or writing documents.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("inconsistent snapshot: {0}")]
    State(#[from] StateError),

    #[error("action {0} was submitted with a terminal status")]
    NotPending(String),

    #[error("line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: Box<SnapshotError>,
    },
}

/// Serialized turn result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeDocument {
    pub snapshot: TurnSnapshot,
    pub log: Vec<TurnEvent>,
    #[serde(default)]
    pub summaries: Vec<String>,
    #[serde(default)]
    pub resolved: Vec<Action>,
}

impl From<TurnOutcome> for OutcomeDocument {
    fn from(outcome: TurnOutcome) -> Self {
        let summaries = outcome.log.summaries();
        OutcomeDocument {
            snapshot: outcome.snapshot,
            log: outcome.log.events,
            summaries,
            resolved: outcome.resolved,
        }
    }
}

/// Parses and structurally validates a snapshot.
pub fn parse_snapshot(json: &str) -> Result<TurnSnapshot, SnapshotError> {
    let snapshot: TurnSnapshot = serde_json::from_str(json)?;
    GameState::from_snapshot(snapshot.clone())?;
    Ok(snapshot)
}

/// Reads a snapshot from any reader.
pub fn read_snapshot(mut reader: impl Read) -> Result<TurnSnapshot, SnapshotError> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    parse_snapshot(&buf)
}

pub fn encode_snapshot(snapshot: &TurnSnapshot) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

/// Parses one externally proposed action. Only pending actions are accepted.
pub fn parse_action(json: &str) -> Result<Action, SnapshotError> {
    let action: Action = serde_json::from_str(json)?;
    if !action.is_pending() {
        return Err(SnapshotError::NotPending(action.id.to_string()));
    }
    Ok(action)
}

/// Reads submitted actions as JSON lines. Blank lines are ignored.
pub fn read_actions(reader: impl BufRead) -> Result<Vec<Action>, SnapshotError> {
    let mut actions = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let action = parse_action(&line).map_err(|source| SnapshotError::Line {
            line: i + 1,
            source: Box::new(source),
        })?;
        actions.push(action);
    }
    Ok(actions)
}

/// Queues `actions` behind the snapshot's pending ones, rejecting the
/// batch if the result is not a consistent snapshot.
pub fn submit_actions(
    snapshot: &mut TurnSnapshot,
    actions: Vec<Action>,
) -> Result<(), SnapshotError> {
    let mut merged = snapshot.clone();
    merged.pending_actions.extend(actions);
    GameState::from_snapshot(merged.clone())?;
    *snapshot = merged;
    Ok(())
}

pub fn encode_outcome(outcome: TurnOutcome) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(&OutcomeDocument::from(outcome))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::standard_scenario;
    use crate::state::{ActionId, ActionKind, CityId, CountryId, MilitaryAction};

    #[test]
    fn snapshot_roundtrip() {
        let snapshot = standard_scenario(2, 2);
        let json = encode_snapshot(&snapshot).unwrap();
        assert_eq!(parse_snapshot(&json).unwrap(), snapshot);
    }

    #[test]
    fn resources_are_keyed_by_name() {
        let json = encode_snapshot(&standard_scenario(1, 1)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["stats"][0]["resources"]["copper"], 50);
    }

    #[test]
    fn structural_errors_are_reported() {
        let mut snapshot = standard_scenario(2, 1);
        snapshot.cities[1].id = snapshot.cities[0].id;
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(matches!(parse_snapshot(&json), Err(SnapshotError::State(_))));
    }

    #[test]
    fn parses_advisory_attack() {
        let json = r#"{
            "id": 3, "country": 1, "turn": 0,
            "kind": {"type": "military", "payload": {
                "order": "attack", "target_city": 2, "strength": 12.5
            }}
        }"#;
        let action = parse_action(json).unwrap();
        assert_eq!(
            action.kind,
            ActionKind::Military(MilitaryAction::Attack {
                target_city: CityId(2),
                strength: 12.5
            })
        );
        assert!(action.is_pending());
    }

    #[test]
    fn rejects_unknown_action_type() {
        let json = r#"{"id": 3, "country": 1, "turn": 0, "kind": {"type": "nuke"}}"#;
        assert!(matches!(parse_action(json), Err(SnapshotError::Json(_))));
    }

    #[test]
    fn rejects_presettled_action() {
        let json = r#"{"id": 3, "country": 1, "turn": 0,
            "kind": {"type": "research"}, "status": "executed"}"#;
        assert!(matches!(parse_action(json), Err(SnapshotError::NotPending(_))));
    }

    #[test]
    fn rejects_unknown_resource() {
        let mut value = serde_json::to_value(standard_scenario(1, 1)).unwrap();
        value["stats"][0]["resources"]["uranium"] = 5.into();
        assert!(matches!(
            parse_snapshot(&value.to_string()),
            Err(SnapshotError::Json(_))
        ));
    }

    #[test]
    fn reads_action_lines() {
        let input = concat!(
            r#"{"id": 4, "country": 1, "turn": 0, "kind": {"type": "research"}}"#,
            "\n\n",
            r#"{"id": 5, "country": 2, "turn": 1, "kind": {"type": "research"}}"#,
            "\n",
        );
        let actions = read_actions(input.as_bytes()).unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[1].id, ActionId(5));
        assert_eq!(actions[1].turn, 1);
    }

    #[test]
    fn bad_action_line_names_its_line() {
        let input = concat!(
            r#"{"id": 4, "country": 1, "turn": 0, "kind": {"type": "research"}}"#,
            "\n",
            r#"{"id": 5, "country": 1, "turn": 0, "kind": {"type": "nuke"}}"#,
        );
        let err = read_actions(input.as_bytes()).unwrap_err();
        assert!(matches!(err, SnapshotError::Line { line: 2, .. }));
    }

    #[test]
    fn submitted_actions_join_the_queue() {
        let mut snapshot = standard_scenario(2, 1);
        let action = Action::new(ActionId(0), CountryId(1), 0, ActionKind::Research);
        submit_actions(&mut snapshot, vec![action.clone()]).unwrap();
        assert_eq!(snapshot.pending_actions, vec![action.clone()]);

        let err = submit_actions(&mut snapshot, vec![action]).unwrap_err();
        assert!(matches!(err, SnapshotError::State(_)));
        assert_eq!(snapshot.pending_actions.len(), 1);
    }
}
