//! Error taxonomy for turn resolution.
//!
//! Validation, affordability, and missing-reference failures are recoverable:
//! the offending action is marked `failed` and the turn continues. Invariant
//! violations are programming errors and abort the turn.

use thiserror::Error;

use crate::state::{ActionId, CityId, CountryId, ResourceKind};

/// Broad class of a recoverable action failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Validation,
    Affordability,
    MissingReference,
}

/// Why a single action (or attack) was rejected.
///
/// The `Display` string is the reason reported back to the submitting party.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    #[error("invalid action: {0}")]
    Validation(String),

    #[error("action {0} has already been resolved")]
    AlreadyResolved(ActionId),

    #[error("action targets turn {action_turn}, but turn {current_turn} is being resolved")]
    Stale { action_turn: u32, current_turn: u32 },

    #[error("insufficient resources: missing {}", format_shortfall(.missing))]
    MissingResources {
        missing: Vec<(ResourceKind, u64)>,
        penalty_multiplier: f64,
    },

    #[error("insufficient budget: need {required}, have {available}")]
    InsufficientBudget { required: i64, available: i64 },

    #[error("unknown country {0}")]
    UnknownCountry(CountryId),

    #[error("unknown city {0}")]
    UnknownCity(CityId),

    #[error("country {0} has been eliminated")]
    Eliminated(CountryId),

    /// Names no numbers; the defender's allocation stays hidden.
    #[error("attack failed")]
    AttackFailed,
}

impl ActionError {
    /// Returns the taxonomy bucket this failure belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ActionError::MissingResources { .. } | ActionError::InsufficientBudget { .. } => {
                ErrorCategory::Affordability
            }
            ActionError::UnknownCountry(_) | ActionError::UnknownCity(_) => {
                ErrorCategory::MissingReference
            }
            ActionError::Validation(_)
            | ActionError::AlreadyResolved(_)
            | ActionError::Stale { .. }
            | ActionError::Eliminated(_)
            | ActionError::AttackFailed => ErrorCategory::Validation,
        }
    }
}

fn format_shortfall(missing: &[(ResourceKind, u64)]) -> String {
    missing
        .iter()
        .map(|(kind, amount)| format!("{} {}", amount, kind))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A broken engine invariant. Never clamped away.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error(
        "{country}: {resource} would go negative ({available} available, {requested} requested)"
    )]
    NegativeResource {
        country: CountryId,
        resource: ResourceKind,
        available: u64,
        requested: u64,
    },

    #[error("{country}: population would go negative ({available} available, {requested} removed)")]
    NegativePopulation {
        country: CountryId,
        available: u64,
        requested: u64,
    },

    #[error(
        "{country}: military strength would go negative ({available} available, {requested} lost)"
    )]
    NegativeStrength {
        country: CountryId,
        available: f64,
        requested: f64,
    },

    #[error("{country}: budget would be left negative ({budget})")]
    NegativeBudget { country: CountryId, budget: i64 },

    #[error("{quantity} not conserved: {before} before, {after} after")]
    NotConserved {
        quantity: String,
        before: u64,
        after: u64,
    },
}

/// A structurally invalid snapshot or state write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("duplicate country {0}")]
    DuplicateCountry(CountryId),

    #[error("duplicate stats row for {0}")]
    DuplicateStats(CountryId),

    #[error("stats row for unknown country {0}")]
    UnknownCountry(CountryId),

    #[error("duplicate city {0}")]
    DuplicateCity(CityId),

    #[error("unknown city {0}")]
    UnknownCity(CityId),

    #[error("stats row for {found} written under {expected}")]
    MismatchedStats { expected: CountryId, found: CountryId },

    #[error("duplicate action {0}")]
    DuplicateAction(ActionId),

    #[error("relation score {score} between {country} and {other} is outside 0..=100")]
    RelationOutOfRange {
        country: CountryId,
        other: CountryId,
        score: i32,
    },

    #[error("action ids exhausted")]
    ActionIdExhausted,
}

/// Failure of one sub-step: recoverable action failure or fatal invariant break.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepError {
    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

/// Fatal errors that abort a whole turn. The caller keeps the prior snapshot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TurnError {
    #[error("invalid snapshot: {0}")]
    State(#[from] StateError),

    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}
