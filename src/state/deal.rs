//! Bilateral deals and their lifecycle.
//!
//! `Draft -> Proposed -> Accepted | Rejected`, then `Accepted -> Active`
//! once commitments are executed, and finally `Completed` or `Violated`.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::country::CountryId;
use super::resource::ResourceKind;

/// Stable identifier of a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DealId(pub u64);

impl fmt::Display for DealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The nature of a deal, which sizes its diplomatic effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealKind {
    Alliance,
    NonAggression,
    MilitaryAid,
    Trade,
}

impl DealKind {
    /// Whether attacking the other party breaks this deal.
    pub const fn is_pact(self) -> bool {
        matches!(self, DealKind::Alliance | DealKind::NonAggression)
    }

    pub const fn label(self) -> &'static str {
        match self {
            DealKind::Alliance => "alliance",
            DealKind::NonAggression => "non-aggression pact",
            DealKind::MilitaryAid => "military aid deal",
            DealKind::Trade => "trade deal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStatus {
    Draft,
    Proposed,
    Accepted,
    Rejected,
    Active,
    Completed,
    Violated,
}

/// One thing a party promises to hand over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Commitment {
    Resource { resource: ResourceKind, amount: u64 },
    Budget { amount: u64 },
    Military { strength: f64 },
}

/// A bilateral commitment structure between two countries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: DealId,
    pub kind: DealKind,
    pub proposer: CountryId,
    pub receiver: CountryId,
    /// What the proposer hands to the receiver.
    #[serde(default)]
    pub proposer_commitments: Vec<Commitment>,
    /// What the receiver hands to the proposer.
    #[serde(default)]
    pub receiver_commitments: Vec<Commitment>,
    /// Number of turns the deal stays active; `None` means open-ended.
    #[serde(default)]
    pub duration: Option<u32>,
    pub status: DealStatus,
    /// Turn in which the commitments were executed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated_turn: Option<u32>,
}

impl Deal {
    /// Returns true if the deal is between `a` and `b`, in either direction.
    pub fn involves(&self, a: CountryId, b: CountryId) -> bool {
        (self.proposer == a && self.receiver == b) || (self.proposer == b && self.receiver == a)
    }

    /// Returns true if the deal is an active pact between `a` and `b`.
    pub fn is_active_pact_between(&self, a: CountryId, b: CountryId) -> bool {
        self.status == DealStatus::Active && self.kind.is_pact() && self.involves(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deal(kind: DealKind, status: DealStatus) -> Deal {
        Deal {
            id: DealId(1),
            kind,
            proposer: CountryId(1),
            receiver: CountryId(2),
            proposer_commitments: Vec::new(),
            receiver_commitments: Vec::new(),
            duration: None,
            status,
            activated_turn: None,
        }
    }

    #[test]
    fn involves_is_symmetric() {
        let d = deal(DealKind::Trade, DealStatus::Active);
        assert!(d.involves(CountryId(1), CountryId(2)));
        assert!(d.involves(CountryId(2), CountryId(1)));
        assert!(!d.involves(CountryId(1), CountryId(3)));
    }

    #[test]
    fn only_active_pacts_count() {
        assert!(deal(DealKind::Alliance, DealStatus::Active)
            .is_active_pact_between(CountryId(2), CountryId(1)));
        assert!(!deal(DealKind::Trade, DealStatus::Active)
            .is_active_pact_between(CountryId(1), CountryId(2)));
        assert!(!deal(DealKind::NonAggression, DealStatus::Accepted)
            .is_active_pact_between(CountryId(1), CountryId(2)));
    }

    #[test]
    fn commitment_json() {
        let json = r#"[{"type":"resource","resource":"oil","amount":20},
                       {"type":"budget","amount":300},
                       {"type":"military","strength":5.0}]"#;
        let parsed: Vec<Commitment> = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed[0],
            Commitment::Resource {
                resource: ResourceKind::Oil,
                amount: 20
            }
        );
        assert_eq!(parsed[1], Commitment::Budget { amount: 300 });
    }
}
