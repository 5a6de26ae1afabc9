//! The closed set of resource kinds and per-country inventories.
//!
//! Inventories are fixed-size arrays indexed by `ResourceKind as usize`, and
//! serialize as `{"copper": 50, ...}` maps. Unknown keys are rejected.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

/// Number of resource kinds.
pub const RESOURCE_COUNT: usize = 8;

/// A tradeable, producible resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Food,
    Timber,
    Iron,
    Copper,
    Coal,
    Oil,
    Steel,
    Gold,
}

/// All resource kinds in index order.
pub const ALL_RESOURCES: [ResourceKind; RESOURCE_COUNT] = [
    ResourceKind::Food,
    ResourceKind::Timber,
    ResourceKind::Iron,
    ResourceKind::Copper,
    ResourceKind::Coal,
    ResourceKind::Oil,
    ResourceKind::Steel,
    ResourceKind::Gold,
];

impl ResourceKind {
    /// Returns the lowercase name used in snapshots and log lines.
    pub const fn name(self) -> &'static str {
        match self {
            ResourceKind::Food => "food",
            ResourceKind::Timber => "timber",
            ResourceKind::Iron => "iron",
            ResourceKind::Copper => "copper",
            ResourceKind::Coal => "coal",
            ResourceKind::Oil => "oil",
            ResourceKind::Steel => "steel",
            ResourceKind::Gold => "gold",
        }
    }

    /// Parses a resource kind from its lowercase name.
    pub fn from_name(s: &str) -> Option<ResourceKind> {
        ALL_RESOURCES.iter().copied().find(|r| r.name() == s)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Non-negative quantities of every resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<ResourceKind, u64>", into = "BTreeMap<ResourceKind, u64>")]
pub struct ResourceInventory([u64; RESOURCE_COUNT]);

impl ResourceInventory {
    /// An empty inventory.
    pub const fn empty() -> Self {
        ResourceInventory([0; RESOURCE_COUNT])
    }

    /// Builds an inventory from `(kind, amount)` pairs; repeated kinds add up.
    pub fn from_pairs(pairs: &[(ResourceKind, u64)]) -> Self {
        let mut inv = ResourceInventory::empty();
        for &(kind, amount) in pairs {
            inv.add(kind, amount);
        }
        inv
    }

    pub fn get(&self, kind: ResourceKind) -> u64 {
        self.0[kind as usize]
    }

    pub fn set(&mut self, kind: ResourceKind, amount: u64) {
        self.0[kind as usize] = amount;
    }

    /// Adds to one resource, saturating at `u64::MAX`.
    pub fn add(&mut self, kind: ResourceKind, amount: u64) {
        let slot = &mut self.0[kind as usize];
        *slot = slot.saturating_add(amount);
    }

    /// Removes from one resource. Returns `None` (and leaves the inventory
    /// untouched) if that would drive the quantity negative.
    #[must_use]
    pub fn checked_remove(&mut self, kind: ResourceKind, amount: u64) -> Option<u64> {
        let slot = &mut self.0[kind as usize];
        let remaining = slot.checked_sub(amount)?;
        *slot = remaining;
        Some(remaining)
    }

    /// Iterates over `(kind, amount)` in index order, including zeros.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, u64)> + '_ {
        ALL_RESOURCES.iter().map(move |&k| (k, self.0[k as usize]))
    }

    /// Sum across all resource kinds.
    pub fn total(&self) -> u64 {
        self.0.iter().fold(0u64, |acc, &v| acc.saturating_add(v))
    }

    /// Element-wise saturating sum.
    pub fn merged(&self, other: &ResourceInventory) -> ResourceInventory {
        let mut out = *self;
        for (kind, amount) in other.iter() {
            out.add(kind, amount);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&v| v == 0)
    }
}

impl Index<ResourceKind> for ResourceInventory {
    type Output = u64;

    fn index(&self, kind: ResourceKind) -> &u64 {
        &self.0[kind as usize]
    }
}

impl From<BTreeMap<ResourceKind, u64>> for ResourceInventory {
    fn from(map: BTreeMap<ResourceKind, u64>) -> Self {
        let mut inv = ResourceInventory::empty();
        for (kind, amount) in map {
            inv.set(kind, amount);
        }
        inv
    }
}

impl From<ResourceInventory> for BTreeMap<ResourceKind, u64> {
    fn from(inv: ResourceInventory) -> Self {
        inv.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_roundtrip() {
        for kind in ALL_RESOURCES {
            assert_eq!(ResourceKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ResourceKind::from_name("uranium"), None);
    }

    #[test]
    fn index_order_matches_discriminant() {
        for (i, kind) in ALL_RESOURCES.iter().enumerate() {
            assert_eq!(*kind as usize, i);
        }
    }

    #[test]
    fn checked_remove_refuses_to_go_negative() {
        let mut inv = ResourceInventory::from_pairs(&[(ResourceKind::Coal, 5)]);
        assert_eq!(inv.checked_remove(ResourceKind::Coal, 6), None);
        assert_eq!(inv.get(ResourceKind::Coal), 5);
        assert_eq!(inv.checked_remove(ResourceKind::Coal, 5), Some(0));
        assert_eq!(inv[ResourceKind::Coal], 0);
    }

    #[test]
    fn json_uses_resource_names() {
        let inv =
            ResourceInventory::from_pairs(&[(ResourceKind::Copper, 50), (ResourceKind::Coal, 7)]);
        let json = serde_json::to_string(&inv).unwrap();
        assert!(json.contains("\"copper\":50"));
        assert!(json.contains("\"coal\":7"));

        let parsed: ResourceInventory = serde_json::from_str(r#"{"iron": 3}"#).unwrap();
        assert_eq!(parsed.get(ResourceKind::Iron), 3);
        assert_eq!(parsed.total(), 3);
    }

    #[test]
    fn json_rejects_unknown_resource() {
        let parsed: Result<ResourceInventory, _> = serde_json::from_str(r#"{"uranium": 3}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn merged_adds_elementwise() {
        let a = ResourceInventory::from_pairs(&[(ResourceKind::Food, 10), (ResourceKind::Gold, 1)]);
        let b = ResourceInventory::from_pairs(&[(ResourceKind::Food, 5)]);
        let m = a.merged(&b);
        assert_eq!(m.get(ResourceKind::Food), 15);
        assert_eq!(m.get(ResourceKind::Gold), 1);
        assert_eq!(m.total(), 16);
    }
}
