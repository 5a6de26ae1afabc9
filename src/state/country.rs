//! Countries and their per-turn economic/military stats.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::resource::{ResourceInventory, ResourceKind};

/// Stable identifier of a country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryId(pub u32);

impl fmt::Display for CountryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who submits a country's actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Controller {
    /// Externally controlled by a human player.
    Player,
    /// Internally controlled; actions come from a planner.
    #[default]
    Ai,
}

/// Identity and display attributes of a country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: CountryId,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub controller: Controller,
}

impl Country {
    pub fn new(id: CountryId, name: impl Into<String>, controller: Controller) -> Self {
        Country {
            id,
            name: name.into(),
            color: String::new(),
            controller,
        }
    }

    pub fn is_player_controlled(&self) -> bool {
        self.controller == Controller::Player
    }
}

/// Production and cost multipliers for a single resource.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceModifier {
    #[serde(default = "one")]
    pub production: f64,
    #[serde(default = "one")]
    pub cost: f64,
}

impl Default for ResourceModifier {
    fn default() -> Self {
        ResourceModifier {
            production: 1.0,
            cost: 1.0,
        }
    }
}

fn one() -> f64 {
    1.0
}

/// A named set of per-resource production/cost modifiers.
///
/// Resources absent from `modifiers` use the neutral modifier (1.0 / 1.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceProfile {
    pub name: String,
    /// Multiplier on the budget cost of every action.
    #[serde(default = "one")]
    pub action_cost: f64,
    #[serde(default)]
    pub modifiers: BTreeMap<ResourceKind, ResourceModifier>,
}

impl Default for ResourceProfile {
    fn default() -> Self {
        ResourceProfile::balanced()
    }
}

impl ResourceProfile {
    /// Neutral profile: every modifier is 1.0.
    pub fn balanced() -> Self {
        ResourceProfile {
            name: "balanced".to_string(),
            action_cost: 1.0,
            modifiers: BTreeMap::new(),
        }
    }

    /// Strong heavy industry, weaker agriculture.
    pub fn industrial() -> Self {
        Self::preset(
            "industrial",
            1.0,
            &[
                (ResourceKind::Iron, 1.25, 0.9),
                (ResourceKind::Coal, 1.25, 1.0),
                (ResourceKind::Steel, 1.3, 0.9),
                (ResourceKind::Food, 0.9, 1.0),
            ],
        )
    }

    /// Food and timber surplus, expensive industrial inputs.
    pub fn agrarian() -> Self {
        Self::preset(
            "agrarian",
            0.95,
            &[
                (ResourceKind::Food, 1.3, 1.0),
                (ResourceKind::Timber, 1.2, 0.9),
                (ResourceKind::Steel, 0.8, 1.2),
                (ResourceKind::Oil, 0.9, 1.1),
            ],
        )
    }

    /// Oil-rich, everything else slightly dearer.
    pub fn petrostate() -> Self {
        Self::preset(
            "petrostate",
            1.05,
            &[
                (ResourceKind::Oil, 1.6, 0.8),
                (ResourceKind::Gold, 1.1, 1.0),
                (ResourceKind::Food, 0.9, 1.1),
                (ResourceKind::Timber, 0.9, 1.1),
            ],
        )
    }

    /// Looks up a preset by name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "balanced" => Some(Self::balanced()),
            "industrial" => Some(Self::industrial()),
            "agrarian" => Some(Self::agrarian()),
            "petrostate" => Some(Self::petrostate()),
            _ => None,
        }
    }

    fn preset(name: &str, action_cost: f64, entries: &[(ResourceKind, f64, f64)]) -> Self {
        let modifiers = entries
            .iter()
            .map(|&(kind, production, cost)| (kind, ResourceModifier { production, cost }))
            .collect();
        ResourceProfile {
            name: name.to_string(),
            action_cost,
            modifiers,
        }
    }

    pub fn production_modifier(&self, kind: ResourceKind) -> f64 {
        self.modifiers.get(&kind).map_or(1.0, |m| m.production)
    }

    pub fn cost_modifier(&self, kind: ResourceKind) -> f64 {
        self.modifiers.get(&kind).map_or(1.0, |m| m.cost)
    }
}

/// Mutable economic/military state of one country for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryStats {
    pub country: CountryId,
    pub population: u64,
    /// The engine never drives this below zero; a negative input blocks actions.
    pub budget: i64,
    pub tech_level: u32,
    pub infrastructure_level: u32,
    pub military_strength: f64,
    #[serde(default)]
    pub resources: ResourceInventory,
    /// Relation score toward other countries, in `0..=100`.
    #[serde(default)]
    pub relations: BTreeMap<CountryId, i32>,
    #[serde(default)]
    pub profile: ResourceProfile,
}

impl CountryStats {
    /// Fresh stats with no resources and no relations.
    pub fn new(country: CountryId) -> Self {
        CountryStats {
            country,
            population: 0,
            budget: 0,
            tech_level: 0,
            infrastructure_level: 0,
            military_strength: 0.0,
            resources: ResourceInventory::empty(),
            relations: BTreeMap::new(),
            profile: ResourceProfile::balanced(),
        }
    }
}
