//! Game-state types.
//!
//! Contains the data model for countries, their per-turn stats, cities,
//! submitted actions, and deals, plus the mutable turn state that every
//! resolver reads and writes through.

pub mod action;
pub mod city;
pub mod country;
pub mod deal;
pub mod game;
pub mod resource;

pub use action::{
    Action, ActionId, ActionKind, ActionStatus, DiplomacyAction, EconomicAction, MilitaryAction,
    Stance,
};
pub use city::{apportion, City, CityId};
pub use country::{Controller, Country, CountryId, CountryStats, ResourceModifier, ResourceProfile};
pub use deal::{Commitment, Deal, DealId, DealKind, DealStatus};
pub use game::{GameState, TurnSnapshot};
pub use resource::{ResourceInventory, ResourceKind, ALL_RESOURCES, RESOURCE_COUNT};
