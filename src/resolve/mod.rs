//! Turn resolution.
//!
//! Each submodule owns one rule area. `turn` sequences them into the fixed
//! per-turn phase order.

pub mod action;
pub mod combat;
pub mod deal;
pub mod defense;
pub mod diplomacy;
pub mod economy;
pub mod event;
pub mod transfer;
pub mod turn;

pub use action::ActionResolver;
pub use combat::{effective_strength, resolve_combat, CombatConfig, CombatResult};
pub use defense::{AllocationError, DefenseAllocator, DefenseRequest, HeuristicDefense};
pub use diplomacy::{apply_delta, get_score, DiplomacyConfig};
pub use economy::{compute_delta, EconomicDelta, EconomyConfig};
pub use event::{TurnEvent, TurnLog};
pub use transfer::{transfer_city, TransferRecord};
pub use turn::{process_turn, TurnOutcome, TurnProcessor};
