//! Statecraft turn-resolution engine library.
//!
//! Exposes the game-state model, the resource and cost model, the
//! per-turn resolvers, and the turn processor that sequences them, for
//! use by integration tests and the binary entry points.

pub mod config;
pub mod cost;
pub mod error;
pub mod planner;
pub mod protocol;
pub mod resolve;
pub mod scenario;
pub mod simulate;
pub mod state;
