//! Persistence boundary.
//!
//! JSON encoding for turn snapshots, submitted actions, and turn outcomes.
//! The engine itself performs no I/O; the binaries use these helpers.

pub mod snapshot;

pub use snapshot::{
    encode_outcome, encode_snapshot, parse_action, parse_snapshot, read_actions, read_snapshot,
    submit_actions, OutcomeDocument, SnapshotError,
};
