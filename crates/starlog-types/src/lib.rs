//! Shared type definitions for the Starlog journal engine.
//!
//! This crate is the single source of truth for the reconstructed game
//! state. The aggregate [`GameState`] is composed of independently-owned
//! slices, each mutated by a disjoint subset of journal event kinds and
//! overwritten in narrow, documented ways by companion snapshot merges.
//!
//! # Modules
//!
//! - [`state`] -- the `GameState` aggregate and its slices
//! - [`flags`] -- real-time status flag bitfield decoding
//! - [`slice`] -- slice identifiers used in fold deltas

pub mod flags;
pub mod slice;
pub mod state;

// Re-export all public types at crate root for convenience.
pub use flags::StatusFlags;
pub use slice::StateSlice;
pub use state::{
    CarrierState, CommanderState, ExobiologyState, GameState, LocationState, LockerContents,
    MaterialsState, Mission, MissionsState, OdysseyState, PendingCarrierJump, RankSet,
    ReputationSet, RouteHop, SessionState, ShipModule, ShipState, SuitState,
};
