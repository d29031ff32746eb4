//! Slice identifiers for fold deltas.
//!
//! The reducer reports which slices of [`GameState`] an event touched by
//! returning a list of these identifiers. Consumers (logging, change
//! notification) use them to react to state changes without diffing the
//! whole aggregate.
//!
//! [`GameState`]: crate::state::GameState

use serde::{Deserialize, Serialize};

/// Identifies one independently-owned slice of the game state aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StateSlice {
    /// Commander identity, credits, ranks, and reputation.
    Commander,
    /// Current ship, its modules, fuel, cargo, and real-time flags.
    Ship,
    /// Current system, body, station, and positional flags.
    Location,
    /// Raw, manufactured, and encoded material inventories.
    Materials,
    /// Active mission list.
    Missions,
    /// Cumulative counters for the current process lifetime.
    Session,
    /// Fleet carrier state.
    Carrier,
    /// On-foot suits, backpack, ship locker, and exobiology.
    Odyssey,
}

impl StateSlice {
    /// Return the lowercase name of the slice for log output.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Commander => "commander",
            Self::Ship => "ship",
            Self::Location => "location",
            Self::Materials => "materials",
            Self::Missions => "missions",
            Self::Session => "session",
            Self::Carrier => "carrier",
            Self::Odyssey => "odyssey",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_names_are_distinct() {
        let slices = [
            StateSlice::Commander,
            StateSlice::Ship,
            StateSlice::Location,
            StateSlice::Materials,
            StateSlice::Missions,
            StateSlice::Session,
            StateSlice::Carrier,
            StateSlice::Odyssey,
        ];
        let names: std::collections::BTreeSet<&str> =
            slices.iter().map(|s| s.name()).collect();
        assert_eq!(names.len(), slices.len());
    }
}
