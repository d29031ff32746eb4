//! Real-time status flag decoding.
//!
//! The game writes its instantaneous state as two packed bitfields
//! (`Flags` and `Flags2`) in the status companion snapshot. This module
//! decodes the bits the engine tracks into a plain boolean struct so the
//! rest of the workspace never handles raw bit arithmetic.
//!
//! Bit positions are fixed by the upstream game and never reused; unknown
//! bits are ignored, so a newer game version cannot break decoding.

use serde::{Deserialize, Serialize};

// `Flags` bit positions.
const DOCKED: u64 = 1;
const LANDED: u64 = 1 << 1;
const GEAR_DOWN: u64 = 1 << 2;
const SHIELDS_UP: u64 = 1 << 3;
const SUPERCRUISE: u64 = 1 << 4;
const FLIGHT_ASSIST_OFF: u64 = 1 << 5;
const HARDPOINTS_DEPLOYED: u64 = 1 << 6;
const LIGHTS_ON: u64 = 1 << 8;
const CARGO_SCOOP_OPEN: u64 = 1 << 9;
const SILENT_RUNNING: u64 = 1 << 10;
const SCOOPING_FUEL: u64 = 1 << 11;
const FSD_MASSLOCKED: u64 = 1 << 16;
const FSD_CHARGING: u64 = 1 << 17;
const FSD_COOLDOWN: u64 = 1 << 18;
const LOW_FUEL: u64 = 1 << 19;
const OVERHEATING: u64 = 1 << 20;
const HAS_LAT_LONG: u64 = 1 << 21;
const IN_DANGER: u64 = 1 << 22;
const BEING_INTERDICTED: u64 = 1 << 23;
const IN_MAIN_SHIP: u64 = 1 << 24;
const IN_FIGHTER: u64 = 1 << 25;
const IN_SRV: u64 = 1 << 26;
const NIGHT_VISION: u64 = 1 << 28;

// `Flags2` bit positions.
const ON_FOOT: u64 = 1;
const IN_TAXI: u64 = 1 << 1;
const GLIDE_MODE: u64 = 1 << 12;

/// Decoded instantaneous status flags.
///
/// A default value (all false) represents "no live status known", which is
/// the state before the first status snapshot has been observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusFlags {
    /// Docked at a station or settlement pad.
    pub docked: bool,
    /// Landed on a planetary surface.
    pub landed: bool,
    /// Landing gear deployed.
    pub gear_down: bool,
    /// Shields online.
    pub shields_up: bool,
    /// In supercruise.
    pub supercruise: bool,
    /// Flight assist disabled.
    pub flight_assist_off: bool,
    /// Hardpoints deployed.
    pub hardpoints_deployed: bool,
    /// Ship lights on.
    pub lights_on: bool,
    /// Cargo scoop deployed.
    pub cargo_scoop_open: bool,
    /// Silent running engaged.
    pub silent_running: bool,
    /// Currently scooping fuel from a star.
    pub scooping_fuel: bool,
    /// Frame shift drive masslocked.
    pub fsd_masslocked: bool,
    /// Frame shift drive charging for a jump.
    pub fsd_charging: bool,
    /// Frame shift drive on cooldown.
    pub fsd_cooldown: bool,
    /// Main tank below the low-fuel threshold.
    pub low_fuel: bool,
    /// Heat above the overheat threshold.
    pub overheating: bool,
    /// Surface coordinates are valid.
    pub has_lat_long: bool,
    /// The game considers the commander in danger.
    pub in_danger: bool,
    /// Currently being interdicted.
    pub being_interdicted: bool,
    /// Commander is aboard the main ship.
    pub in_main_ship: bool,
    /// Commander is flying a fighter.
    pub in_fighter: bool,
    /// Commander is driving an SRV.
    pub in_srv: bool,
    /// Night vision active.
    pub night_vision: bool,
    /// Commander is on foot.
    pub on_foot: bool,
    /// Commander is riding a taxi or dropship.
    pub in_taxi: bool,
    /// On-foot glide descent in progress.
    pub glide_mode: bool,
}

impl StatusFlags {
    /// Decode the two raw bitfields from a status snapshot.
    ///
    /// Bits the engine does not track are ignored.
    pub const fn from_bits(flags: u64, flags2: u64) -> Self {
        Self {
            docked: flags & DOCKED != 0,
            landed: flags & LANDED != 0,
            gear_down: flags & GEAR_DOWN != 0,
            shields_up: flags & SHIELDS_UP != 0,
            supercruise: flags & SUPERCRUISE != 0,
            flight_assist_off: flags & FLIGHT_ASSIST_OFF != 0,
            hardpoints_deployed: flags & HARDPOINTS_DEPLOYED != 0,
            lights_on: flags & LIGHTS_ON != 0,
            cargo_scoop_open: flags & CARGO_SCOOP_OPEN != 0,
            silent_running: flags & SILENT_RUNNING != 0,
            scooping_fuel: flags & SCOOPING_FUEL != 0,
            fsd_masslocked: flags & FSD_MASSLOCKED != 0,
            fsd_charging: flags & FSD_CHARGING != 0,
            fsd_cooldown: flags & FSD_COOLDOWN != 0,
            low_fuel: flags & LOW_FUEL != 0,
            overheating: flags & OVERHEATING != 0,
            has_lat_long: flags & HAS_LAT_LONG != 0,
            in_danger: flags & IN_DANGER != 0,
            being_interdicted: flags & BEING_INTERDICTED != 0,
            in_main_ship: flags & IN_MAIN_SHIP != 0,
            in_fighter: flags & IN_FIGHTER != 0,
            in_srv: flags & IN_SRV != 0,
            night_vision: flags & NIGHT_VISION != 0,
            on_foot: flags2 & ON_FOOT != 0,
            in_taxi: flags2 & IN_TAXI != 0,
            glide_mode: flags2 & GLIDE_MODE != 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_bits_decode_to_default() {
        assert_eq!(StatusFlags::from_bits(0, 0), StatusFlags::default());
    }

    #[test]
    fn docked_with_gear_down() {
        // Docked ships always report landing gear down: bits 0 and 2.
        let flags = StatusFlags::from_bits(0b101, 0);
        assert!(flags.docked);
        assert!(flags.gear_down);
        assert!(!flags.landed);
        assert!(!flags.supercruise);
    }

    #[test]
    fn fsd_charging_in_supercruise() {
        let flags = StatusFlags::from_bits((1 << 17) | (1 << 4) | (1 << 3), 0);
        assert!(flags.fsd_charging);
        assert!(flags.supercruise);
        assert!(flags.shields_up);
        assert!(!flags.fsd_cooldown);
    }

    #[test]
    fn on_foot_comes_from_second_bitfield() {
        let flags = StatusFlags::from_bits(0, 1);
        assert!(flags.on_foot);
        assert!(!flags.in_main_ship);

        // Bit 0 of the first field is docked, not on-foot.
        let flags = StatusFlags::from_bits(1, 0);
        assert!(!flags.on_foot);
        assert!(flags.docked);
    }

    #[test]
    fn unknown_bits_are_ignored() {
        let flags = StatusFlags::from_bits(u64::MAX, u64::MAX);
        assert!(flags.docked);
        assert!(flags.night_vision);
        assert!(flags.on_foot);
    }
}
