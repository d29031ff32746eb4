//! The game state aggregate and its slices.
//!
//! [`GameState`] is the single reconstructed view of the running game. It
//! is created once with all-default slices, mutated exclusively by the
//! reducer in response to journal events and companion snapshot merges,
//! and discarded at shutdown -- state is rebuilt by replay on every run.
//!
//! Every slice documents its default values: those are what a reader of
//! `state()` observes before the first state-establishing event has been
//! folded (`initialized == false`).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::flags::StatusFlags;

// ---------------------------------------------------------------------------
// Commander
// ---------------------------------------------------------------------------

/// One value per rank track.
///
/// Used twice: once for the rank levels themselves and once for the
/// progress percentage toward the next level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankSet {
    /// Combat rank track.
    pub combat: u8,
    /// Trade rank track.
    pub trade: u8,
    /// Exploration rank track.
    pub explore: u8,
    /// Arena (CQC) rank track.
    pub cqc: u8,
    /// Federation navy rank track.
    pub federation: u8,
    /// Empire navy rank track.
    pub empire: u8,
    /// On-foot combat (soldier) rank track.
    pub soldier: u8,
    /// Exobiologist rank track.
    pub exobiologist: u8,
}

/// Reputation with the superpowers, in the game's -100..=100 scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReputationSet {
    /// Federation reputation.
    pub federation: f64,
    /// Empire reputation.
    pub empire: f64,
    /// Alliance reputation.
    pub alliance: f64,
    /// Independent reputation.
    pub independent: f64,
}

/// Commander identity, wealth, ranks, and reputation.
///
/// Defaults: empty strings, zero credits and loan, all ranks and
/// reputation at zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommanderState {
    /// Commander name.
    pub name: String,
    /// Frontier account identifier.
    pub frontier_id: String,
    /// Credit balance.
    pub credits: i64,
    /// Outstanding loan.
    pub loan: i64,
    /// Current rank levels.
    pub ranks: RankSet,
    /// Progress percentage (0-100) toward the next level of each rank.
    pub progress: RankSet,
    /// Superpower reputation.
    pub reputation: ReputationSet,
}

// ---------------------------------------------------------------------------
// Ship
// ---------------------------------------------------------------------------

/// A single outfitted module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipModule {
    /// The slot the module occupies.
    pub slot: String,
    /// The module item name.
    pub item: String,
    /// Whether the module is powered on.
    pub on: bool,
    /// Power priority group.
    pub priority: u8,
    /// Module health in the 0.0..=1.0 range.
    pub health: f64,
}

/// Current ship: identity, fuel, cargo, modules, and real-time flags.
///
/// Defaults: empty identity strings, zero ship id, full hull (1.0), zero
/// fuel and cargo, no modules, all status flags false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipState {
    /// Ship type (internal name, e.g. `anaconda`).
    pub ship_type: String,
    /// Player-assigned ship name.
    pub ship_name: String,
    /// Player-assigned ship identifier (registration).
    pub ship_ident: String,
    /// Numeric ship id within the commander's fleet.
    pub ship_id: u64,
    /// Hull health in the 0.0..=1.0 range.
    pub hull_health: f64,
    /// Fuel in the main tank, in tons.
    pub fuel_level: f64,
    /// Main tank capacity, in tons.
    pub fuel_capacity: f64,
    /// Fuel in the active reservoir, in tons.
    pub fuel_reservoir: f64,
    /// Total cargo capacity, in tons.
    pub cargo_capacity: u32,
    /// Cargo manifest: commodity name to count.
    pub cargo: BTreeMap<String, u32>,
    /// Outfitted modules.
    pub modules: Vec<ShipModule>,
    /// Insurance rebuy cost.
    pub rebuy: i64,
    /// Instantaneous status flags, authoritative from the status snapshot.
    pub flags: StatusFlags,
}

impl Default for ShipState {
    fn default() -> Self {
        Self {
            ship_type: String::new(),
            ship_name: String::new(),
            ship_ident: String::new(),
            ship_id: 0,
            hull_health: 1.0,
            fuel_level: 0.0,
            fuel_capacity: 0.0,
            fuel_reservoir: 0.0,
            cargo_capacity: 0,
            cargo: BTreeMap::new(),
            modules: Vec::new(),
            rebuy: 0,
            flags: StatusFlags::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// One hop of the plotted navigation route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteHop {
    /// Destination system of this hop.
    pub system: String,
    /// Spectral class of the destination's primary star.
    pub star_class: String,
}

/// Where the commander currently is.
///
/// Defaults: empty names, zero system address, origin star position, all
/// positional flags false, no surface coordinates, empty route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationState {
    /// Current star system name.
    pub system: String,
    /// 64-bit system address.
    pub system_address: u64,
    /// Galactic coordinates of the system, in light-years.
    pub star_pos: [f64; 3],
    /// Body currently near, on, or orbiting (empty in deep space).
    pub body: String,
    /// Type of that body (star, planet, station...).
    pub body_type: String,
    /// Station currently docked at or targeted (empty otherwise).
    pub station: String,
    /// Type of that station.
    pub station_type: String,
    /// Docked at a pad.
    pub docked: bool,
    /// Landed on a surface.
    pub landed: bool,
    /// In supercruise.
    pub supercruise: bool,
    /// On foot.
    pub on_foot: bool,
    /// Surface latitude, when near enough to a body for it to be valid.
    pub latitude: Option<f64>,
    /// Surface longitude, when valid.
    pub longitude: Option<f64>,
    /// Altitude above the surface in meters, when valid.
    pub altitude: Option<f64>,
    /// The currently plotted navigation route, origin first.
    pub nav_route: Vec<RouteHop>,
}

// ---------------------------------------------------------------------------
// Materials
// ---------------------------------------------------------------------------

/// Engineering material inventories.
///
/// Defaults: all three inventories empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialsState {
    /// Raw material counts keyed by material name.
    pub raw: BTreeMap<String, u32>,
    /// Manufactured material counts keyed by material name.
    pub manufactured: BTreeMap<String, u32>,
    /// Encoded data counts keyed by data name.
    pub encoded: BTreeMap<String, u32>,
}

// ---------------------------------------------------------------------------
// Missions
// ---------------------------------------------------------------------------

/// An active mission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    /// Unique mission identifier.
    pub mission_id: u64,
    /// Internal mission name.
    pub name: String,
    /// Issuing faction.
    pub faction: String,
    /// Destination system, when the mission has one.
    pub destination_system: String,
    /// Destination station, when the mission has one.
    pub destination_station: String,
    /// Credit reward on completion.
    pub reward: i64,
    /// Expiry time, when the mission has a deadline.
    pub expiry: Option<DateTime<Utc>>,
    /// Whether the mission is shared with a wing.
    pub wing: bool,
    /// Whether the mission carries passengers.
    pub passenger: bool,
}

/// The active mission list.
///
/// Defaults: empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionsState {
    /// Currently active missions in acceptance order.
    pub active: Vec<Mission>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Cumulative counters for the current process lifetime.
///
/// These only ever increase (or stay flat) while the engine runs; a
/// companion snapshot merge never touches them. Defaults: all zero, no
/// start timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Timestamp of the first state-establishing event.
    pub started_at: Option<DateTime<Utc>>,
    /// Hyperspace jumps completed.
    pub jumps: u64,
    /// Total jump distance, in light-years.
    pub total_distance: f64,
    /// Fuel consumed by jumps, in tons.
    pub fuel_used: f64,
    /// Credits earned from all income events.
    pub credits_earned: i64,
    /// Credits spent on all expense events.
    pub credits_spent: i64,
    /// Bodies scanned.
    pub bodies_scanned: u64,
    /// Systems where every body has been found.
    pub systems_fully_scanned: u64,
    /// Bounty vouchers claimed.
    pub bounties_claimed: u64,
    /// Total value of claimed bounty vouchers.
    pub bounty_value: i64,
    /// Missions completed.
    pub missions_completed: u64,
    /// Missions failed or abandoned.
    pub missions_failed: u64,
    /// Deaths.
    pub deaths: u64,
    /// Interdiction attempts escaped.
    pub interdictions_escaped: u64,
    /// Engineering materials collected.
    pub materials_collected: u64,
    /// Cargo canisters collected.
    pub cargo_collected: u64,
    /// Mining fragments refined into cargo.
    pub mining_refined: u64,
    /// Crimes committed.
    pub crimes_committed: u64,
    /// Fines incurred from crimes.
    pub fines_incurred: i64,
    /// Organic samples scanned on foot.
    pub organic_scans: u64,
}

// ---------------------------------------------------------------------------
// Carrier
// ---------------------------------------------------------------------------

/// A scheduled carrier hyperspace jump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCarrierJump {
    /// Destination system.
    pub system: String,
    /// Destination body, when targeting a specific body.
    pub body: String,
    /// Scheduled departure time.
    pub departure: Option<DateTime<Utc>>,
}

/// Fleet carrier state.
///
/// The aggregate holds `Option<CarrierState>`: `None` until a carrier
/// event establishes that the commander owns one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierState {
    /// Unique carrier identifier.
    pub carrier_id: u64,
    /// Carrier callsign (registration).
    pub callsign: String,
    /// Player-assigned carrier name.
    pub name: String,
    /// Tritium in the carrier tank, in tons.
    pub fuel_level: u32,
    /// Carrier bank balance.
    pub credits_balance: i64,
    /// System the carrier is currently in.
    pub current_system: String,
    /// Docking access policy (`all`, `none`, `friends`, `squadron`...).
    pub docking_access: String,
    /// Scheduled jump, when one is pending.
    pub pending_jump: Option<PendingCarrierJump>,
}

// ---------------------------------------------------------------------------
// Odyssey
// ---------------------------------------------------------------------------

/// The currently worn suit and loadout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuitState {
    /// Suit internal name.
    pub suit_name: String,
    /// Player-assigned loadout name.
    pub loadout_name: String,
    /// Suit identifier.
    pub suit_id: u64,
    /// Loadout identifier.
    pub loadout_id: u64,
}

/// Contents of an on-foot container (backpack or ship locker).
///
/// Each map is keyed by item name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockerContents {
    /// Mission and trade items.
    pub items: BTreeMap<String, u32>,
    /// Engineering components.
    pub components: BTreeMap<String, u32>,
    /// Consumables (medkits, energy cells...).
    pub consumables: BTreeMap<String, u32>,
    /// Data files.
    pub data: BTreeMap<String, u32>,
}

/// Exobiology progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExobiologyState {
    /// Organic samples taken.
    pub samples_taken: u64,
    /// Credits earned selling organic data.
    pub data_sold_value: i64,
}

/// On-foot state: suit, carried inventories, and exobiology.
///
/// Defaults: empty suit identity, empty containers, zero exobiology.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OdysseyState {
    /// Currently worn suit and loadout.
    pub suit: SuitState,
    /// Backpack contents while on foot.
    pub backpack: LockerContents,
    /// Ship locker contents.
    pub ship_locker: LockerContents,
    /// Exobiology progress.
    pub exobiology: ExobiologyState,
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// The reconstructed game state aggregate.
///
/// Constructed once at process start with all-default slices and mutated
/// exclusively by the reducer. Readers receive point-in-time clones, never
/// a live reference, so a snapshot is always either fully before or fully
/// after a given fold step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Commander identity, credits, ranks, and reputation.
    pub commander: CommanderState,
    /// Current ship.
    pub ship: ShipState,
    /// Current location.
    pub location: LocationState,
    /// Engineering materials.
    pub materials: MaterialsState,
    /// Active missions.
    pub missions: MissionsState,
    /// Cumulative session counters.
    pub session: SessionState,
    /// Fleet carrier, when the commander owns one.
    pub carrier: Option<CarrierState>,
    /// On-foot state.
    pub odyssey: OdysseyState,
    /// Becomes true once a state-establishing event has been folded.
    pub initialized: bool,
    /// Timestamp of the most recently folded event or snapshot merge.
    /// Non-decreasing over the lifetime of the aggregate.
    pub last_updated: Option<DateTime<Utc>>,
}

impl GameState {
    /// Advance `last_updated` to `at` unless it would move backwards.
    ///
    /// Folding replayed history must never rewind the aggregate clock,
    /// so the update is a monotonic maximum.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        match self.last_updated {
            Some(current) if current >= at => {}
            _ => self.last_updated = Some(at),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn default_state_is_uninitialized() {
        let state = GameState::default();
        assert!(!state.initialized);
        assert!(state.last_updated.is_none());
        assert!(state.carrier.is_none());
        assert_eq!(state.commander.credits, 0);
        assert_eq!(state.session.jumps, 0);
        assert!(state.missions.active.is_empty());
        assert!(state.location.system.is_empty());
    }

    #[test]
    fn default_ship_has_full_hull() {
        let ship = ShipState::default();
        assert!((ship.hull_health - 1.0).abs() < f64::EPSILON);
        assert!(ship.cargo.is_empty());
    }

    #[test]
    fn touch_is_monotonic() {
        let mut state = GameState::default();
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap();

        state.touch(late);
        assert_eq!(state.last_updated, Some(late));

        // An older timestamp never rewinds the clock.
        state.touch(early);
        assert_eq!(state.last_updated, Some(late));

        state.touch(late);
        assert_eq!(state.last_updated, Some(late));
    }

    #[test]
    fn state_serializes_deterministically() {
        // BTreeMap-backed inventories keep serialization order stable, so
        // two identically-folded states produce identical JSON.
        let mut a = GameState::default();
        let mut b = GameState::default();
        a.materials.raw.insert("iron".to_owned(), 3);
        a.materials.raw.insert("carbon".to_owned(), 5);
        b.materials.raw.insert("carbon".to_owned(), 5);
        b.materials.raw.insert("iron".to_owned(), 3);

        let ja = serde_json::to_string(&a).unwrap();
        let jb = serde_json::to_string(&b).unwrap();
        assert_eq!(ja, jb);
    }
}
