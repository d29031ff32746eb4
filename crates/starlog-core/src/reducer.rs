//! The pure state fold: journal events and snapshot merges into state.
//!
//! [`fold_event`] is the transition table. It looks up a rule by event
//! kind and mutates exactly the documented slices of [`GameState`] from
//! the event payload, returning the list of slices it touched. An event
//! kind without a rule changes nothing and returns an empty delta, which
//! is what keeps the engine forward compatible with event kinds a future
//! game version may emit.
//!
//! [`merge_snapshot`] is the narrower companion merge: snapshots are
//! authoritative for instantaneous real-time fields (status flags,
//! positional booleans, surface coordinates, the cargo manifest, the
//! plotted route, module and locker contents) and never touch the
//! session slice -- cumulative counters are owned by journal events
//! alone.
//!
//! Both functions are free of I/O and logging; the caller decides what
//! to do with the returned delta. Defaulting is uniform: a missing
//! numeric payload field reads as zero, a missing string as empty, a
//! missing boolean as false. No payload shape can make the fold panic.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use starlog_events::{EventKind, JournalEvent};
use starlog_journal::{CompanionKind, SnapshotUpdate};
use starlog_types::{
    GameState, LockerContents, Mission, RankSet, RouteHop, ShipModule, StateSlice, StatusFlags,
};

/// Fold one journal event into the state.
///
/// Returns the slices the event changed; an empty delta means the kind
/// has no transition rule (or the rule is intentionally stateless).
#[allow(clippy::too_many_lines)]
pub fn fold_event(state: &mut GameState, event: &JournalEvent) -> Vec<StateSlice> {
    match event.kind {
        // Recognized kinds with no state effect. They are still counted
        // and delivered to subscribers; they just fold to nothing.
        EventKind::Fileheader
        | EventKind::Statistics
        | EventKind::Shutdown
        | EventKind::Music
        | EventKind::ReceiveText
        | EventKind::HeatWarning
        | EventKind::FssDiscoveryScan
        | EventKind::EngineerProgress
        | EventKind::LaunchSrv
        | EventKind::DockSrv => Vec::new(),

        // --- Bootstrap and commander identity ---
        EventKind::Commander | EventKind::NewCommander => {
            state.commander.name = event.str_or_empty("Name");
            state.commander.frontier_id = event.str_or_empty("FID");
            state.initialized = true;
            vec![StateSlice::Commander]
        }
        EventKind::LoadGame => apply_load_game(state, event),
        EventKind::Loadout => apply_loadout(state, event),
        EventKind::Rank => {
            apply_ranks(&mut state.commander.ranks, &event.payload);
            vec![StateSlice::Commander]
        }
        EventKind::Progress => {
            apply_ranks(&mut state.commander.progress, &event.payload);
            vec![StateSlice::Commander]
        }
        EventKind::Promotion => {
            apply_ranks(&mut state.commander.ranks, &event.payload);
            vec![StateSlice::Commander]
        }
        EventKind::Reputation => {
            state.commander.reputation.federation = event.f64_or_zero("Federation");
            state.commander.reputation.empire = event.f64_or_zero("Empire");
            state.commander.reputation.alliance = event.f64_or_zero("Alliance");
            state.commander.reputation.independent = event.f64_or_zero("Independent");
            vec![StateSlice::Commander]
        }

        // --- Travel ---
        EventKind::Location => {
            state.location.system = event.str_or_empty("StarSystem");
            state.location.system_address = event.u64_or_zero("SystemAddress");
            state.location.star_pos = star_pos_of(&event.payload);
            state.location.body = event.str_or_empty("Body");
            state.location.body_type = event.str_or_empty("BodyType");
            state.location.station = event.str_or_empty("StationName");
            state.location.station_type = event.str_or_empty("StationType");
            state.location.docked = event.bool_or_false("Docked");
            state.initialized = true;
            vec![StateSlice::Location]
        }
        EventKind::FsdJump => apply_fsd_jump(state, event),
        EventKind::SupercruiseEntry => {
            state.location.supercruise = true;
            state.location.docked = false;
            state.location.landed = false;
            state.location.station = String::new();
            state.location.station_type = String::new();
            vec![StateSlice::Location]
        }
        EventKind::SupercruiseExit => {
            state.location.supercruise = false;
            state.location.body = event.str_or_empty("Body");
            state.location.body_type = event.str_or_empty("BodyType");
            vec![StateSlice::Location]
        }
        EventKind::Docked => {
            state.location.docked = true;
            state.location.system = event.str_or_empty("StarSystem");
            state.location.station = event.str_or_empty("StationName");
            state.location.station_type = event.str_or_empty("StationType");
            vec![StateSlice::Location]
        }
        EventKind::Undocked => {
            state.location.docked = false;
            state.location.station = String::new();
            state.location.station_type = String::new();
            vec![StateSlice::Location]
        }
        EventKind::Touchdown => {
            state.location.landed = true;
            state.location.body = event.str_or_empty("Body");
            state.location.latitude = event.f64_field("Latitude");
            state.location.longitude = event.f64_field("Longitude");
            vec![StateSlice::Location]
        }
        EventKind::Liftoff => {
            state.location.landed = false;
            state.location.latitude = None;
            state.location.longitude = None;
            state.location.altitude = None;
            vec![StateSlice::Location]
        }
        EventKind::ApproachBody => {
            state.location.body = event.str_or_empty("Body");
            state.location.body_type = "Planet".to_owned();
            vec![StateSlice::Location]
        }
        EventKind::LeaveBody => {
            state.location.body = String::new();
            state.location.body_type = String::new();
            vec![StateSlice::Location]
        }
        EventKind::ApproachSettlement => {
            state.location.station = event.str_or_empty("Name");
            state.location.station_type = "Settlement".to_owned();
            state.location.body = event.str_or_empty("BodyName");
            vec![StateSlice::Location]
        }
        EventKind::NavRoute => {
            // Newer game versions inline the route; older ones only
            // announce it and the companion file carries the hops.
            if event.array_field("Route").is_some() {
                state.location.nav_route = route_from(&event.payload);
                vec![StateSlice::Location]
            } else {
                Vec::new()
            }
        }
        EventKind::NavRouteClear => {
            state.location.nav_route.clear();
            vec![StateSlice::Location]
        }

        // --- Fuel ---
        EventKind::FuelScoop => {
            state.ship.fuel_level = event.f64_or_zero("Total");
            vec![StateSlice::Ship]
        }
        EventKind::RefuelAll => {
            spend(state, event.i64_or_zero("Cost"));
            state.ship.fuel_level = state.ship.fuel_capacity;
            vec![StateSlice::Ship, StateSlice::Session]
        }
        EventKind::RefuelPartial => {
            spend(state, event.i64_or_zero("Cost"));
            let refueled = state.ship.fuel_level + event.f64_or_zero("Amount");
            state.ship.fuel_level = if state.ship.fuel_capacity > 0.0 {
                refueled.min(state.ship.fuel_capacity)
            } else {
                refueled
            };
            vec![StateSlice::Ship, StateSlice::Session]
        }

        // --- Combat and crime ---
        EventKind::Bounty => {
            state.session.bounties_claimed = state.session.bounties_claimed.saturating_add(1);
            state.session.bounty_value = state
                .session
                .bounty_value
                .saturating_add(event.i64_or_zero("TotalReward"));
            vec![StateSlice::Session]
        }
        EventKind::Died => {
            state.session.deaths = state.session.deaths.saturating_add(1);
            vec![StateSlice::Session]
        }
        EventKind::Resurrect => {
            spend(state, event.i64_or_zero("Cost"));
            state.ship.hull_health = 1.0;
            vec![StateSlice::Ship, StateSlice::Session]
        }
        EventKind::HullDamage => {
            state.ship.hull_health = event.f64_or_zero("Health");
            vec![StateSlice::Ship]
        }
        EventKind::ShieldState => {
            state.ship.flags.shields_up = event.bool_or_false("ShieldsUp");
            vec![StateSlice::Ship]
        }
        EventKind::Interdicted => {
            state.location.supercruise = false;
            vec![StateSlice::Location]
        }
        EventKind::EscapeInterdiction => {
            state.session.interdictions_escaped =
                state.session.interdictions_escaped.saturating_add(1);
            vec![StateSlice::Session]
        }
        EventKind::CommitCrime => {
            state.session.crimes_committed = state.session.crimes_committed.saturating_add(1);
            let penalty = event
                .i64_field("Fine")
                .or_else(|| event.i64_field("Bounty"))
                .unwrap_or(0);
            state.session.fines_incurred = state.session.fines_incurred.saturating_add(penalty);
            vec![StateSlice::Session]
        }

        // --- Exploration ---
        EventKind::Scan => {
            state.session.bodies_scanned = state.session.bodies_scanned.saturating_add(1);
            vec![StateSlice::Session]
        }
        EventKind::FssAllBodiesFound => {
            state.session.systems_fully_scanned =
                state.session.systems_fully_scanned.saturating_add(1);
            vec![StateSlice::Session]
        }
        EventKind::SellExplorationData => {
            let earnings = event.i64_field("TotalEarnings").unwrap_or_else(|| {
                event
                    .i64_or_zero("BaseValue")
                    .saturating_add(event.i64_or_zero("Bonus"))
            });
            earn(state, earnings);
            vec![StateSlice::Session]
        }
        EventKind::MultiSellExplorationData => {
            earn(state, event.i64_or_zero("TotalEarnings"));
            vec![StateSlice::Session]
        }

        // --- Trade and cargo ---
        EventKind::MarketBuy => {
            spend(state, event.i64_or_zero("TotalCost"));
            add_count(
                &mut state.ship.cargo,
                &event.str_or_empty("Type"),
                count_of(event.u64_or_zero("Count")),
            );
            vec![StateSlice::Ship, StateSlice::Session]
        }
        EventKind::MarketSell => {
            earn(state, event.i64_or_zero("TotalSale"));
            remove_count(
                &mut state.ship.cargo,
                &event.str_or_empty("Type"),
                count_of(event.u64_or_zero("Count")),
            );
            vec![StateSlice::Ship, StateSlice::Session]
        }
        EventKind::CollectCargo => {
            add_count(&mut state.ship.cargo, &event.str_or_empty("Type"), 1);
            state.session.cargo_collected = state.session.cargo_collected.saturating_add(1);
            vec![StateSlice::Ship, StateSlice::Session]
        }
        EventKind::EjectCargo => {
            remove_count(
                &mut state.ship.cargo,
                &event.str_or_empty("Type"),
                count_of(event.u64_or_zero("Count")),
            );
            vec![StateSlice::Ship]
        }
        EventKind::Cargo => {
            // The SRV has its own small hold; only the ship manifest is
            // folded into ship state.
            if event.str_field("Vessel").is_none_or(|vessel| vessel != "SRV") {
                state.ship.cargo = counts_from(&event.payload, "Inventory", "Name");
                vec![StateSlice::Ship]
            } else {
                Vec::new()
            }
        }
        EventKind::MiningRefined => {
            add_count(&mut state.ship.cargo, &event.str_or_empty("Type"), 1);
            state.session.mining_refined = state.session.mining_refined.saturating_add(1);
            vec![StateSlice::Ship, StateSlice::Session]
        }
        EventKind::BuyDrones => {
            spend(state, event.i64_or_zero("TotalCost"));
            add_count(
                &mut state.ship.cargo,
                "drones",
                count_of(event.u64_or_zero("Count")),
            );
            vec![StateSlice::Ship, StateSlice::Session]
        }
        EventKind::SellDrones => {
            earn(state, event.i64_or_zero("TotalSale"));
            remove_count(
                &mut state.ship.cargo,
                "drones",
                count_of(event.u64_or_zero("Count")),
            );
            vec![StateSlice::Ship, StateSlice::Session]
        }

        // --- Shipyard and outfitting ---
        EventKind::ShipyardBuy => {
            spend(state, event.i64_or_zero("ShipPrice"));
            vec![StateSlice::Session]
        }
        EventKind::ShipyardSell => {
            earn(state, event.i64_or_zero("ShipPrice"));
            vec![StateSlice::Session]
        }
        EventKind::ShipyardSwap => {
            state.ship.ship_type = norm(&event.str_or_empty("ShipType"));
            state.ship.ship_id = event.u64_or_zero("ShipID");
            state.ship.ship_name = String::new();
            state.ship.ship_ident = String::new();
            state.ship.modules.clear();
            state.ship.cargo.clear();
            vec![StateSlice::Ship]
        }
        EventKind::ShipyardTransfer => {
            spend(state, event.i64_or_zero("TransferPrice"));
            vec![StateSlice::Session]
        }
        EventKind::ModuleBuy => {
            spend(state, event.i64_or_zero("BuyPrice"));
            upsert_module(
                &mut state.ship.modules,
                &event.str_or_empty("Slot"),
                &event.str_or_empty("BuyItem"),
            );
            vec![StateSlice::Ship, StateSlice::Session]
        }
        EventKind::ModuleSell => {
            earn(state, event.i64_or_zero("SellPrice"));
            let slot = event.str_or_empty("Slot");
            state.ship.modules.retain(|module| module.slot != slot);
            vec![StateSlice::Ship, StateSlice::Session]
        }
        EventKind::ModuleStore => {
            let slot = event.str_or_empty("Slot");
            state.ship.modules.retain(|module| module.slot != slot);
            vec![StateSlice::Ship]
        }
        EventKind::ModuleRetrieve => {
            upsert_module(
                &mut state.ship.modules,
                &event.str_or_empty("Slot"),
                &event.str_or_empty("RetrievedItem"),
            );
            vec![StateSlice::Ship]
        }
        EventKind::ModuleSwap => {
            let from = event.str_or_empty("FromSlot");
            let to = event.str_or_empty("ToSlot");
            for module in &mut state.ship.modules {
                if module.slot == from {
                    module.slot = to.clone();
                } else if module.slot == to {
                    module.slot = from.clone();
                }
            }
            vec![StateSlice::Ship]
        }
        EventKind::SetUserShipName => {
            state.ship.ship_name = event.str_or_empty("UserShipName");
            state.ship.ship_ident = event.str_or_empty("UserShipId");
            vec![StateSlice::Ship]
        }
        EventKind::Repair => {
            spend(state, event.i64_or_zero("Cost"));
            vec![StateSlice::Session]
        }
        EventKind::RepairAll => {
            spend(state, event.i64_or_zero("Cost"));
            state.ship.hull_health = 1.0;
            vec![StateSlice::Ship, StateSlice::Session]
        }
        EventKind::BuyAmmo | EventKind::RestockVehicle => {
            spend(state, event.i64_or_zero("Cost"));
            vec![StateSlice::Session]
        }
        EventKind::AfmuRepairs => {
            let item = norm(&event.str_or_empty("Module"));
            let health = event.f64_or_zero("Health");
            for module in &mut state.ship.modules {
                if norm(&module.item) == item {
                    module.health = health;
                }
            }
            vec![StateSlice::Ship]
        }

        // --- Materials and engineering ---
        EventKind::Materials => {
            state.materials.raw = counts_from(&event.payload, "Raw", "Name");
            state.materials.manufactured = counts_from(&event.payload, "Manufactured", "Name");
            state.materials.encoded = counts_from(&event.payload, "Encoded", "Name");
            vec![StateSlice::Materials]
        }
        EventKind::MaterialCollected => {
            let count = count_of(event.u64_or_zero("Count"));
            let name = event.str_or_empty("Name");
            add_count(
                material_bucket(state, &event.str_or_empty("Category")),
                &name,
                count,
            );
            state.session.materials_collected = state
                .session
                .materials_collected
                .saturating_add(u64::from(count));
            vec![StateSlice::Materials, StateSlice::Session]
        }
        EventKind::MaterialDiscarded => {
            let count = count_of(event.u64_or_zero("Count"));
            let name = event.str_or_empty("Name");
            remove_count(
                material_bucket(state, &event.str_or_empty("Category")),
                &name,
                count,
            );
            vec![StateSlice::Materials]
        }
        EventKind::MaterialTrade => {
            if let Some(paid) = event.object_field("Paid") {
                let name = str_of(paid, "Material");
                let count = count_of(u64_of(paid, "Quantity"));
                let category = str_of(paid, "Category");
                remove_count(material_bucket(state, &category), &name, count);
            }
            if let Some(received) = event.object_field("Received") {
                let name = str_of(received, "Material");
                let count = count_of(u64_of(received, "Quantity"));
                let category = str_of(received, "Category");
                add_count(material_bucket(state, &category), &name, count);
            }
            vec![StateSlice::Materials]
        }
        EventKind::Synthesis => {
            consume_materials(state, event.array_field("Materials"));
            vec![StateSlice::Materials]
        }
        EventKind::EngineerCraft => {
            consume_materials(state, event.array_field("Ingredients"));
            vec![StateSlice::Materials]
        }

        // --- Missions ---
        EventKind::Missions => {
            state.missions.active = active_missions_from(event.array_field("Active"));
            vec![StateSlice::Missions]
        }
        EventKind::MissionAccepted => {
            state.missions.active.push(Mission {
                mission_id: event.u64_or_zero("MissionID"),
                name: event.str_or_empty("Name"),
                faction: event.str_or_empty("Faction"),
                destination_system: event.str_or_empty("DestinationSystem"),
                destination_station: event.str_or_empty("DestinationStation"),
                reward: event.i64_or_zero("Reward"),
                expiry: event.datetime_field("Expiry"),
                wing: event.bool_or_false("Wing"),
                passenger: event.u64_or_zero("PassengerCount") > 0,
            });
            vec![StateSlice::Missions]
        }
        EventKind::MissionCompleted => {
            remove_mission(state, event.u64_or_zero("MissionID"));
            state.session.missions_completed = state.session.missions_completed.saturating_add(1);
            earn(state, event.i64_or_zero("Reward"));
            vec![StateSlice::Missions, StateSlice::Session]
        }
        EventKind::MissionFailed | EventKind::MissionAbandoned => {
            remove_mission(state, event.u64_or_zero("MissionID"));
            state.session.missions_failed = state.session.missions_failed.saturating_add(1);
            vec![StateSlice::Missions, StateSlice::Session]
        }
        EventKind::MissionRedirected => {
            let id = event.u64_or_zero("MissionID");
            for mission in &mut state.missions.active {
                if mission.mission_id == id {
                    mission.destination_system = event.str_or_empty("NewDestinationSystem");
                    mission.destination_station = event.str_or_empty("NewDestinationStation");
                }
            }
            vec![StateSlice::Missions]
        }

        // --- Money ---
        EventKind::RedeemVoucher => {
            earn(state, event.i64_or_zero("Amount"));
            vec![StateSlice::Session]
        }
        EventKind::PayFines | EventKind::PayBounties => {
            spend(state, event.i64_or_zero("Amount"));
            vec![StateSlice::Session]
        }

        // --- Fleet carrier ---
        EventKind::CarrierBuy => {
            spend(state, event.i64_or_zero("Price"));
            let carrier = state.carrier.get_or_insert_with(Default::default);
            carrier.carrier_id = event.u64_or_zero("CarrierID");
            carrier.callsign = event.str_or_empty("Callsign");
            carrier.current_system = event.str_or_empty("Location");
            vec![StateSlice::Carrier, StateSlice::Session]
        }
        EventKind::CarrierStats => {
            let finance_balance = event
                .object_field("Finance")
                .map_or(0, |finance| i64_of(finance, "CarrierBalance"));
            let fuel = event.u64_or_zero("FuelLevel");
            let carrier = state.carrier.get_or_insert_with(Default::default);
            carrier.carrier_id = event.u64_or_zero("CarrierID");
            carrier.callsign = event.str_or_empty("Callsign");
            carrier.name = event.str_or_empty("Name");
            carrier.fuel_level = count_of(fuel);
            carrier.credits_balance = finance_balance;
            carrier.docking_access = event.str_or_empty("DockingAccess");
            vec![StateSlice::Carrier]
        }
        EventKind::CarrierJumpRequest => {
            let pending = starlog_types::PendingCarrierJump {
                system: event.str_or_empty("SystemName"),
                body: event.str_or_empty("Body"),
                departure: event.datetime_field("DepartureTime"),
            };
            let carrier = state.carrier.get_or_insert_with(Default::default);
            carrier.pending_jump = Some(pending);
            vec![StateSlice::Carrier]
        }
        EventKind::CarrierJumpCancelled => {
            if let Some(carrier) = state.carrier.as_mut() {
                carrier.pending_jump = None;
            }
            vec![StateSlice::Carrier]
        }
        EventKind::CarrierJump => {
            let system = event.str_or_empty("StarSystem");
            let carrier = state.carrier.get_or_insert_with(Default::default);
            carrier.current_system = system;
            carrier.pending_jump = None;
            vec![StateSlice::Carrier]
        }
        EventKind::CarrierDepositFuel => {
            let total = count_of(event.u64_or_zero("Total"));
            let carrier = state.carrier.get_or_insert_with(Default::default);
            carrier.fuel_level = total;
            vec![StateSlice::Carrier]
        }
        EventKind::CarrierFinance => {
            let balance = event.i64_or_zero("CarrierBalance");
            let carrier = state.carrier.get_or_insert_with(Default::default);
            carrier.credits_balance = balance;
            vec![StateSlice::Carrier]
        }
        EventKind::CarrierDockingPermission => {
            let access = event.str_or_empty("DockingAccess");
            let carrier = state.carrier.get_or_insert_with(Default::default);
            carrier.docking_access = access;
            vec![StateSlice::Carrier]
        }
        EventKind::CarrierNameChange => {
            let name = event.str_or_empty("Name");
            let carrier = state.carrier.get_or_insert_with(Default::default);
            carrier.name = name;
            vec![StateSlice::Carrier]
        }
        EventKind::CarrierDecommission => {
            state.carrier = None;
            vec![StateSlice::Carrier]
        }

        // --- On-foot ---
        EventKind::SuitLoadout
        | EventKind::SwitchSuitLoadout
        | EventKind::CreateSuitLoadout => {
            state.odyssey.suit.suit_name = event.str_or_empty("SuitName");
            state.odyssey.suit.loadout_name = event.str_or_empty("LoadoutName");
            state.odyssey.suit.suit_id = event.u64_or_zero("SuitID");
            state.odyssey.suit.loadout_id = event.u64_or_zero("LoadoutID");
            vec![StateSlice::Odyssey]
        }
        EventKind::BuySuit => {
            spend(state, event.i64_or_zero("Price"));
            vec![StateSlice::Session]
        }
        EventKind::SellSuit => {
            earn(state, event.i64_or_zero("Price"));
            vec![StateSlice::Session]
        }
        EventKind::Embark => {
            state.location.on_foot = false;
            vec![StateSlice::Location]
        }
        EventKind::Disembark => {
            state.location.on_foot = true;
            vec![StateSlice::Location]
        }
        EventKind::Backpack => {
            state.odyssey.backpack = locker_from(&event.payload);
            vec![StateSlice::Odyssey]
        }
        EventKind::BackpackChange => {
            apply_backpack_change(state, event.array_field("Added"), true);
            apply_backpack_change(state, event.array_field("Removed"), false);
            vec![StateSlice::Odyssey]
        }
        EventKind::CollectItems => {
            let bucket = locker_bucket(&mut state.odyssey.backpack, &event.str_or_empty("Type"));
            add_count(
                bucket,
                &event.str_or_empty("Name"),
                count_of(event.u64_or_zero("Count")),
            );
            vec![StateSlice::Odyssey]
        }
        EventKind::DropItems => {
            let bucket = locker_bucket(&mut state.odyssey.backpack, &event.str_or_empty("Type"));
            remove_count(
                bucket,
                &event.str_or_empty("Name"),
                count_of(event.u64_or_zero("Count")),
            );
            vec![StateSlice::Odyssey]
        }
        EventKind::UseConsumable => {
            remove_count(
                &mut state.odyssey.backpack.consumables,
                &event.str_or_empty("Name"),
                1,
            );
            vec![StateSlice::Odyssey]
        }
        EventKind::ScanOrganic => {
            state.session.organic_scans = state.session.organic_scans.saturating_add(1);
            state.odyssey.exobiology.samples_taken =
                state.odyssey.exobiology.samples_taken.saturating_add(1);
            vec![StateSlice::Session, StateSlice::Odyssey]
        }
        EventKind::SellOrganicData => {
            let total = event.array_field("BioData").map_or(0, |entries| {
                entries.iter().fold(0_i64, |acc, entry| {
                    let value = entry.get("Value").and_then(Value::as_i64).unwrap_or(0);
                    let bonus = entry.get("Bonus").and_then(Value::as_i64).unwrap_or(0);
                    acc.saturating_add(value).saturating_add(bonus)
                })
            });
            earn(state, total);
            state.odyssey.exobiology.data_sold_value =
                state.odyssey.exobiology.data_sold_value.saturating_add(total);
            vec![StateSlice::Session, StateSlice::Odyssey]
        }
        EventKind::ShipLocker => {
            state.odyssey.ship_locker = locker_from(&event.payload);
            vec![StateSlice::Odyssey]
        }

        // Forward compatibility: no rule, no change.
        EventKind::Unknown => Vec::new(),
    }
}

/// Merge one companion snapshot into the state.
///
/// The merge overwrites only the real-time fields the snapshot is
/// authoritative for and never rolls back the session slice.
pub fn merge_snapshot(state: &mut GameState, update: &SnapshotUpdate) -> Vec<StateSlice> {
    let Some(payload) = update.payload.as_object() else {
        return Vec::new();
    };

    match update.kind {
        CompanionKind::Status => merge_status(state, payload),
        CompanionKind::Cargo => {
            if str_of(payload, "Vessel") == "SRV" {
                return Vec::new();
            }
            state.ship.cargo = counts_from(payload, "Inventory", "Name");
            vec![StateSlice::Ship]
        }
        CompanionKind::NavRoute => {
            state.location.nav_route = route_from(payload);
            vec![StateSlice::Location]
        }
        CompanionKind::Modules => {
            state.ship.modules = payload
                .get("Modules")
                .and_then(Value::as_array)
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(Value::as_object)
                        .map(|module| ShipModule {
                            slot: str_of(module, "Slot"),
                            item: str_of(module, "Item"),
                            on: true,
                            priority: u8::try_from(u64_of(module, "Priority")).unwrap_or(u8::MAX),
                            health: 1.0,
                        })
                        .collect()
                })
                .unwrap_or_default();
            vec![StateSlice::Ship]
        }
        CompanionKind::Backpack => {
            state.odyssey.backpack = locker_from(payload);
            vec![StateSlice::Odyssey]
        }
        CompanionKind::ShipLocker => {
            state.odyssey.ship_locker = locker_from(payload);
            vec![StateSlice::Odyssey]
        }
    }
}

/// Merge the status snapshot: flags into both the ship and location
/// slices, surface coordinates, and live fuel readings.
fn merge_status(state: &mut GameState, payload: &Map<String, Value>) -> Vec<StateSlice> {
    // The game writes a minimal status document (timestamp only) while
    // no session is live; without flags there is nothing authoritative
    // to merge.
    let Some(flags_bits) = payload.get("Flags").and_then(Value::as_u64) else {
        return Vec::new();
    };
    let flags2_bits = payload.get("Flags2").and_then(Value::as_u64).unwrap_or(0);
    let flags = StatusFlags::from_bits(flags_bits, flags2_bits);

    state.ship.flags = flags;
    state.location.docked = flags.docked;
    state.location.landed = flags.landed;
    state.location.supercruise = flags.supercruise;
    state.location.on_foot = flags.on_foot;

    if flags.has_lat_long {
        state.location.latitude = payload.get("Latitude").and_then(Value::as_f64);
        state.location.longitude = payload.get("Longitude").and_then(Value::as_f64);
        state.location.altitude = payload.get("Altitude").and_then(Value::as_f64);
    } else {
        state.location.latitude = None;
        state.location.longitude = None;
        state.location.altitude = None;
    }

    if let Some(fuel) = payload.get("Fuel").and_then(Value::as_object) {
        state.ship.fuel_level = f64_of(fuel, "FuelMain");
        state.ship.fuel_reservoir = f64_of(fuel, "FuelReservoir");
    }

    vec![StateSlice::Ship, StateSlice::Location]
}

// ---------------------------------------------------------------------------
// Transition rules too large for a match arm
// ---------------------------------------------------------------------------

fn apply_load_game(state: &mut GameState, event: &JournalEvent) -> Vec<StateSlice> {
    state.commander.name = event.str_or_empty("Commander");
    state.commander.frontier_id = event.str_or_empty("FID");
    state.commander.credits = event.i64_or_zero("Credits");
    state.commander.loan = event.i64_or_zero("Loan");

    state.ship.ship_type = norm(&event.str_or_empty("Ship"));
    state.ship.ship_id = event.u64_or_zero("ShipID");
    state.ship.ship_name = event.str_or_empty("ShipName");
    state.ship.ship_ident = event.str_or_empty("ShipIdent");
    state.ship.fuel_level = event.f64_or_zero("FuelLevel");
    state.ship.fuel_capacity = event.f64_or_zero("FuelCapacity");

    if state.session.started_at.is_none() {
        state.session.started_at = Some(event.timestamp);
    }
    state.initialized = true;

    vec![StateSlice::Commander, StateSlice::Ship, StateSlice::Session]
}

fn apply_loadout(state: &mut GameState, event: &JournalEvent) -> Vec<StateSlice> {
    state.ship.ship_type = norm(&event.str_or_empty("Ship"));
    state.ship.ship_id = event.u64_or_zero("ShipID");
    state.ship.ship_name = event.str_or_empty("ShipName");
    state.ship.ship_ident = event.str_or_empty("ShipIdent");
    state.ship.hull_health = event.f64_field("HullHealth").unwrap_or(1.0);
    state.ship.rebuy = event.i64_or_zero("Rebuy");
    state.ship.cargo_capacity = count_of(event.u64_or_zero("CargoCapacity"));

    if let Some(capacity) = event.object_field("FuelCapacity") {
        state.ship.fuel_capacity = f64_of(capacity, "Main");
    }

    state.ship.modules = event
        .array_field("Modules")
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_object)
                .map(|module| ShipModule {
                    slot: str_of(module, "Slot"),
                    item: str_of(module, "Item"),
                    on: module.get("On").and_then(Value::as_bool).unwrap_or(true),
                    priority: u8::try_from(u64_of(module, "Priority")).unwrap_or(u8::MAX),
                    health: module.get("Health").and_then(Value::as_f64).unwrap_or(1.0),
                })
                .collect()
        })
        .unwrap_or_default();

    vec![StateSlice::Ship]
}

fn apply_fsd_jump(state: &mut GameState, event: &JournalEvent) -> Vec<StateSlice> {
    state.location.system = event.str_or_empty("StarSystem");
    state.location.system_address = event.u64_or_zero("SystemAddress");
    state.location.star_pos = star_pos_of(&event.payload);
    state.location.body = String::new();
    state.location.body_type = String::new();
    state.location.station = String::new();
    state.location.station_type = String::new();
    state.location.docked = false;
    state.location.landed = false;
    // A completed hyperspace jump drops the ship into supercruise at the
    // destination star.
    state.location.supercruise = true;

    state.session.jumps = state.session.jumps.saturating_add(1);
    state.session.total_distance += event.f64_or_zero("JumpDist");
    state.session.fuel_used += event.f64_or_zero("FuelUsed");

    if let Some(level) = event.f64_field("FuelLevel") {
        state.ship.fuel_level = level;
    }

    vec![StateSlice::Location, StateSlice::Session, StateSlice::Ship]
}

/// Apply whichever rank fields the payload carries (a `Rank` dump has
/// all of them, a `Promotion` only the track that changed).
fn apply_ranks(ranks: &mut RankSet, payload: &Map<String, Value>) {
    let mut set = |key: &str, slot: &mut u8| {
        if let Some(value) = payload.get(key).and_then(Value::as_u64) {
            *slot = u8::try_from(value).unwrap_or(u8::MAX);
        }
    };
    set("Combat", &mut ranks.combat);
    set("Trade", &mut ranks.trade);
    set("Explore", &mut ranks.explore);
    set("CQC", &mut ranks.cqc);
    set("Federation", &mut ranks.federation);
    set("Empire", &mut ranks.empire);
    set("Soldier", &mut ranks.soldier);
    set("Exobiologist", &mut ranks.exobiologist);
}

fn apply_backpack_change(state: &mut GameState, entries: Option<&Vec<Value>>, added: bool) {
    let Some(entries) = entries else {
        return;
    };
    for entry in entries.iter().filter_map(Value::as_object) {
        let name = str_of(entry, "Name");
        let count = count_of(u64_of(entry, "Count"));
        let kind = str_of(entry, "Type");
        let bucket = locker_bucket(&mut state.odyssey.backpack, &kind);
        if added {
            add_count(bucket, &name, count);
        } else {
            remove_count(bucket, &name, count);
        }
    }
}

/// Deduct synthesis or crafting ingredients from whichever material
/// inventory holds them (the payload does not say which category).
fn consume_materials(state: &mut GameState, entries: Option<&Vec<Value>>) {
    let Some(entries) = entries else {
        return;
    };
    for entry in entries.iter().filter_map(Value::as_object) {
        let name = norm(&str_of(entry, "Name"));
        let count = count_of(u64_of(entry, "Count"));
        if state.materials.raw.contains_key(&name) {
            remove_count(&mut state.materials.raw, &name, count);
        } else if state.materials.manufactured.contains_key(&name) {
            remove_count(&mut state.materials.manufactured, &name, count);
        } else {
            remove_count(&mut state.materials.encoded, &name, count);
        }
    }
}

fn active_missions_from(entries: Option<&Vec<Value>>) -> Vec<Mission> {
    entries
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_object)
                .map(|mission| Mission {
                    mission_id: u64_of(mission, "MissionID"),
                    name: str_of(mission, "Name"),
                    // The login dump only carries id, name, and seconds
                    // until expiry; the rest arrives with the individual
                    // MissionAccepted events of the session.
                    ..Mission::default()
                })
                .collect()
        })
        .unwrap_or_default()
}

fn remove_mission(state: &mut GameState, id: u64) {
    state
        .missions
        .active
        .retain(|mission| mission.mission_id != id);
}

fn material_bucket<'a>(state: &'a mut GameState, category: &str) -> &'a mut BTreeMap<String, u32> {
    match norm(category).as_str() {
        "manufactured" => &mut state.materials.manufactured,
        "encoded" => &mut state.materials.encoded,
        _ => &mut state.materials.raw,
    }
}

fn locker_bucket<'a>(
    contents: &'a mut LockerContents,
    type_name: &str,
) -> &'a mut BTreeMap<String, u32> {
    match norm(type_name).as_str() {
        "component" => &mut contents.components,
        "consumable" => &mut contents.consumables,
        "data" => &mut contents.data,
        _ => &mut contents.items,
    }
}

fn upsert_module(modules: &mut Vec<ShipModule>, slot: &str, item: &str) {
    for module in modules.iter_mut() {
        if module.slot == slot {
            module.item = item.to_owned();
            module.on = true;
            module.health = 1.0;
            return;
        }
    }
    modules.push(ShipModule {
        slot: slot.to_owned(),
        item: item.to_owned(),
        on: true,
        priority: 0,
        health: 1.0,
    });
}

// ---------------------------------------------------------------------------
// Session money helpers
// ---------------------------------------------------------------------------

/// Record credits earned. Only session accounting: the commander's
/// balance is authoritative from `LoadGame` dumps, not reconstructed
/// from individual transactions.
fn earn(state: &mut GameState, amount: i64) {
    state.session.credits_earned = state.session.credits_earned.saturating_add(amount);
}

/// Record credits spent.
fn spend(state: &mut GameState, amount: i64) {
    state.session.credits_spent = state.session.credits_spent.saturating_add(amount);
}

// ---------------------------------------------------------------------------
// Payload helpers shared between fold and merge
// ---------------------------------------------------------------------------

/// Lowercase a payload name so event-sourced and snapshot-sourced
/// inventories agree on keys (the game is inconsistent about casing).
fn norm(name: &str) -> String {
    name.to_ascii_lowercase()
}

fn str_of(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

fn u64_of(obj: &Map<String, Value>, key: &str) -> u64 {
    obj.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn i64_of(obj: &Map<String, Value>, key: &str) -> i64 {
    obj.get(key).and_then(Value::as_i64).unwrap_or(0)
}

fn f64_of(obj: &Map<String, Value>, key: &str) -> f64 {
    obj.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

/// Narrow a payload count to the u32 inventory domain.
fn count_of(raw: u64) -> u32 {
    u32::try_from(raw).unwrap_or(u32::MAX)
}

fn star_pos_of(obj: &Map<String, Value>) -> [f64; 3] {
    let mut pos = [0.0; 3];
    if let Some(values) = obj.get("StarPos").and_then(Value::as_array) {
        for (slot, value) in pos.iter_mut().zip(values.iter()) {
            *slot = value.as_f64().unwrap_or(0.0);
        }
    }
    pos
}

/// Build a name-to-count map from an array of `{<name_key>, Count}`
/// objects. Names are lowercased; missing counts read as zero entries
/// and are dropped.
fn counts_from(
    obj: &Map<String, Value>,
    key: &str,
    name_key: &str,
) -> BTreeMap<String, u32> {
    let mut map = BTreeMap::new();
    if let Some(entries) = obj.get(key).and_then(Value::as_array) {
        for entry in entries.iter().filter_map(Value::as_object) {
            let name = norm(&str_of(entry, name_key));
            let count = count_of(u64_of(entry, "Count"));
            if !name.is_empty() && count > 0 {
                add_count(&mut map, &name, count);
            }
        }
    }
    map
}

fn locker_from(obj: &Map<String, Value>) -> LockerContents {
    LockerContents {
        items: counts_from(obj, "Items", "Name"),
        components: counts_from(obj, "Components", "Name"),
        consumables: counts_from(obj, "Consumables", "Name"),
        data: counts_from(obj, "Data", "Name"),
    }
}

fn route_from(obj: &Map<String, Value>) -> Vec<RouteHop> {
    obj.get("Route")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_object)
                .map(|hop| RouteHop {
                    system: str_of(hop, "StarSystem"),
                    star_class: str_of(hop, "StarClass"),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Add to a counted inventory entry.
fn add_count(map: &mut BTreeMap<String, u32>, name: &str, count: u32) {
    if count == 0 {
        return;
    }
    let key = norm(name);
    if key.is_empty() {
        return;
    }
    let entry = map.entry(key).or_insert(0);
    *entry = entry.saturating_add(count);
}

/// Subtract from a counted inventory entry, dropping it at zero.
fn remove_count(map: &mut BTreeMap<String, u32>, name: &str, count: u32) {
    let key = norm(name);
    if let Some(entry) = map.get_mut(&key) {
        *entry = entry.saturating_sub(count);
        if *entry == 0 {
            map.remove(&key);
        }
    }
}
