//! Recognized journal event kinds.
//!
//! [`EventKind`] is a closed enumeration of the event names the reducer
//! has transition rules for, plus [`EventKind::Unknown`] for everything
//! else. The raw name string is always preserved on the event itself, so
//! an unknown kind loses nothing -- it flows through the bus untouched
//! and simply folds to an empty delta.

use serde::{Deserialize, Serialize};

/// A recognized journal event kind.
///
/// Variants are grouped by the state slice they predominantly touch.
/// The mapping from the game's event name strings is total: every name
/// maps to exactly one variant, with [`Self::Unknown`] as the catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKind {
    // --- Session bootstrap and commander identity ---
    /// First line of every journal file.
    Fileheader,
    /// Commander identity at login.
    Commander,
    /// A brand new commander was created.
    NewCommander,
    /// Game session load: commander, ship, credits.
    LoadGame,
    /// Full ship loadout dump.
    Loadout,
    /// Current rank levels.
    Rank,
    /// Progress toward the next rank levels.
    Progress,
    /// Superpower reputation values.
    Reputation,
    /// Lifetime statistics dump at login.
    Statistics,
    /// Clean game shutdown.
    Shutdown,
    /// A rank was promoted.
    Promotion,

    // --- Travel and location ---
    /// Location fix at login or respawn.
    Location,
    /// Hyperspace jump completed.
    FsdJump,
    /// Entered supercruise.
    SupercruiseEntry,
    /// Dropped from supercruise.
    SupercruiseExit,
    /// Docked at a station pad.
    Docked,
    /// Left a station pad.
    Undocked,
    /// Touched down on a planetary surface.
    Touchdown,
    /// Lifted off from a planetary surface.
    Liftoff,
    /// Entered orbital cruise around a body.
    ApproachBody,
    /// Left orbital cruise.
    LeaveBody,
    /// Approached a surface settlement.
    ApproachSettlement,
    /// A navigation route was plotted.
    NavRoute,
    /// The navigation route was cleared.
    NavRouteClear,

    // --- Fuel ---
    /// Fuel scooped from a star.
    FuelScoop,
    /// Full refuel purchased.
    RefuelAll,
    /// Partial refuel purchased.
    RefuelPartial,

    // --- Combat and crime ---
    /// Bounty voucher awarded.
    Bounty,
    /// The commander died.
    Died,
    /// Respawn after death.
    Resurrect,
    /// Hull integrity changed.
    HullDamage,
    /// Shields went up or down.
    ShieldState,
    /// An interdiction against the commander succeeded or was submitted to.
    Interdicted,
    /// The commander escaped an interdiction attempt.
    EscapeInterdiction,
    /// A crime was committed.
    CommitCrime,

    // --- Exploration ---
    /// A body was scanned.
    Scan,
    /// Discovery scanner honk.
    FssDiscoveryScan,
    /// Every body in the system has been found.
    FssAllBodiesFound,
    /// Exploration data sold.
    SellExplorationData,
    /// Exploration data sold (multi-page variant).
    MultiSellExplorationData,

    // --- Trade and cargo ---
    /// Commodities bought at a market.
    MarketBuy,
    /// Commodities sold at a market.
    MarketSell,
    /// A cargo canister was scooped.
    CollectCargo,
    /// Cargo was jettisoned.
    EjectCargo,
    /// Full cargo manifest dump.
    Cargo,
    /// A mining fragment was refined into cargo.
    MiningRefined,
    /// Limpet drones bought.
    BuyDrones,
    /// Limpet drones sold.
    SellDrones,

    // --- Shipyard and outfitting ---
    /// A ship was bought.
    ShipyardBuy,
    /// A ship was sold.
    ShipyardSell,
    /// Swapped to another owned ship.
    ShipyardSwap,
    /// A stored ship transfer was paid for.
    ShipyardTransfer,
    /// A module was bought.
    ModuleBuy,
    /// A module was sold.
    ModuleSell,
    /// A module was put into storage.
    ModuleStore,
    /// A module was retrieved from storage.
    ModuleRetrieve,
    /// Two modules swapped slots.
    ModuleSwap,
    /// Ship name or registration changed.
    SetUserShipName,
    /// A single module was repaired.
    Repair,
    /// Everything was repaired.
    RepairAll,
    /// Ammunition restocked.
    BuyAmmo,
    /// SRV or fighter restocked.
    RestockVehicle,
    /// The AFMU repaired a module in flight.
    AfmuRepairs,

    // --- Materials and engineering ---
    /// Full material inventory dump.
    Materials,
    /// An engineering material was collected.
    MaterialCollected,
    /// An engineering material was discarded.
    MaterialDiscarded,
    /// Materials traded at a material trader.
    MaterialTrade,
    /// Materials consumed by synthesis.
    Synthesis,
    /// Materials consumed by an engineer craft.
    EngineerCraft,
    /// Engineer relationship progressed.
    EngineerProgress,

    // --- Missions ---
    /// Active mission list dump at login.
    Missions,
    /// A mission was accepted.
    MissionAccepted,
    /// A mission was completed.
    MissionCompleted,
    /// A mission was failed.
    MissionFailed,
    /// A mission was abandoned.
    MissionAbandoned,
    /// A mission destination changed.
    MissionRedirected,

    // --- Money ---
    /// Vouchers redeemed (bounties, bonds, trade dividends).
    RedeemVoucher,
    /// Fines paid off.
    PayFines,
    /// Bounties on the commander paid off.
    PayBounties,

    // --- Fleet carrier ---
    /// A fleet carrier was bought.
    CarrierBuy,
    /// Periodic carrier statistics dump.
    CarrierStats,
    /// The carrier completed a jump.
    CarrierJump,
    /// A carrier jump was scheduled.
    CarrierJumpRequest,
    /// The scheduled carrier jump was cancelled.
    CarrierJumpCancelled,
    /// Tritium was deposited into the carrier tank.
    CarrierDepositFuel,
    /// Carrier finance summary.
    CarrierFinance,
    /// Carrier docking access changed.
    CarrierDockingPermission,
    /// The carrier was renamed.
    CarrierNameChange,
    /// Carrier decommissioning was scheduled.
    CarrierDecommission,

    // --- On-foot (Odyssey) ---
    /// Suit loadout equipped at login.
    SuitLoadout,
    /// Switched to another suit loadout.
    SwitchSuitLoadout,
    /// A new suit loadout was created.
    CreateSuitLoadout,
    /// A suit was bought.
    BuySuit,
    /// A suit was sold.
    SellSuit,
    /// Boarded a ship, SRV, or taxi.
    Embark,
    /// Disembarked on foot.
    Disembark,
    /// Full backpack contents dump.
    Backpack,
    /// Incremental backpack change.
    BackpackChange,
    /// Items picked up on foot.
    CollectItems,
    /// Items dropped on foot.
    DropItems,
    /// A consumable was used.
    UseConsumable,
    /// An organic sample was taken.
    ScanOrganic,
    /// Organic data was sold.
    SellOrganicData,
    /// Full ship locker contents dump.
    ShipLocker,

    // --- Recognized but stateless ---
    /// In-game music cue.
    Music,
    /// Text message received.
    ReceiveText,
    /// Heat warning.
    HeatWarning,
    /// An SRV was deployed.
    LaunchSrv,
    /// An SRV was recovered.
    DockSrv,

    /// Any event name without a transition rule in this version.
    Unknown,
}

impl EventKind {
    /// Map a journal event name string to its kind.
    ///
    /// Names not listed here map to [`Self::Unknown`]; the raw name is
    /// preserved on the event, so nothing is lost.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Fileheader" => Self::Fileheader,
            "Commander" => Self::Commander,
            "NewCommander" => Self::NewCommander,
            "LoadGame" => Self::LoadGame,
            "Loadout" => Self::Loadout,
            "Rank" => Self::Rank,
            "Progress" => Self::Progress,
            "Reputation" => Self::Reputation,
            "Statistics" => Self::Statistics,
            "Shutdown" => Self::Shutdown,
            "Promotion" => Self::Promotion,
            "Location" => Self::Location,
            "FSDJump" => Self::FsdJump,
            "SupercruiseEntry" => Self::SupercruiseEntry,
            "SupercruiseExit" => Self::SupercruiseExit,
            "Docked" => Self::Docked,
            "Undocked" => Self::Undocked,
            "Touchdown" => Self::Touchdown,
            "Liftoff" => Self::Liftoff,
            "ApproachBody" => Self::ApproachBody,
            "LeaveBody" => Self::LeaveBody,
            "ApproachSettlement" => Self::ApproachSettlement,
            "NavRoute" => Self::NavRoute,
            "NavRouteClear" => Self::NavRouteClear,
            "FuelScoop" => Self::FuelScoop,
            "RefuelAll" => Self::RefuelAll,
            "RefuelPartial" => Self::RefuelPartial,
            "Bounty" => Self::Bounty,
            "Died" => Self::Died,
            "Resurrect" => Self::Resurrect,
            "HullDamage" => Self::HullDamage,
            "ShieldState" => Self::ShieldState,
            "Interdicted" => Self::Interdicted,
            "EscapeInterdiction" => Self::EscapeInterdiction,
            "CommitCrime" => Self::CommitCrime,
            "Scan" => Self::Scan,
            "FSSDiscoveryScan" => Self::FssDiscoveryScan,
            "FSSAllBodiesFound" => Self::FssAllBodiesFound,
            "SellExplorationData" => Self::SellExplorationData,
            "MultiSellExplorationData" => Self::MultiSellExplorationData,
            "MarketBuy" => Self::MarketBuy,
            "MarketSell" => Self::MarketSell,
            "CollectCargo" => Self::CollectCargo,
            "EjectCargo" => Self::EjectCargo,
            "Cargo" => Self::Cargo,
            "MiningRefined" => Self::MiningRefined,
            "BuyDrones" => Self::BuyDrones,
            "SellDrones" => Self::SellDrones,
            "ShipyardBuy" => Self::ShipyardBuy,
            "ShipyardSell" => Self::ShipyardSell,
            "ShipyardSwap" => Self::ShipyardSwap,
            "ShipyardTransfer" => Self::ShipyardTransfer,
            "ModuleBuy" => Self::ModuleBuy,
            "ModuleSell" => Self::ModuleSell,
            "ModuleStore" => Self::ModuleStore,
            "ModuleRetrieve" => Self::ModuleRetrieve,
            "ModuleSwap" => Self::ModuleSwap,
            "SetUserShipName" => Self::SetUserShipName,
            "Repair" => Self::Repair,
            "RepairAll" => Self::RepairAll,
            "BuyAmmo" => Self::BuyAmmo,
            "RestockVehicle" => Self::RestockVehicle,
            "AfmuRepairs" => Self::AfmuRepairs,
            "Materials" => Self::Materials,
            "MaterialCollected" => Self::MaterialCollected,
            "MaterialDiscarded" => Self::MaterialDiscarded,
            "MaterialTrade" => Self::MaterialTrade,
            "Synthesis" => Self::Synthesis,
            "EngineerCraft" => Self::EngineerCraft,
            "EngineerProgress" => Self::EngineerProgress,
            "Missions" => Self::Missions,
            "MissionAccepted" => Self::MissionAccepted,
            "MissionCompleted" => Self::MissionCompleted,
            "MissionFailed" => Self::MissionFailed,
            "MissionAbandoned" => Self::MissionAbandoned,
            "MissionRedirected" => Self::MissionRedirected,
            "RedeemVoucher" => Self::RedeemVoucher,
            "PayFines" => Self::PayFines,
            "PayBounties" => Self::PayBounties,
            "CarrierBuy" => Self::CarrierBuy,
            "CarrierStats" => Self::CarrierStats,
            "CarrierJump" => Self::CarrierJump,
            "CarrierJumpRequest" => Self::CarrierJumpRequest,
            "CarrierJumpCancelled" => Self::CarrierJumpCancelled,
            "CarrierDepositFuel" => Self::CarrierDepositFuel,
            "CarrierFinance" => Self::CarrierFinance,
            "CarrierDockingPermission" => Self::CarrierDockingPermission,
            "CarrierNameChange" => Self::CarrierNameChange,
            "CarrierDecommission" => Self::CarrierDecommission,
            "SuitLoadout" => Self::SuitLoadout,
            "SwitchSuitLoadout" => Self::SwitchSuitLoadout,
            "CreateSuitLoadout" => Self::CreateSuitLoadout,
            "BuySuit" => Self::BuySuit,
            "SellSuit" => Self::SellSuit,
            "Embark" => Self::Embark,
            "Disembark" => Self::Disembark,
            "Backpack" => Self::Backpack,
            "BackpackChange" => Self::BackpackChange,
            "CollectItems" => Self::CollectItems,
            "DropItems" => Self::DropItems,
            "UseConsumable" => Self::UseConsumable,
            "ScanOrganic" => Self::ScanOrganic,
            "SellOrganicData" => Self::SellOrganicData,
            "ShipLocker" => Self::ShipLocker,
            "Music" => Self::Music,
            "ReceiveText" => Self::ReceiveText,
            "HeatWarning" => Self::HeatWarning,
            "LaunchSRV" => Self::LaunchSrv,
            "DockSRV" => Self::DockSrv,
            _ => Self::Unknown,
        }
    }

    /// Whether this kind is recognized (has a transition rule).
    pub const fn is_recognized(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_map_to_kinds() {
        assert_eq!(EventKind::from_name("LoadGame"), EventKind::LoadGame);
        assert_eq!(EventKind::from_name("FSDJump"), EventKind::FsdJump);
        assert_eq!(EventKind::from_name("CarrierStats"), EventKind::CarrierStats);
        assert_eq!(EventKind::from_name("ScanOrganic"), EventKind::ScanOrganic);
    }

    #[test]
    fn unknown_names_map_to_unknown() {
        assert_eq!(EventKind::from_name("SomeFutureEvent"), EventKind::Unknown);
        assert_eq!(EventKind::from_name(""), EventKind::Unknown);
        assert!(!EventKind::from_name("SomeFutureEvent").is_recognized());
    }

    #[test]
    fn mapping_is_case_sensitive() {
        // The game writes exact names; lowercase variants are foreign.
        assert_eq!(EventKind::from_name("fsdjump"), EventKind::Unknown);
        assert_eq!(EventKind::from_name("loadgame"), EventKind::Unknown);
    }
}
