//! Static unit, technology and upgrade tables.
//!
//! Build times are in frames at the native tick rate. Supply values are in
//! whole supply points; a Zergling entry stands for the pair hatched from
//! one larva.

use serde::Serialize;

use crate::players::Race;

/// Build order category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Workers and resource structures.
    Economy,
    /// Supply providers.
    Supply,
    /// Combat units and production.
    Military,
    /// Tech structures, research and upgrades.
    Tech,
}

/// Static data for one unit or structure type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitInfo {
    /// Unit type id.
    pub id: u16,
    /// Display name.
    pub name: &'static str,
    /// Owning race.
    pub race: Race,
    /// Build order category.
    pub category: Category,
    /// Mineral cost.
    pub minerals: u16,
    /// Gas cost.
    pub gas: u16,
    /// Supply consumed.
    pub supply: u16,
    /// Supply provided once complete.
    pub supply_grant: u16,
    /// Build time in frames.
    pub build_frames: u32,
    /// Whether this is a structure.
    pub structure: bool,
}

/// Static data for a technology or upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TechInfo {
    /// Technology or upgrade id.
    pub id: u8,
    /// Display name.
    pub name: &'static str,
    /// Mineral cost.
    pub minerals: u16,
    /// Gas cost.
    pub gas: u16,
}

#[allow(clippy::too_many_arguments)]
const fn unit(
    id: u16,
    name: &'static str,
    race: Race,
    category: Category,
    minerals: u16,
    gas: u16,
    supply: u16,
    build_frames: u32,
) -> UnitInfo {
    UnitInfo {
        id,
        name,
        race,
        category,
        minerals,
        gas,
        supply,
        supply_grant: 0,
        build_frames,
        structure: false,
    }
}

const fn building(
    id: u16,
    name: &'static str,
    race: Race,
    category: Category,
    minerals: u16,
    gas: u16,
    build_frames: u32,
) -> UnitInfo {
    UnitInfo {
        id,
        name,
        race,
        category,
        minerals,
        gas,
        supply: 0,
        supply_grant: 0,
        build_frames,
        structure: true,
    }
}

const fn grants(mut info: UnitInfo, supply_grant: u16) -> UnitInfo {
    info.supply_grant = supply_grant;
    info
}

use self::Category::{Economy, Military, Supply, Tech};
use crate::players::Race::{Protoss, Terran, Zerg};

/// Terran units and structures.
pub const TERRAN_UNITS: &[UnitInfo] = &[
    unit(0, "Marine", Terran, Military, 50, 0, 1, 360),
    unit(1, "Ghost", Terran, Military, 25, 75, 1, 750),
    unit(2, "Vulture", Terran, Military, 75, 0, 2, 450),
    unit(3, "Goliath", Terran, Military, 100, 50, 2, 600),
    unit(5, "Siege Tank", Terran, Military, 150, 100, 2, 750),
    unit(7, "SCV", Terran, Economy, 50, 0, 1, 300),
    unit(8, "Wraith", Terran, Military, 150, 100, 2, 900),
    unit(9, "Science Vessel", Terran, Military, 100, 225, 2, 1200),
    unit(11, "Dropship", Terran, Military, 100, 100, 2, 750),
    unit(12, "Battlecruiser", Terran, Military, 400, 300, 6, 2000),
    unit(32, "Firebat", Terran, Military, 50, 25, 1, 360),
    unit(34, "Medic", Terran, Military, 50, 25, 1, 450),
    unit(58, "Valkyrie", Terran, Military, 250, 125, 3, 750),
    grants(building(106, "Command Center", Terran, Economy, 400, 0, 1800), 10),
    building(107, "Comsat Station", Terran, Tech, 50, 50, 600),
    building(108, "Nuclear Silo", Terran, Tech, 100, 100, 1200),
    grants(building(109, "Supply Depot", Terran, Supply, 100, 0, 600), 8),
    building(110, "Refinery", Terran, Economy, 100, 0, 600),
    building(111, "Barracks", Terran, Military, 150, 0, 1200),
    building(112, "Academy", Terran, Tech, 150, 0, 1200),
    building(113, "Factory", Terran, Military, 200, 100, 1200),
    building(114, "Starport", Terran, Military, 150, 100, 1050),
    building(115, "Control Tower", Terran, Tech, 50, 50, 600),
    building(116, "Science Facility", Terran, Tech, 100, 150, 900),
    building(117, "Covert Ops", Terran, Tech, 50, 50, 600),
    building(118, "Physics Lab", Terran, Tech, 50, 50, 600),
    building(120, "Machine Shop", Terran, Tech, 50, 50, 600),
    building(122, "Engineering Bay", Terran, Tech, 125, 0, 900),
    building(123, "Armory", Terran, Tech, 100, 50, 1200),
    building(124, "Missile Turret", Terran, Military, 75, 0, 450),
    building(125, "Bunker", Terran, Military, 100, 0, 450),
];

/// Zerg units and structures.
pub const ZERG_UNITS: &[UnitInfo] = &[
    unit(37, "Zergling", Zerg, Military, 50, 0, 1, 420),
    unit(38, "Hydralisk", Zerg, Military, 75, 25, 1, 420),
    unit(39, "Ultralisk", Zerg, Military, 200, 200, 4, 900),
    unit(41, "Drone", Zerg, Economy, 50, 0, 1, 300),
    grants(unit(42, "Overlord", Zerg, Supply, 100, 0, 0, 600), 8),
    unit(43, "Mutalisk", Zerg, Military, 100, 100, 2, 600),
    unit(44, "Guardian", Zerg, Military, 50, 100, 0, 600),
    unit(45, "Queen", Zerg, Military, 100, 100, 2, 750),
    unit(46, "Defiler", Zerg, Military, 50, 150, 2, 750),
    unit(47, "Scourge", Zerg, Military, 25, 75, 1, 450),
    unit(62, "Devourer", Zerg, Military, 150, 50, 0, 600),
    // Net of the consumed Hydralisk.
    unit(103, "Lurker", Zerg, Military, 50, 100, 1, 600),
    grants(building(131, "Hatchery", Zerg, Economy, 300, 0, 1800), 1),
    building(132, "Lair", Zerg, Tech, 150, 100, 1500),
    building(133, "Hive", Zerg, Tech, 200, 150, 1800),
    building(135, "Nydus Canal", Zerg, Tech, 150, 0, 600),
    building(136, "Hydralisk Den", Zerg, Tech, 100, 50, 600),
    building(137, "Defiler Mound", Zerg, Tech, 100, 100, 900),
    building(138, "Greater Spire", Zerg, Tech, 100, 150, 1800),
    building(139, "Queen's Nest", Zerg, Tech, 150, 100, 900),
    building(140, "Evolution Chamber", Zerg, Tech, 75, 0, 600),
    building(141, "Ultralisk Cavern", Zerg, Tech, 150, 200, 1200),
    building(142, "Spire", Zerg, Tech, 200, 150, 1800),
    building(143, "Spawning Pool", Zerg, Tech, 200, 0, 1200),
    building(144, "Sunken Colony", Zerg, Military, 50, 0, 300),
    building(146, "Creep Colony", Zerg, Military, 75, 0, 300),
    building(147, "Spore Colony", Zerg, Military, 50, 0, 300),
    building(149, "Extractor", Zerg, Economy, 50, 0, 600),
];

/// Protoss units and structures.
pub const PROTOSS_UNITS: &[UnitInfo] = &[
    unit(60, "Corsair", Protoss, Military, 150, 100, 2, 600),
    unit(61, "Dark Templar", Protoss, Military, 125, 100, 2, 750),
    unit(64, "Probe", Protoss, Economy, 50, 0, 1, 300),
    unit(65, "Zealot", Protoss, Military, 100, 0, 2, 600),
    unit(66, "Dragoon", Protoss, Military, 125, 50, 2, 750),
    unit(67, "High Templar", Protoss, Military, 50, 150, 2, 750),
    unit(69, "Shuttle", Protoss, Military, 200, 0, 2, 900),
    unit(70, "Scout", Protoss, Military, 275, 125, 3, 1200),
    unit(71, "Arbiter", Protoss, Military, 100, 350, 4, 2400),
    unit(72, "Carrier", Protoss, Military, 350, 250, 6, 2100),
    unit(83, "Reaver", Protoss, Military, 200, 100, 4, 1050),
    unit(84, "Observer", Protoss, Military, 25, 75, 1, 600),
    grants(building(154, "Nexus", Protoss, Economy, 400, 0, 1800), 9),
    building(155, "Robotics Facility", Protoss, Military, 200, 200, 1200),
    grants(building(156, "Pylon", Protoss, Supply, 100, 0, 450), 8),
    building(157, "Assimilator", Protoss, Economy, 100, 0, 600),
    building(159, "Observatory", Protoss, Tech, 50, 100, 450),
    building(160, "Gateway", Protoss, Military, 150, 0, 900),
    building(162, "Photon Cannon", Protoss, Military, 150, 0, 750),
    building(163, "Citadel of Adun", Protoss, Tech, 150, 100, 900),
    building(164, "Cybernetics Core", Protoss, Tech, 200, 0, 900),
    building(165, "Templar Archives", Protoss, Tech, 150, 200, 900),
    building(166, "Forge", Protoss, Tech, 150, 0, 600),
    building(167, "Stargate", Protoss, Military, 150, 150, 1050),
    building(169, "Fleet Beacon", Protoss, Tech, 300, 200, 900),
    building(170, "Arbiter Tribunal", Protoss, Tech, 200, 150, 900),
    building(171, "Robotics Support Bay", Protoss, Tech, 150, 100, 450),
    building(172, "Shield Battery", Protoss, Military, 100, 0, 450),
];

const fn tech(id: u8, name: &'static str, minerals: u16, gas: u16) -> TechInfo {
    TechInfo {
        id,
        name,
        minerals,
        gas,
    }
}

/// Researchable technologies.
pub const TECHS: &[TechInfo] = &[
    tech(0, "Stim Packs", 100, 100),
    tech(1, "Lockdown", 200, 200),
    tech(2, "EMP Shockwave", 200, 200),
    tech(3, "Spider Mines", 100, 100),
    tech(5, "Tank Siege Mode", 150, 150),
    tech(7, "Irradiate", 200, 200),
    tech(8, "Yamato Gun", 100, 100),
    tech(9, "Cloaking Field", 150, 150),
    tech(10, "Personnel Cloaking", 100, 100),
    tech(11, "Burrowing", 100, 100),
    tech(13, "Spawn Broodlings", 100, 100),
    tech(15, "Plague", 200, 200),
    tech(16, "Consume", 100, 100),
    tech(17, "Ensnare", 100, 100),
    tech(19, "Psionic Storm", 200, 200),
    tech(20, "Hallucination", 150, 150),
    tech(21, "Recall", 150, 150),
    tech(22, "Stasis Field", 150, 150),
    tech(24, "Restoration", 100, 100),
    tech(25, "Disruption Web", 200, 200),
    tech(27, "Mind Control", 200, 200),
    tech(30, "Optical Flare", 100, 100),
    tech(31, "Maelstrom", 100, 100),
    tech(32, "Lurker Aspect", 200, 200),
];

/// Upgrades (first level costs).
pub const UPGRADES: &[TechInfo] = &[
    tech(0, "Terran Infantry Armor", 100, 100),
    tech(1, "Terran Vehicle Plating", 100, 100),
    tech(2, "Terran Ship Plating", 150, 150),
    tech(3, "Zerg Carapace", 150, 150),
    tech(4, "Zerg Flyer Carapace", 150, 150),
    tech(5, "Protoss Ground Armor", 100, 100),
    tech(6, "Protoss Air Armor", 150, 150),
    tech(7, "Terran Infantry Weapons", 100, 100),
    tech(8, "Terran Vehicle Weapons", 100, 100),
    tech(9, "Terran Ship Weapons", 100, 100),
    tech(10, "Zerg Melee Attacks", 100, 100),
    tech(11, "Zerg Missile Attacks", 100, 100),
    tech(12, "Zerg Flyer Attacks", 100, 100),
    tech(13, "Protoss Ground Weapons", 100, 100),
    tech(14, "Protoss Air Weapons", 100, 100),
    tech(15, "Plasma Shields", 200, 200),
    tech(16, "U-238 Shells", 150, 150),
    tech(17, "Ion Thrusters", 100, 100),
    tech(19, "Titan Reactor", 150, 150),
    tech(24, "Pneumatized Carapace", 150, 150),
    tech(25, "Ventral Sacs", 200, 200),
    tech(26, "Antennae", 150, 150),
    tech(27, "Muscular Augments", 150, 150),
    tech(28, "Grooved Spines", 150, 150),
    tech(29, "Metabolic Boost", 100, 100),
    tech(30, "Adrenal Glands", 200, 200),
    tech(32, "Singularity Charge", 150, 150),
    tech(33, "Leg Enhancements", 150, 150),
    tech(34, "Scarab Damage", 200, 200),
    tech(35, "Reaver Capacity", 200, 200),
    tech(36, "Gravitic Drive", 200, 200),
    tech(37, "Sensor Array", 150, 150),
    tech(38, "Gravitic Boosters", 150, 150),
    tech(39, "Khaydarin Amulet", 150, 150),
    tech(40, "Apial Sensors", 100, 100),
    tech(41, "Gravitic Thrusters", 200, 200),
    tech(42, "Carrier Capacity", 100, 100),
    tech(43, "Khaydarin Core", 150, 150),
    tech(47, "Argus Jewel", 100, 100),
    tech(49, "Argus Talisman", 150, 150),
    tech(51, "Caduceus Reactor", 150, 150),
    tech(52, "Chitinous Plating", 150, 150),
    tech(53, "Anabolic Synthesis", 200, 200),
    tech(54, "Charon Boosters", 100, 100),
];

/// Returns the unit table of a race.
#[must_use]
pub fn units_for(race: Race) -> &'static [UnitInfo] {
    match race {
        Race::Terran => TERRAN_UNITS,
        Race::Zerg => ZERG_UNITS,
        Race::Protoss => PROTOSS_UNITS,
        Race::Random | Race::Unknown => &[],
    }
}

/// Looks up a unit type, preferring the given race's table.
///
/// Unit ids are unique across races, so a player whose race is random or
/// unknown still resolves.
#[must_use]
pub fn unit_info(race: Race, id: u16) -> Option<&'static UnitInfo> {
    units_for(race)
        .iter()
        .chain(TERRAN_UNITS)
        .chain(ZERG_UNITS)
        .chain(PROTOSS_UNITS)
        .find(|u| u.id == id)
}

/// Looks up a technology.
#[must_use]
pub fn tech_info(id: u8) -> Option<&'static TechInfo> {
    TECHS.iter().find(|t| t.id == id)
}

/// Looks up an upgrade.
#[must_use]
pub fn upgrade_info(id: u8) -> Option<&'static TechInfo> {
    UPGRADES.iter().find(|t| t.id == id)
}

/// Starting `(supply_used, supply_cap)` for a race.
#[must_use]
pub const fn starting_supply(race: Race) -> Option<(u16, u16)> {
    match race {
        Race::Terran => Some((4, 10)),
        Race::Zerg | Race::Protoss => Some((4, 9)),
        Race::Random | Race::Unknown => None,
    }
}
