//! Build order reconstruction.
//!
//! Construction, training, morph, research and upgrade commands are turned
//! into per-player [`BuildOrderEntry`] lists. Each player carries a running
//! supply counter seeded from their race:
//!
//! - trained or morphed units add their supply cost
//! - a Zerg structure consumes the drone that became it
//! - supply providers raise the cap (max 200) once their build time has
//!   elapsed
//!
//! The supply recorded on an entry is the count when the command was issued.

pub mod units;

use serde::Serialize;
use tracing::debug;

use crate::commands::{codes, CommandEvent, CommandParams};
use crate::format::format_game_time;
use crate::players::{PlayerRecord, Race};

pub use units::{Category, TechInfo, UnitInfo};

/// Largest supply cap a player can reach.
pub const MAX_SUPPLY: u16 = 200;

/// Opcodes that produce build order entries.
pub const BUILD_ORDER_OPCODES: &[u8] = &[
    codes::BUILD,
    codes::TRAIN,
    codes::UNIT_MORPH,
    codes::BUILDING_MORPH,
    codes::RESEARCH,
    codes::UPGRADE,
];

/// What kind of command an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildAction {
    /// Structure placed by a worker.
    Build,
    /// Unit trained from a structure.
    Train,
    /// Unit morphed from a larva or another unit.
    UnitMorph,
    /// Structure morphed into another.
    BuildingMorph,
    /// Technology research.
    Research,
    /// Upgrade.
    Upgrade,
}

/// Resource cost of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cost {
    /// Minerals.
    pub minerals: u16,
    /// Gas.
    pub gas: u16,
}

/// One step of a player's build order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildOrderEntry {
    /// Frame the command was issued on.
    pub frame: u32,
    /// Game time as `m:ss`.
    pub time: String,
    /// Supply used when the command was issued.
    pub supply: u16,
    /// Supply cap at that time, when the race is known.
    pub supply_cap: Option<u16>,
    /// Kind of command.
    pub action: BuildAction,
    /// Display name.
    pub name: String,
    /// Category, when the id resolved.
    pub category: Option<Category>,
    /// Cost, when the id resolved.
    pub cost: Option<Cost>,
}

/// A player's reconstructed build order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerBuildOrder {
    /// Player id.
    pub player_id: u8,
    /// Player name.
    pub name: String,
    /// Entries in frame order.
    pub entries: Vec<BuildOrderEntry>,
}

#[derive(Debug)]
struct SupplyState {
    race: Race,
    used: u16,
    cap: Option<u16>,
    pending: Vec<(u32, u16)>,
}

impl SupplyState {
    fn new(race: Race) -> Self {
        let (used, cap) = match units::starting_supply(race) {
            Some((used, cap)) => (used, Some(cap)),
            None => (4, None),
        };
        Self {
            race,
            used,
            cap,
            pending: Vec::new(),
        }
    }

    /// Learns the race from the first resolved unit of a random player.
    fn observe_race(&mut self, race: Race) {
        if self.cap.is_none() {
            if let Some((_, cap)) = units::starting_supply(race) {
                self.race = race;
                self.cap = Some(cap);
            }
        }
    }

    /// Applies every grant whose structure has finished by `frame`.
    fn complete_until(&mut self, frame: u32) {
        let mut granted = 0u16;
        self.pending.retain(|&(done, grant)| {
            if done <= frame {
                granted = granted.saturating_add(grant);
                false
            } else {
                true
            }
        });
        if granted > 0 {
            self.cap = self
                .cap
                .map(|cap| cap.saturating_add(granted).min(MAX_SUPPLY));
        }
    }

    fn apply_unit(&mut self, frame: u32, info: &UnitInfo, action: BuildAction) {
        if action == BuildAction::Build && info.structure && info.race == Race::Zerg {
            self.used = self.used.saturating_sub(1);
        }
        if action != BuildAction::BuildingMorph {
            self.used = self.used.saturating_add(info.supply);
        }
        if info.supply_grant > 0 {
            self.pending
                .push((frame.saturating_add(info.build_frames), info.supply_grant));
        }
    }
}

/// Reconstructs build orders for the given players.
///
/// Events from ids not in `players` are ignored. Each list is capped at
/// `max_len` entries.
#[must_use]
pub fn reconstruct(
    events: &[CommandEvent],
    players: &[PlayerRecord],
    max_len: usize,
) -> Vec<PlayerBuildOrder> {
    let mut orders: Vec<PlayerBuildOrder> = players
        .iter()
        .map(|p| PlayerBuildOrder {
            player_id: p.player_id,
            name: p.name.clone(),
            entries: Vec::new(),
        })
        .collect();
    let mut states: Vec<SupplyState> = players.iter().map(|p| SupplyState::new(p.race)).collect();

    for event in events {
        if !BUILD_ORDER_OPCODES.contains(&event.opcode) {
            continue;
        }
        let Some(index) = players.iter().position(|p| p.player_id == event.player) else {
            continue;
        };
        if orders[index].entries.len() >= max_len {
            continue;
        }
        if let Some(entry) = entry_for(event, &mut states[index]) {
            orders[index].entries.push(entry);
        }
    }

    for order in &orders {
        debug!(
            player = order.player_id,
            entries = order.entries.len(),
            "build order reconstructed"
        );
    }
    orders
}

fn entry_for(event: &CommandEvent, state: &mut SupplyState) -> Option<BuildOrderEntry> {
    state.complete_until(event.frame);

    let entry = |state: &SupplyState, action, name: String, category, cost| BuildOrderEntry {
        frame: event.frame,
        time: format_game_time(event.frame),
        supply: state.used,
        supply_cap: state.cap,
        action,
        name,
        category,
        cost,
    };

    match (&event.params, event.opcode) {
        (CommandParams::TechRef { tech }, codes::RESEARCH) => {
            let info = units::tech_info(*tech);
            Some(entry(
                &*state,
                BuildAction::Research,
                info.map_or_else(|| format!("Unknown tech #{tech}"), |t| t.name.to_string()),
                info.map(|_| Category::Tech),
                info.map(|t| Cost {
                    minerals: t.minerals,
                    gas: t.gas,
                }),
            ))
        }
        (CommandParams::UpgradeRef { upgrade }, codes::UPGRADE) => {
            let info = units::upgrade_info(*upgrade);
            Some(entry(
                &*state,
                BuildAction::Upgrade,
                info.map_or_else(
                    || format!("Unknown upgrade #{upgrade}"),
                    |t| t.name.to_string(),
                ),
                info.map(|_| Category::Tech),
                info.map(|t| Cost {
                    minerals: t.minerals,
                    gas: t.gas,
                }),
            ))
        }
        _ => {
            let id = event.unit_id()?;
            let action = match event.opcode {
                codes::BUILD => BuildAction::Build,
                codes::TRAIN => BuildAction::Train,
                codes::UNIT_MORPH => BuildAction::UnitMorph,
                codes::BUILDING_MORPH => BuildAction::BuildingMorph,
                _ => return None,
            };
            let Some(info) = units::unit_info(state.race, id) else {
                return Some(entry(
                    &*state,
                    action,
                    format!("Unknown unit #{id}"),
                    None,
                    None,
                ));
            };
            state.observe_race(info.race);
            let recorded = entry(
                &*state,
                action,
                info.name.to_string(),
                Some(info.category),
                Some(Cost {
                    minerals: info.minerals,
                    gas: info.gas,
                }),
            );
            state.apply_unit(event.frame, info, action);
            Some(recorded)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::players::SlotType;
    use crate::text::Charset;

    fn player(id: u8, race: Race) -> PlayerRecord {
        PlayerRecord {
            slot: id,
            player_id: id,
            name: format!("P{id}"),
            charset: Charset::Utf8,
            race,
            team: id,
            color: None,
            slot_type: SlotType::Human,
        }
    }

    fn cmd(frame: u32, player: u8, opcode: u8, params: CommandParams) -> CommandEvent {
        CommandEvent {
            frame,
            player,
            opcode,
            params,
            payload_len: 0,
        }
    }

    fn train(frame: u32, player: u8, unit: u16) -> CommandEvent {
        cmd(frame, player, codes::TRAIN, CommandParams::UnitRef { unit })
    }

    fn build(frame: u32, player: u8, unit: u16) -> CommandEvent {
        cmd(
            frame,
            player,
            codes::BUILD,
            CommandParams::Placement {
                order: 0x1E,
                x: 0,
                y: 0,
                unit,
            },
        )
    }

    #[test]
    fn test_terran_opening() {
        let events = vec![
            train(10, 0, 7),
            train(300, 0, 7),
            build(1000, 0, 109),
            train(1200, 0, 7),
            train(1700, 0, 7),
        ];
        let orders = reconstruct(&events, &[player(0, Race::Terran)], 200);
        let entries = &orders[0].entries;
        assert_eq!(entries.len(), 5);

        assert_eq!(entries[0].name, "SCV");
        assert_eq!(entries[0].supply, 4);
        assert_eq!(entries[0].supply_cap, Some(10));
        assert_eq!(entries[0].category, Some(Category::Economy));
        assert_eq!(entries[1].supply, 5);
        assert_eq!(entries[2].name, "Supply Depot");
        assert_eq!(entries[2].supply, 6);
        assert_eq!(entries[2].cost, Some(Cost { minerals: 100, gas: 0 }));
        // depot finishes at frame 1600
        assert_eq!(entries[3].supply_cap, Some(10));
        assert_eq!(entries[4].supply_cap, Some(18));
        assert_eq!(entries[4].supply, 7);
        assert_eq!(entries[4].time, "1:11");
    }

    #[test]
    fn test_zerg_drone_consumed_by_structure() {
        let events = vec![
            cmd(10, 1, codes::UNIT_MORPH, CommandParams::UnitRef { unit: 41 }),
            build(500, 1, 143),
            cmd(600, 1, codes::UNIT_MORPH, CommandParams::UnitRef { unit: 42 }),
            cmd(1300, 1, codes::UNIT_MORPH, CommandParams::UnitRef { unit: 37 }),
        ];
        let orders = reconstruct(&events, &[player(1, Race::Zerg)], 200);
        let entries = &orders[0].entries;
        assert_eq!(entries[0].supply, 4);
        assert_eq!(entries[0].supply_cap, Some(9));
        assert_eq!(entries[1].name, "Spawning Pool");
        assert_eq!(entries[1].supply, 5);
        assert_eq!(entries[2].supply, 4);
        assert_eq!(entries[2].name, "Overlord");
        assert_eq!(entries[3].supply_cap, Some(17));
    }

    #[test]
    fn test_research_and_upgrade() {
        let events = vec![
            cmd(100, 0, codes::RESEARCH, CommandParams::TechRef { tech: 0 }),
            cmd(200, 0, codes::UPGRADE, CommandParams::UpgradeRef { upgrade: 250 }),
        ];
        let orders = reconstruct(&events, &[player(0, Race::Terran)], 200);
        let entries = &orders[0].entries;
        assert_eq!(entries[0].name, "Stim Packs");
        assert_eq!(entries[0].action, BuildAction::Research);
        assert_eq!(entries[0].category, Some(Category::Tech));
        assert_eq!(entries[1].name, "Unknown upgrade #250");
        assert_eq!(entries[1].cost, None);
    }

    #[test]
    fn test_unknown_unit_kept_without_cost() {
        let orders = reconstruct(&[train(50, 0, 200)], &[player(0, Race::Protoss)], 200);
        let entry = &orders[0].entries[0];
        assert_eq!(entry.name, "Unknown unit #200");
        assert_eq!(entry.cost, None);
        assert_eq!(entry.category, None);
        assert_eq!(entry.supply, 4);
    }

    #[test]
    fn test_random_race_resolved_from_first_unit() {
        let events = vec![train(10, 0, 200), train(20, 0, 64), train(30, 0, 64)];
        let orders = reconstruct(&events, &[player(0, Race::Random)], 200);
        let entries = &orders[0].entries;
        assert_eq!(entries[0].supply_cap, None);
        assert_eq!(entries[1].supply_cap, Some(9));
        assert_eq!(entries[2].supply, 5);
    }

    #[test]
    fn test_filters_and_caps() {
        let events = vec![
            cmd(5, 0, codes::STOP, CommandParams::Queued { queued: false }),
            train(10, 3, 7),
            train(20, 0, 7),
            train(30, 0, 7),
            train(40, 0, 7),
        ];
        let orders = reconstruct(&events, &[player(0, Race::Terran)], 2);
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].entries.len(), 2);
        assert_eq!(orders[0].entries[0].frame, 20);
    }

    #[test]
    fn test_supply_cap_limit() {
        let events: Vec<_> = (0..30).map(|i| build(i * 10, 0, 109)).collect();
        let mut events = events;
        events.push(train(100_000, 0, 7));
        let orders = reconstruct(&events, &[player(0, Race::Terran)], 200);
        assert_eq!(orders[0].entries.last().unwrap().supply_cap, Some(MAX_SUPPLY));
    }

    #[test]
    fn test_entries_are_frame_ordered() {
        let events = vec![train(10, 0, 7), build(10, 0, 111), train(90, 0, 0)];
        let orders = reconstruct(&events, &[player(0, Race::Terran)], 200);
        let frames: Vec<u32> = orders[0].entries.iter().map(|e| e.frame).collect();
        assert!(frames.windows(2).all(|w| w[0] <= w[1]));
    }
}
