//! Player table parsing.
//!
//! The header section holds a fixed table of player slots. Writers did not
//! agree on the exact placement, so the parser walks [`SLOT_LAYOUTS`] in
//! order and takes the first layout that yields at least two valid,
//! distinct active players. Nothing is ever synthesized: when no layout
//! qualifies, the result is [`ParserError::PlayerTableUnresolved`].
//!
//! # Slot format
//!
//! | Offset | Size | Type | Field |
//! |--------|------|------|-------|
//! | 0x00 | 2 | u16 LE | Slot number |
//! | 0x04 | 1 | u8 | Player id (referenced by commands) |
//! | 0x08 | 1 | u8 | Slot type (0 inactive, 1 computer, 2 human) |
//! | 0x09 | 1 | u8 | Race |
//! | 0x0A | 1 | u8 | Team |
//! | 0x0B | 25 | string | Name |
//!
//! Colours live in a separate table of eight u32 entries, indexed by slot.

use serde::Serialize;
use tracing::{debug, trace};

use crate::binary::ByteCursor;
use crate::error::{ParserError, Result};
use crate::format::{offsets, FormatDescriptor};
use crate::text::{decode_name, Charset};

/// Maximum number of player slots read per layout.
pub const MAX_PLAYERS: usize = 8;

/// Minimum number of valid players for a layout to be accepted.
pub const MIN_PLAYERS: usize = 2;

const SLOT_PLAYER_ID: usize = 0x04;
const SLOT_TYPE: usize = 0x08;
const SLOT_RACE: usize = 0x09;
const SLOT_TEAM: usize = 0x0A;
const SLOT_NAME: usize = 0x0B;
const SLOT_NAME_LEN: usize = 25;

/// A candidate placement of the slot table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLayout {
    /// Name reported in logs.
    pub name: &'static str,
    /// Table offset relative to the section base.
    pub base: usize,
    /// Bytes per slot.
    pub stride: usize,
}

/// Slot table layouts, tried in order.
pub const SLOT_LAYOUTS: &[SlotLayout] = &[
    SlotLayout {
        name: "standard",
        base: offsets::PLAYER_SLOTS,
        stride: 36,
    },
    SlotLayout {
        name: "wide",
        base: offsets::PLAYER_SLOTS,
        stride: 37,
    },
    SlotLayout {
        name: "shifted",
        base: offsets::PLAYER_SLOTS + 4,
        stride: 36,
    },
];

/// Player race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Race {
    /// Race byte 0.
    Zerg,
    /// Race byte 1.
    Terran,
    /// Race byte 2.
    Protoss,
    /// Race byte 6, unresolved at lobby time.
    Random,
    /// Any other value.
    Unknown,
}

impl Race {
    /// Decodes a race byte.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Race::Zerg,
            1 => Race::Terran,
            2 => Race::Protoss,
            6 => Race::Random,
            _ => Race::Unknown,
        }
    }
}

/// Who controls a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotType {
    /// Computer-controlled.
    Computer,
    /// A human player.
    Human,
}

impl SlotType {
    /// Decodes the slot type byte. Returns `None` for inactive or unknown
    /// slots.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(SlotType::Computer),
            2 => Some(SlotType::Human),
            _ => None,
        }
    }
}

const COLOR_NAMES: &[&str] = &[
    "Red",
    "Blue",
    "Teal",
    "Purple",
    "Orange",
    "Brown",
    "White",
    "Yellow",
    "Green",
    "Pale Yellow",
    "Tan",
    "Azure",
];

/// Returns the display name of a colour index.
#[must_use]
pub fn color_name(index: u32) -> Option<&'static str> {
    usize::try_from(index)
        .ok()
        .and_then(|i| COLOR_NAMES.get(i))
        .copied()
}

/// An active player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerRecord {
    /// Position in the slot table (0-7).
    pub slot: u8,
    /// Id that command events refer to.
    pub player_id: u8,
    /// Display name.
    pub name: String,
    /// Charset the name was decoded with.
    pub charset: Charset,
    /// Race.
    pub race: Race,
    /// Team number.
    pub team: u8,
    /// Colour name, if the colour table resolves.
    pub color: Option<&'static str>,
    /// Human or computer.
    pub slot_type: SlotType,
}

/// The resolved player table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerTable {
    /// Name of the layout that was accepted.
    pub layout: &'static str,
    /// Active players in slot order.
    pub players: Vec<PlayerRecord>,
}

impl PlayerTable {
    /// Returns whether `player_id` belongs to an active player.
    #[must_use]
    pub fn contains(&self, player_id: u8) -> bool {
        self.players.iter().any(|p| p.player_id == player_id)
    }

    /// Returns the player with the given id.
    #[must_use]
    pub fn get(&self, player_id: u8) -> Option<&PlayerRecord> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    /// Returns the active player ids.
    #[must_use]
    pub fn ids(&self) -> Vec<u8> {
        self.players.iter().map(|p| p.player_id).collect()
    }
}

/// Locates and decodes the player table.
///
/// # Errors
///
/// Returns `ParserError::PlayerTableUnresolved` if no layout yields at least
/// two valid, distinct active players.
pub fn parse_players(buffer: &[u8], descriptor: &FormatDescriptor) -> Result<PlayerTable> {
    let base = descriptor.section_offset;
    let colors = read_colors(buffer, base);

    for layout in SLOT_LAYOUTS {
        let players = read_layout(buffer, base, layout, &colors);
        trace!(layout = layout.name, found = players.len(), "slot layout probed");
        if players.len() >= MIN_PLAYERS {
            debug!(layout = layout.name, players = players.len(), "player table resolved");
            return Ok(PlayerTable {
                layout: layout.name,
                players,
            });
        }
    }

    Err(ParserError::PlayerTableUnresolved {
        layouts_tried: SLOT_LAYOUTS.len(),
    })
}

fn read_layout(
    buffer: &[u8],
    base: usize,
    layout: &SlotLayout,
    colors: &[Option<&'static str>; MAX_PLAYERS],
) -> Vec<PlayerRecord> {
    let mut players: Vec<PlayerRecord> = Vec::new();

    for index in 0..MAX_PLAYERS {
        let start = base + layout.base + index * layout.stride;
        let Some(record) = read_slot(buffer, start, index, colors) else {
            continue;
        };
        let duplicate = players
            .iter()
            .any(|p| p.name == record.name || p.player_id == record.player_id);
        if duplicate {
            trace!(slot = index, name = %record.name, "duplicate slot ignored");
            continue;
        }
        players.push(record);
    }

    players
}

#[allow(clippy::cast_possible_truncation)]
fn read_slot(
    buffer: &[u8],
    start: usize,
    index: usize,
    colors: &[Option<&'static str>; MAX_PLAYERS],
) -> Option<PlayerRecord> {
    let byte_at = |offset: usize| buffer.get(start + offset).copied();

    let slot_type = SlotType::from_u8(byte_at(SLOT_TYPE)?)?;
    let player_id = byte_at(SLOT_PLAYER_ID)?;
    if usize::from(player_id) >= MAX_PLAYERS {
        return None;
    }

    let name_field = ByteCursor::at(buffer, start + SLOT_NAME)
        .and_then(|mut c| c.read_fixed_field(SLOT_NAME_LEN))
        .ok()?;
    let (name, charset) = decode_name(name_field)?;

    Some(PlayerRecord {
        slot: index as u8,
        player_id,
        name: name.trim().to_string(),
        charset,
        race: Race::from_u8(byte_at(SLOT_RACE)?),
        team: byte_at(SLOT_TEAM)?,
        color: colors[index],
        slot_type,
    })
}

fn read_colors(buffer: &[u8], base: usize) -> [Option<&'static str>; MAX_PLAYERS] {
    let mut colors = [None; MAX_PLAYERS];
    if let Ok(mut cursor) = ByteCursor::at(buffer, base + offsets::COLORS) {
        for color in &mut colors {
            match cursor.read_u32_le() {
                Ok(value) => *color = color_name(value),
                Err(_) => break,
            }
        }
    }
    colors
}
