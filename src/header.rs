//! Header section parsing.
//!
//! The header section sits at the descriptor's section offset in the working
//! buffer and carries the match metadata. Every field is read independently
//! and is `None` when it cannot be resolved; [`Header::parse`] never fails.
//!
//! # Format
//!
//! Offsets are relative to the section base (see [`crate::format::offsets`]).
//!
//! | Offset | Size | Type | Field |
//! |--------|------|------|-------|
//! | 0x00 | 1 | u8 | Engine (0 = original, 1 = expansion) |
//! | 0x01 | 4 | u32 LE | Frame count |
//! | 0x08 | 4 | u32 LE | Save timestamp (unix seconds) |
//! | 0x18 | 28 | string | Game title |
//! | 0x34 | 2 | u16 LE | Map width (tiles) |
//! | 0x36 | 2 | u16 LE | Map height (tiles) |
//! | 0x3A | 1 | u8 | Game speed |
//! | 0x3C | 2 | u16 LE | Game type |
//! | 0x48 | 24 | string | Host name |
//! | 0x61 | 26 | string | Map name |
//!
//! # Example
//!
//! ```
//! use bw_replay::format::detect;
//! use bw_replay::header::Header;
//!
//! let mut data = b"reRS".to_vec();
//! data.resize(0x281, 0);
//! data[5..9].copy_from_slice(&1429u32.to_le_bytes());
//! data[4 + 0x61..4 + 0x61 + 11].copy_from_slice(b"Lost Temple");
//!
//! let detection = detect(&data, 1 << 20);
//! let header = Header::parse(&detection.buffer, &detection.descriptor);
//! assert_eq!(header.map_name.as_deref(), Some("Lost Temple"));
//! assert_eq!(header.duration.as_deref(), Some("1:00"));
//! ```

use serde::Serialize;
use tracing::{debug, trace};

use crate::binary::ByteCursor;
use crate::format::{
    format_game_time, frames_to_ms, is_plausible_frame_count, offsets, FormatDescriptor,
};
use crate::text::{decode_name, decode_with, is_plausible_map_name, printable_ratio};

/// Offsets tried for the frame count when the primary field is implausible.
pub const ALTERNATE_FRAME_COUNT_OFFSETS: &[usize] = &[0x00, 0x03, 0x04, 0x0C];

/// Start of the window searched for a map name, relative to the section base.
pub const MAP_NAME_SEARCH_START: usize = 0x60;

/// End (exclusive) of the map name search window.
pub const MAP_NAME_SEARCH_END: usize = 0xB1;

/// Earliest accepted save timestamp (mid-1998).
const MIN_SAVE_TIME: u32 = 900_000_000;

/// Which game engine wrote the replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Engine {
    /// The original game.
    Original,
    /// The expansion.
    Expansion,
}

impl Engine {
    /// Decodes the engine byte.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Engine::Original),
            1 => Some(Engine::Expansion),
            _ => None,
        }
    }
}

/// Game speed setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameSpeed {
    /// Speed 0.
    Slowest,
    /// Speed 1.
    Slower,
    /// Speed 2.
    Slow,
    /// Speed 3.
    Normal,
    /// Speed 4.
    Fast,
    /// Speed 5.
    Faster,
    /// Speed 6, the native tick rate.
    Fastest,
}

impl GameSpeed {
    /// Decodes the speed byte.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(GameSpeed::Slowest),
            1 => Some(GameSpeed::Slower),
            2 => Some(GameSpeed::Slow),
            3 => Some(GameSpeed::Normal),
            4 => Some(GameSpeed::Fast),
            5 => Some(GameSpeed::Faster),
            6 => Some(GameSpeed::Fastest),
            _ => None,
        }
    }
}

/// Game type setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum GameType {
    Melee,
    FreeForAll,
    OneOnOne,
    CaptureTheFlag,
    Greed,
    Slaughter,
    SuddenDeath,
    Ladder,
    UseMapSettings,
    TeamMelee,
    TeamFreeForAll,
    TeamCaptureTheFlag,
    TopVsBottom,
}

impl GameType {
    /// Decodes the game type field.
    #[must_use]
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x02 => Some(GameType::Melee),
            0x03 => Some(GameType::FreeForAll),
            0x04 => Some(GameType::OneOnOne),
            0x05 => Some(GameType::CaptureTheFlag),
            0x06 => Some(GameType::Greed),
            0x07 => Some(GameType::Slaughter),
            0x08 => Some(GameType::SuddenDeath),
            0x09 => Some(GameType::Ladder),
            0x0A => Some(GameType::UseMapSettings),
            0x0B => Some(GameType::TeamMelee),
            0x0C => Some(GameType::TeamFreeForAll),
            0x0D => Some(GameType::TeamCaptureTheFlag),
            0x0F => Some(GameType::TopVsBottom),
            _ => None,
        }
    }
}

/// Match metadata decoded from the header section.
///
/// A `None` field is unknown; nothing here is ever filled with a default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Engine that wrote the replay.
    pub engine: Option<Engine>,
    /// Game length in frames.
    pub frame_count: Option<u32>,
    /// Game length in milliseconds.
    pub duration_ms: Option<u64>,
    /// Game length as `m:ss`.
    pub duration: Option<String>,
    /// Save timestamp in unix seconds.
    pub save_time: Option<u32>,
    /// Lobby title.
    pub title: Option<String>,
    /// Name of the hosting player.
    pub host_name: Option<String>,
    /// Map name.
    pub map_name: Option<String>,
    /// Map width in tiles.
    pub map_width: Option<u16>,
    /// Map height in tiles.
    pub map_height: Option<u16>,
    /// Game speed.
    pub game_speed: Option<GameSpeed>,
    /// Game type.
    pub game_type: Option<GameType>,
}

impl Header {
    /// Parses the header section of a working buffer.
    ///
    /// Fields that are out of bounds or implausible are left as `None`.
    #[must_use]
    pub fn parse(buffer: &[u8], descriptor: &FormatDescriptor) -> Self {
        let base = descriptor.section_offset;
        let field = |offset: usize| ByteCursor::at(buffer, base + offset).ok();

        let frame_count = read_frame_count(buffer, base);
        let map_name = read_map_name(buffer, base);

        let header = Header {
            engine: field(offsets::ENGINE)
                .and_then(|mut c| c.read_u8().ok())
                .and_then(Engine::from_u8),
            frame_count,
            duration_ms: frame_count.map(frames_to_ms),
            duration: frame_count.map(format_game_time),
            save_time: field(offsets::SAVE_TIME)
                .and_then(|mut c| c.read_u32_le().ok())
                .filter(|&t| t >= MIN_SAVE_TIME),
            title: field(offsets::TITLE)
                .and_then(|mut c| c.read_fixed_field(offsets::TITLE_LEN).ok())
                .and_then(|bytes| decode_with(bytes, is_printable_text))
                .map(|(s, _)| s),
            host_name: field(offsets::HOST_NAME)
                .and_then(|mut c| c.read_fixed_field(offsets::HOST_NAME_LEN).ok())
                .and_then(decode_name)
                .map(|(s, _)| s),
            map_name,
            map_width: field(offsets::MAP_WIDTH)
                .and_then(|mut c| c.read_u16_le().ok())
                .filter(is_plausible_map_dimension),
            map_height: field(offsets::MAP_HEIGHT)
                .and_then(|mut c| c.read_u16_le().ok())
                .filter(is_plausible_map_dimension),
            game_speed: field(offsets::GAME_SPEED)
                .and_then(|mut c| c.read_u8().ok())
                .and_then(GameSpeed::from_u8),
            game_type: field(offsets::GAME_TYPE)
                .and_then(|mut c| c.read_u16_le().ok())
                .and_then(GameType::from_u16),
        };

        debug!(
            frames = ?header.frame_count,
            map = ?header.map_name,
            unresolved = header.unresolved_fields().len(),
            "header parsed"
        );
        header
    }

    /// Returns the names of the fields that could not be resolved.
    #[must_use]
    pub fn unresolved_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.engine.is_none() {
            fields.push("engine");
        }
        if self.frame_count.is_none() {
            fields.push("frame_count");
        }
        if self.save_time.is_none() {
            fields.push("save_time");
        }
        if self.title.is_none() {
            fields.push("title");
        }
        if self.host_name.is_none() {
            fields.push("host_name");
        }
        if self.map_name.is_none() {
            fields.push("map_name");
        }
        if self.map_width.is_none() {
            fields.push("map_width");
        }
        if self.map_height.is_none() {
            fields.push("map_height");
        }
        if self.game_speed.is_none() {
            fields.push("game_speed");
        }
        if self.game_type.is_none() {
            fields.push("game_type");
        }
        fields
    }
}

/// Reads the frame count, falling back to the alternate offsets.
fn read_frame_count(buffer: &[u8], base: usize) -> Option<u32> {
    std::iter::once(offsets::FRAME_COUNT)
        .chain(ALTERNATE_FRAME_COUNT_OFFSETS.iter().copied())
        .find_map(|offset| {
            let frames = ByteCursor::at(buffer, base + offset)
                .and_then(|mut c| c.read_u32_le())
                .ok()
                .filter(|&f| is_plausible_frame_count(f))?;
            if offset != offsets::FRAME_COUNT {
                trace!(offset, frames, "frame count found at alternate offset");
            }
            Some(frames)
        })
}

/// Reads the map name from its field, or searches the surrounding window.
fn read_map_name(buffer: &[u8], base: usize) -> Option<String> {
    let conventional = ByteCursor::at(buffer, base + offsets::MAP_NAME)
        .and_then(|mut c| c.read_fixed_field(offsets::MAP_NAME_LEN))
        .ok()
        .and_then(|bytes| decode_with(bytes, is_plausible_map_name));
    if let Some((name, _)) = conventional {
        return Some(name.trim().to_string());
    }

    let start = (base + MAP_NAME_SEARCH_START).min(buffer.len());
    let end = (base + MAP_NAME_SEARCH_END).min(buffer.len());
    let found = buffer[start..end]
        .split(|&b| b == 0)
        .filter(|run| run.len() >= 3)
        .find_map(|run| decode_with(run, is_plausible_map_name));
    if let Some((name, charset)) = &found {
        trace!(name = %name, ?charset, "map name found by window search");
    }
    found.map(|(name, _)| name.trim().to_string())
}

fn is_printable_text(s: &str) -> bool {
    !s.trim().is_empty() && printable_ratio(s) > 0.9
}

fn is_plausible_map_dimension(value: &u16) -> bool {
    (64..=256).contains(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{detect, SECTION_BASE};

    fn put(buf: &mut [u8], offset: usize, bytes: &[u8]) {
        let at = SECTION_BASE + offset;
        buf[at..at + bytes.len()].copy_from_slice(bytes);
    }

    fn create_test_header() -> Vec<u8> {
        let mut buf = b"reRS".to_vec();
        buf.resize(0x281, 0);
        put(&mut buf, offsets::ENGINE, &[1]);
        put(&mut buf, offsets::FRAME_COUNT, &14_286u32.to_le_bytes());
        put(&mut buf, offsets::SAVE_TIME, &1_100_000_000u32.to_le_bytes());
        put(&mut buf, offsets::TITLE, b"gg no re");
        put(&mut buf, offsets::MAP_WIDTH, &128u16.to_le_bytes());
        put(&mut buf, offsets::MAP_HEIGHT, &128u16.to_le_bytes());
        put(&mut buf, offsets::GAME_SPEED, &[6]);
        put(&mut buf, offsets::GAME_TYPE, &0x04u16.to_le_bytes());
        put(&mut buf, offsets::HOST_NAME, b"Boxer");
        put(&mut buf, offsets::MAP_NAME, b"Lost Temple");
        buf
    }

    fn parse(buf: &[u8]) -> Header {
        let detection = detect(buf, 1 << 20);
        Header::parse(&detection.buffer, &detection.descriptor)
    }

    #[test]
    fn test_parse_valid_header() {
        let header = parse(&create_test_header());
        assert_eq!(header.engine, Some(Engine::Expansion));
        assert_eq!(header.frame_count, Some(14_286));
        assert_eq!(header.duration_ms, Some(600_012));
        assert_eq!(header.duration.as_deref(), Some("10:00"));
        assert_eq!(header.save_time, Some(1_100_000_000));
        assert_eq!(header.title.as_deref(), Some("gg no re"));
        assert_eq!(header.host_name.as_deref(), Some("Boxer"));
        assert_eq!(header.map_name.as_deref(), Some("Lost Temple"));
        assert_eq!(header.map_width, Some(128));
        assert_eq!(header.map_height, Some(128));
        assert_eq!(header.game_speed, Some(GameSpeed::Fastest));
        assert_eq!(header.game_type, Some(GameType::OneOnOne));
        assert!(header.unresolved_fields().is_empty());
    }

    #[test]
    fn test_truncated_buffer_leaves_fields_unknown() {
        let buf = create_test_header();
        let header = parse(&buf[..SECTION_BASE + 0x20]);
        assert_eq!(header.frame_count, Some(14_286));
        assert_eq!(header.map_name, None);
        assert_eq!(header.game_type, None);
        let unresolved = header.unresolved_fields();
        assert!(unresolved.contains(&"map_name"));
        assert!(unresolved.contains(&"host_name"));
    }

    #[test]
    fn test_implausible_frame_count_uses_alternate() {
        let mut buf = create_test_header();
        put(&mut buf, offsets::FRAME_COUNT, &0u32.to_le_bytes());
        put(&mut buf, 0x0C, &5_000u32.to_le_bytes());
        let header = parse(&buf);
        assert_eq!(header.frame_count, Some(5_000));
    }

    #[test]
    fn test_no_plausible_frame_count() {
        let mut buf = create_test_header();
        put(&mut buf, offsets::ENGINE, &[0; 8]);
        let header = parse(&buf);
        assert_eq!(header.frame_count, None);
        assert_eq!(header.duration, None);
        assert!(header.unresolved_fields().contains(&"frame_count"));
    }

    #[test]
    fn test_map_name_window_search() {
        let mut buf = create_test_header();
        put(&mut buf, offsets::MAP_NAME, &[0; 26]);
        put(&mut buf, 0x80, b"Python");
        let header = parse(&buf);
        assert_eq!(header.map_name.as_deref(), Some("Python"));
    }

    #[test]
    fn test_denylisted_map_name_rejected() {
        let mut buf = create_test_header();
        put(&mut buf, offsets::MAP_NAME, &[0; 26]);
        put(&mut buf, offsets::MAP_NAME, b"Brood War");
        let header = parse(&buf);
        assert_eq!(header.map_name, None);
    }

    #[test]
    fn test_out_of_range_enums() {
        let mut buf = create_test_header();
        put(&mut buf, offsets::ENGINE, &[7]);
        put(&mut buf, offsets::GAME_SPEED, &[9]);
        put(&mut buf, offsets::GAME_TYPE, &0x99u16.to_le_bytes());
        put(&mut buf, offsets::MAP_WIDTH, &4096u16.to_le_bytes());
        let header = parse(&buf);
        assert_eq!(header.engine, None);
        assert_eq!(header.game_speed, None);
        assert_eq!(header.game_type, None);
        assert_eq!(header.map_width, None);
        assert_eq!(header.map_height, Some(128));
    }

    #[test]
    fn test_garbage_buffer_never_panics() {
        let header = parse(&[0xFF; 10_000]);
        assert_eq!(header.map_name, None);
        assert_eq!(header.frame_count, None);
    }
}
