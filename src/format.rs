//! Format and compression detection.
//!
//! Replays come as either a plain working buffer that starts with a replay
//! magic, or as a zlib stream hidden behind a revision-specific prefix. The
//! detector first checks for a magic at offset 0; failing that, it inflates
//! each offset in [`INFLATE_CANDIDATE_OFFSETS`] and scores the output with
//! [`plausibility`]. The best candidate at or above [`ACCEPT_SCORE`] wins
//! (ties go to the earlier offset). If nothing qualifies, the raw buffer is
//! used unchanged and the descriptor says so.
//!
//! # Working buffer layout
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0x000 | 4 | Replay magic: `reRS` (legacy) or `seRS` (modern) |
//! | 0x004 | 633 | Header section (see [`offsets`]) |
//! | 0x27D | 4 | Command section length |
//! | 0x281 | 4 | Command section checksum (modern only) |
//! | ... | var | Command stream |
//!
//! # Example
//!
//! ```
//! use bw_replay::format::{detect, Compression, EngineRevision};
//!
//! let mut data = b"reRS".to_vec();
//! data.resize(700, 0);
//! let detection = detect(&data, 1 << 20);
//! assert_eq!(detection.descriptor.compression, Compression::None);
//! assert_eq!(detection.descriptor.revision, EngineRevision::Legacy);
//! assert_eq!(detection.descriptor.section_offset, 4);
//! ```

use std::borrow::Cow;

use serde::Serialize;
use tracing::{debug, trace};

use crate::binary::ByteCursor;
use crate::decompress::inflate_at;
use crate::text::is_plausible_map_name;

/// Magic for legacy-revision replays.
pub const LEGACY_MAGIC: &[u8; 4] = b"reRS";

/// Magic for modern-revision replays.
pub const MODERN_MAGIC: &[u8; 4] = b"seRS";

/// Conventional offset of the header section in a working buffer.
pub const SECTION_BASE: usize = 4;

/// Size of the header section in bytes.
pub const HEADER_SECTION_LEN: usize = 0x279;

/// Milliseconds per frame at the native (fastest) game speed.
pub const MS_PER_FRAME: u64 = 42;

/// Native tick rate in frames per second.
pub const FRAMES_PER_SECOND: f64 = 1000.0 / 42.0;

/// Shortest plausible game: 10 seconds.
pub const MIN_PLAUSIBLE_FRAMES: u32 = 239;

/// Longest plausible game: 3 hours.
pub const MAX_PLAUSIBLE_FRAMES: u32 = 257_142;

/// Offsets probed for a compressed stream, in order.
pub const INFLATE_CANDIDATE_OFFSETS: &[usize] = &[0, 4, 8, 12, 16, 28, 32];

/// Minimum plausibility score for an inflated candidate to be accepted.
pub const ACCEPT_SCORE: u32 = 4;

/// Field offsets inside the header section, relative to the section base.
pub mod offsets {
    /// Engine byte (0 = original, 1 = expansion).
    pub const ENGINE: usize = 0x00;
    /// Frame count, u32.
    pub const FRAME_COUNT: usize = 0x01;
    /// Save timestamp, u32 unix seconds.
    pub const SAVE_TIME: usize = 0x08;
    /// Game title, 28 bytes.
    pub const TITLE: usize = 0x18;
    /// Game title field length.
    pub const TITLE_LEN: usize = 28;
    /// Map width in tiles, u16.
    pub const MAP_WIDTH: usize = 0x34;
    /// Map height in tiles, u16.
    pub const MAP_HEIGHT: usize = 0x36;
    /// Game speed, u8.
    pub const GAME_SPEED: usize = 0x3A;
    /// Game type, u16.
    pub const GAME_TYPE: usize = 0x3C;
    /// Host name, 24 bytes.
    pub const HOST_NAME: usize = 0x48;
    /// Host name field length.
    pub const HOST_NAME_LEN: usize = 24;
    /// Map name, 26 bytes.
    pub const MAP_NAME: usize = 0x61;
    /// Map name field length.
    pub const MAP_NAME_LEN: usize = 26;
    /// Player slot table, 12 slots of 36 bytes.
    pub const PLAYER_SLOTS: usize = 0xA1;
    /// Colour table, 8 u32 entries.
    pub const COLORS: usize = 0x251;
}

/// How the working buffer was obtained from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Compression {
    /// The input is the working buffer.
    None,
    /// The working buffer was inflated from a zlib stream.
    Inflate {
        /// Offset of the zlib stream in the input.
        offset: usize,
    },
}

/// The engine revision a replay was written by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineRevision {
    /// `reRS` replays.
    Legacy,
    /// `seRS` replays, with a checksum ahead of the command stream.
    Modern,
    /// No magic recognised.
    Unknown,
}

impl EngineRevision {
    /// Identifies a revision from the four bytes at the start of a buffer.
    #[must_use]
    pub fn from_magic(bytes: &[u8]) -> Self {
        match bytes.get(..4) {
            Some(m) if m == LEGACY_MAGIC => EngineRevision::Legacy,
            Some(m) if m == MODERN_MAGIC => EngineRevision::Modern,
            _ => EngineRevision::Unknown,
        }
    }

    /// Returns the offset of the command section length field for a header
    /// section starting at `base`.
    #[must_use]
    pub const fn command_length_offset(self, base: usize) -> usize {
        base + HEADER_SECTION_LEN
    }

    /// Returns where this revision's command stream begins, or `None` when
    /// the revision is unknown.
    #[must_use]
    pub const fn command_offset(self, base: usize) -> Option<usize> {
        match self {
            EngineRevision::Legacy => Some(base + HEADER_SECTION_LEN + 4),
            EngineRevision::Modern => Some(base + HEADER_SECTION_LEN + 8),
            EngineRevision::Unknown => None,
        }
    }
}

/// What the detector decided about a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatDescriptor {
    /// Compression applied to the input.
    pub compression: Compression,
    /// Detected engine revision.
    pub revision: EngineRevision,
    /// Offset of the header section in the working buffer.
    pub section_offset: usize,
    /// Plausibility score of the working buffer.
    pub score: u32,
}

impl FormatDescriptor {
    /// Returns whether the detector recognised either a magic or a
    /// compressed stream.
    #[must_use]
    pub fn is_recognized(&self) -> bool {
        self.compression != Compression::None || self.revision != EngineRevision::Unknown
    }
}

/// The detector's output: descriptor plus the buffer every later stage reads.
#[derive(Debug, Clone)]
pub struct Detection<'a> {
    /// What was detected.
    pub descriptor: FormatDescriptor,
    /// The working buffer (borrowed input, or an owned inflated copy).
    pub buffer: Cow<'a, [u8]>,
}

/// Converts a frame count to milliseconds at the native tick rate.
#[must_use]
pub const fn frames_to_ms(frames: u32) -> u64 {
    frames as u64 * MS_PER_FRAME
}

/// Formats a frame number as `minutes:seconds`.
///
/// ```
/// use bw_replay::format::format_game_time;
///
/// assert_eq!(format_game_time(0), "0:00");
/// assert_eq!(format_game_time(1429), "1:00");
/// assert_eq!(format_game_time(24), "0:01");
/// ```
#[must_use]
pub fn format_game_time(frame: u32) -> String {
    let total_seconds = frames_to_ms(frame) / 1000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Returns whether a frame count converts to a duration between 10 seconds
/// and 3 hours.
#[must_use]
pub const fn is_plausible_frame_count(frames: u32) -> bool {
    frames >= MIN_PLAUSIBLE_FRAMES && frames <= MAX_PLAUSIBLE_FRAMES
}

/// Scores how much a buffer looks like a working buffer.
///
/// - 4 points for a known magic at offset 0
/// - 2 points for a plausible frame count at the conventional offset
/// - 2 points for a plausible map name at the conventional offset
#[must_use]
pub fn plausibility(buffer: &[u8]) -> u32 {
    let mut score = 0;

    if EngineRevision::from_magic(buffer) != EngineRevision::Unknown {
        score += 4;
    }

    if let Ok(mut cursor) = ByteCursor::at(buffer, SECTION_BASE + offsets::FRAME_COUNT) {
        if cursor.read_u32_le().is_ok_and(is_plausible_frame_count) {
            score += 2;
        }
    }

    if let Ok(mut cursor) = ByteCursor::at(buffer, SECTION_BASE + offsets::MAP_NAME) {
        if let Ok(field) = cursor.read_fixed_field(offsets::MAP_NAME_LEN) {
            if crate::text::decode_with(field, is_plausible_map_name).is_some() {
                score += 2;
            }
        }
    }

    score
}

/// Detects compression and revision, and returns the working buffer.
///
/// This function is pure: identical input always yields identical output.
#[must_use]
pub fn detect(data: &[u8], max_inflated: usize) -> Detection<'_> {
    let revision = EngineRevision::from_magic(data);
    if revision != EngineRevision::Unknown {
        debug!(?revision, "replay magic found at offset 0");
        return Detection {
            descriptor: FormatDescriptor {
                compression: Compression::None,
                revision,
                section_offset: SECTION_BASE,
                score: plausibility(data),
            },
            buffer: Cow::Borrowed(data),
        };
    }

    let mut best: Option<(usize, u32, Vec<u8>)> = None;
    for &offset in INFLATE_CANDIDATE_OFFSETS {
        let inflated = match inflate_at(data, offset, max_inflated) {
            Ok(bytes) => bytes,
            Err(e) => {
                trace!(offset, error = %e, "inflate candidate rejected");
                continue;
            }
        };
        let score = plausibility(&inflated);
        trace!(offset, score, len = inflated.len(), "inflate candidate scored");
        let better = best.as_ref().map_or(true, |(_, s, _)| score > *s);
        if score >= ACCEPT_SCORE && better {
            best = Some((offset, score, inflated));
        }
    }

    if let Some((offset, score, inflated)) = best {
        let revision = EngineRevision::from_magic(&inflated);
        debug!(offset, score, ?revision, "using inflated working buffer");
        return Detection {
            descriptor: FormatDescriptor {
                compression: Compression::Inflate { offset },
                revision,
                section_offset: SECTION_BASE,
                score,
            },
            buffer: Cow::Owned(inflated),
        };
    }

    debug!("no magic and no plausible compressed candidate; using raw buffer");
    Detection {
        descriptor: FormatDescriptor {
            compression: Compression::None,
            revision: EngineRevision::Unknown,
            section_offset: SECTION_BASE,
            score: plausibility(data),
        },
        buffer: Cow::Borrowed(data),
    }
}
