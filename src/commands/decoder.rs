//! Command stream decoder.
//!
//! [`CommandDecoder`] walks a byte range as a small state machine:
//!
//! - `Scanning` reads the next opcode byte. Sync opcodes advance the frame
//!   counter in place; a known command opcode moves to `Decoding`.
//! - `Decoding` reads the player byte and the payload described by the
//!   opcode table, emits a [`CommandEvent`] and returns to `Scanning`.
//! - `Resyncing` is entered when a step fails validation (unknown opcode,
//!   payload past the end of the range, player out of range, or a payload
//!   field out of range). It steps one byte past the failed position and
//!   scans again.
//!
//! Consecutive failures are counted; once the budget is exceeded the
//! decoder stops and reports the events decoded so far as truncated. Sync
//! bytes met while resyncing still advance the frame counter but do not
//! refill the budget; only a decoded command does.

use tracing::trace;

use super::opcode::{
    codes, lookup, HotkeyOperation, OpcodeInfo, ParamKind, PayloadShape, MAX_SELECTION,
    MAX_UNIT_ID,
};
use super::types::{CommandEvent, CommandParams};
use crate::binary::ByteCursor;
use crate::error::Result;
use crate::text::{decode_with, printable_ratio};

/// Highest player id a command may carry.
pub const MAX_PLAYER_ID: u8 = 7;

/// Default consecutive-failure budget.
pub const DEFAULT_MAX_FAILURES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Scanning,
    Decoding(&'static OpcodeInfo),
    Resyncing,
}

/// Result of decoding a range to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOutcome {
    /// Decoded events in stream order.
    pub events: Vec<CommandEvent>,
    /// Whether decoding stopped on the failure budget.
    pub truncated: bool,
    /// Offset where decoding stopped.
    pub end_offset: usize,
    /// Total bytes skipped while resyncing.
    pub skipped_bytes: usize,
    /// Frame counter at the end of decoding.
    pub final_frame: u32,
}

/// Iterator over the command events of a byte range.
///
/// # Example
///
/// ```
/// use bw_replay::commands::CommandDecoder;
///
/// // sync +1, then player 0 trains unit 7
/// let stream = [0x00, 0x1F, 0x00, 0x07, 0x00];
/// let events: Vec<_> = CommandDecoder::new(&stream, 0, stream.len(), 64).collect();
/// assert_eq!(events.len(), 1);
/// assert_eq!(events[0].frame, 1);
/// assert_eq!(events[0].unit_id(), Some(7));
/// ```
#[derive(Debug, Clone)]
pub struct CommandDecoder<'a> {
    data: &'a [u8],
    offset: usize,
    end: usize,
    frame: u32,
    state: State,
    failures: usize,
    max_failures: usize,
    resyncing: bool,
    skipped: usize,
    truncated: bool,
    finished: bool,
}

impl<'a> CommandDecoder<'a> {
    /// Creates a decoder over `data[start..end]`.
    ///
    /// `end` is clamped to the buffer length.
    #[must_use]
    pub fn new(data: &'a [u8], start: usize, end: usize, max_failures: usize) -> Self {
        let end = end.min(data.len());
        Self {
            data,
            offset: start.min(end),
            end,
            frame: 0,
            state: State::Scanning,
            failures: 0,
            max_failures,
            resyncing: false,
            skipped: 0,
            truncated: false,
            finished: false,
        }
    }

    /// Returns the current offset.
    #[must_use]
    pub fn current_offset(&self) -> usize {
        self.offset
    }

    /// Returns the current virtual frame.
    #[must_use]
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Returns whether decoding stopped on the failure budget.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Decodes the whole range.
    #[must_use]
    pub fn decode_all(mut self) -> DecodeOutcome {
        let events: Vec<CommandEvent> = self.by_ref().collect();
        DecodeOutcome {
            events,
            truncated: self.truncated,
            end_offset: self.offset,
            skipped_bytes: self.skipped,
            final_frame: self.frame,
        }
    }

    fn range(&self) -> &'a [u8] {
        &self.data[..self.end]
    }

    /// Handles one `Scanning` step. Returns `false` at the end of the range.
    fn scan(&mut self) -> bool {
        let mut cursor = match ByteCursor::at(self.range(), self.offset) {
            Ok(cursor) if cursor.remaining() > 0 => cursor,
            _ => return false,
        };
        let Ok(opcode) = cursor.read_u8() else {
            return false;
        };

        let delta = match opcode {
            codes::SYNC => Some(Ok(1)),
            codes::SYNC_U8 => Some(cursor.read_u8().map(u32::from)),
            codes::SYNC_U16 => Some(cursor.read_u16_le().map(u32::from)),
            _ => None,
        };

        match delta {
            Some(Ok(delta)) => {
                self.frame = self.frame.saturating_add(delta);
                self.offset = cursor.position();
                if !self.resyncing {
                    self.failures = 0;
                }
            }
            Some(Err(_)) => self.state = State::Resyncing,
            None => {
                self.state = match lookup(opcode) {
                    Some(info) => State::Decoding(info),
                    None => State::Resyncing,
                };
            }
        }
        true
    }

    /// Handles one `Decoding` step.
    fn decode(&mut self, info: &'static OpcodeInfo) -> Option<CommandEvent> {
        let Ok(mut cursor) = ByteCursor::at(self.range(), self.offset + 1) else {
            self.state = State::Resyncing;
            return None;
        };
        match decode_command(&mut cursor, info) {
            Ok(Some((player, params, payload_len))) => {
                self.offset = cursor.position();
                self.failures = 0;
                self.resyncing = false;
                self.state = State::Scanning;
                Some(CommandEvent {
                    frame: self.frame,
                    player,
                    opcode: info.code,
                    params,
                    payload_len,
                })
            }
            Ok(None) | Err(_) => {
                self.state = State::Resyncing;
                None
            }
        }
    }

    /// Handles one `Resyncing` step.
    fn resync(&mut self) {
        self.failures += 1;
        if self.failures > self.max_failures {
            trace!(
                offset = self.offset,
                failures = self.failures,
                "failure budget exceeded"
            );
            self.truncated = true;
            self.finished = true;
            return;
        }
        self.resyncing = true;
        self.offset += 1;
        self.skipped += 1;
        self.state = State::Scanning;
    }
}

impl Iterator for CommandDecoder<'_> {
    type Item = CommandEvent;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            match self.state {
                State::Scanning => {
                    if !self.scan() {
                        self.finished = true;
                    }
                }
                State::Decoding(info) => {
                    if let Some(event) = self.decode(info) {
                        return Some(event);
                    }
                }
                State::Resyncing => self.resync(),
            }
        }
        None
    }
}

type Decoded = (u8, CommandParams, usize);

/// Reads the player byte and payload of a command.
///
/// Returns `Ok(None)` when a field fails validation and `Err` when the
/// payload runs past the end of the range.
fn decode_command(cursor: &mut ByteCursor<'_>, info: &OpcodeInfo) -> Result<Option<Decoded>> {
    let player = cursor.read_u8()?;
    if player > MAX_PLAYER_ID {
        return Ok(None);
    }

    let payload_len = match info.shape {
        PayloadShape::Fixed(n) => n,
        PayloadShape::Selection => {
            let mut peek = *cursor;
            let count = peek.read_u8()?;
            if count == 0 || count > MAX_SELECTION {
                return Ok(None);
            }
            1 + usize::from(count) * 2
        }
    };
    let payload = cursor.read_bytes(payload_len)?;
    let params = decode_params(payload, info.params)?;
    Ok(params.map(|p| (player, p, payload_len)))
}

fn decode_params(payload: &[u8], kind: ParamKind) -> Result<Option<CommandParams>> {
    let mut c = ByteCursor::new(payload);
    let params = match kind {
        ParamKind::None => CommandParams::None,
        ParamKind::Selection => {
            let count = c.read_u8()?;
            let units = (0..count)
                .map(|_| c.read_u16_le())
                .collect::<Result<Vec<_>>>()?;
            CommandParams::Selection { units }
        }
        ParamKind::Placement => {
            let order = c.read_u8()?;
            let x = c.read_u16_le()?;
            let y = c.read_u16_le()?;
            let unit = c.read_u16_le()?;
            if unit > MAX_UNIT_ID {
                return Ok(None);
            }
            CommandParams::Placement { order, x, y, unit }
        }
        ParamKind::Vision => CommandParams::Vision {
            mask: c.read_u16_le()?,
        },
        ParamKind::Hotkey => {
            let Some(operation) = HotkeyOperation::from_u8(c.read_u8()?) else {
                return Ok(None);
            };
            let group = c.read_u8()?;
            if group > 9 {
                return Ok(None);
            }
            CommandParams::Hotkey { operation, group }
        }
        ParamKind::Move | ParamKind::TargetedOrder => {
            let x = c.read_u16_le()?;
            let y = c.read_u16_le()?;
            let target = c.read_u16_le()?;
            let unit = c.read_u16_le()?;
            let order = if kind == ParamKind::TargetedOrder {
                Some(c.read_u8()?)
            } else {
                None
            };
            let queued = c.read_u8()? != 0;
            CommandParams::Target {
                x,
                y,
                target,
                unit,
                order,
                queued,
            }
        }
        ParamKind::Queued => CommandParams::Queued {
            queued: c.read_u8()? != 0,
        },
        ParamKind::UnitRef => {
            let unit = c.read_u16_le()?;
            if unit > MAX_UNIT_ID {
                return Ok(None);
            }
            CommandParams::UnitRef { unit }
        }
        ParamKind::Tag => CommandParams::Tag {
            tag: c.read_u16_le()?,
        },
        ParamKind::TechRef => CommandParams::TechRef { tech: c.read_u8()? },
        ParamKind::UpgradeRef => CommandParams::UpgradeRef {
            upgrade: c.read_u8()?,
        },
        ParamKind::Leave => CommandParams::Leave { reason: c.read_u8()? },
        // Fixed length, so the body is never grounds for a resync.
        ParamKind::Chat => {
            let field = c.read_fixed_field(payload.len())?;
            let message = decode_with(field, |s| printable_ratio(s) > 0.9).map_or_else(
                || String::from_utf8_lossy(field).into_owned(),
                |(text, _)| text,
            );
            CommandParams::Chat { message }
        }
    };
    Ok(Some(params))
}
