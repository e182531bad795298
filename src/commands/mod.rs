//! Command stream decoding.
//!
//! The command section is a flat byte stream mixing frame-sync opcodes with
//! player commands:
//!
//! | Opcode | Payload | Meaning |
//! |--------|---------|---------|
//! | 0x00 | - | Advance one frame |
//! | 0x01 | u8 | Advance by delta |
//! | 0x02 | u16 LE | Advance by delta |
//! | other | player u8, payload | Command, see [`opcode::OPCODES`] |
//!
//! Sync opcodes only move the frame counter and are not emitted as events.
//!
//! # Example
//!
//! ```
//! use bw_replay::commands::{CommandDecoder, CommandParams};
//!
//! let stream = [0x01, 24, 0x0C, 0x00, 0x1E, 0x10, 0x00, 0x20, 0x00, 0x6D, 0x00];
//! let outcome = CommandDecoder::new(&stream, 0, stream.len(), 64).decode_all();
//!
//! assert_eq!(outcome.events.len(), 1);
//! assert_eq!(outcome.events[0].frame, 24);
//! assert!(matches!(outcome.events[0].params, CommandParams::Placement { unit: 109, .. }));
//! ```

mod decoder;
pub mod opcode;
mod types;

pub use decoder::{CommandDecoder, DecodeOutcome, DEFAULT_MAX_FAILURES, MAX_PLAYER_ID};
pub use opcode::{codes, is_substantive, lookup, opcode_name, HotkeyOperation, OpcodeInfo};
pub use types::{CommandEvent, CommandParams};
