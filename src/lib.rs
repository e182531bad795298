//! # BW Replay
//!
//! A decoder for StarCraft: Brood War replay files (`.rep`).
//!
//! The format is undocumented and changed between engine revisions, so the
//! decoder combines fixed-offset parsing with detection heuristics and
//! falls back between several ways of locating the command stream. Anything
//! it cannot resolve is reported as unresolved; nothing is invented.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bw_replay::{ParseOptions, ReplayParser};
//!
//! fn summarize(data: &[u8]) -> bw_replay::Result<()> {
//!     let parser = ReplayParser::new(ParseOptions::default())?;
//!     let result = parser.parse(data)?;
//!
//!     println!("Map: {:?}", result.header.map_name);
//!     println!("Strategy: {} ({:?})", result.strategy, result.reliability);
//!     for player in &result.players {
//!         println!("  {} ({:?})", player.name, player.race);
//!     }
//!     if let Some(metrics) = &result.metrics {
//!         for m in metrics {
//!             println!("  player {}: {} APM / {} EAPM", m.player_id, m.apm, m.eapm);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`error`] - Error types, kinds and the result alias
//! - [`binary`] - Bounds-checked little-endian cursor
//! - [`text`] - Name and map-name decoding across charsets
//! - [`decompress`] - zlib inflation of candidate regions
//! - [`format`] - Format and compression detection
//! - [`header`] - Header section fields
//! - [`players`] - Player table layouts
//! - [`commands`] - Command stream decoder
//! - [`strategy`] - Command stream location strategies
//! - [`build_order`] - Build order reconstruction
//! - [`metrics`] - APM and EAPM
//! - [`config`] - Parse options
//! - [`replay`] - The full pipeline
//!
//! ## Pipeline
//!
//! ```text
//! input -> detect -> working buffer -> header
//!                                   -> players
//!                                   -> commands -> build orders, metrics
//!                                   -> ExtractionResult
//! ```
//!
//! All multi-byte integers are stored in little-endian byte order.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod binary;
pub mod build_order;
pub mod commands;
pub mod config;
pub mod decompress;
pub mod error;
pub mod format;
pub mod header;
pub mod metrics;
pub mod players;
pub mod replay;
pub mod strategy;
pub mod text;

// Re-export commonly used types at the crate root
pub use build_order::{BuildOrderEntry, PlayerBuildOrder};
pub use commands::{CommandDecoder, CommandEvent, CommandParams};
pub use config::ParseOptions;
pub use error::{ErrorKind, Issue, ParserError, Result};
pub use format::{detect, FormatDescriptor};
pub use header::Header;
pub use metrics::PlayerMetrics;
pub use players::{PlayerRecord, PlayerTable, Race};
pub use replay::{parse, ExtractionResult, ReplayParser};
pub use strategy::{Reliability, Strategy};
