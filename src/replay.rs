//! The full decode pipeline.
//!
//! [`ReplayParser`] is a caller-owned handle holding validated options.
//! Create it once and call [`ReplayParser::parse`] for each replay; parses
//! share no mutable state, so one handle can serve several threads.
//!
//! Stages run in order and each failure is captured on the result instead
//! of discarding earlier output:
//!
//! | Stage | Failure | Effect |
//! |-------|---------|--------|
//! | input check | `BufferEmptyOrTooLarge` | parse aborted |
//! | detection | `FormatUnrecognized` | raw buffer used, reliability capped |
//! | header | `HeaderFieldUnresolved` | field left `null` |
//! | players | `PlayerTableUnresolved` | no players, metrics or build orders |
//! | commands | `CommandStreamUnresolved` | no metrics or build orders |
//! | commands | `CommandStreamTruncated` | partial decode, reliability lowered |

use serde::Serialize;
use tracing::{debug, warn};

use crate::build_order::{self, PlayerBuildOrder};
use crate::commands::CommandEvent;
use crate::config::ParseOptions;
use crate::error::{Issue, ParserError, Result};
use crate::format::{detect, FormatDescriptor};
use crate::header::Header;
use crate::metrics::{self, PlayerMetrics};
use crate::players::{parse_players, PlayerRecord};
use crate::strategy::{resolve, Reliability, StreamContext};

/// Strategy tag reported when no strategy resolved the command stream.
pub const UNRESOLVED: &str = "unresolved";

/// Everything decoded from one replay.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// Detector output.
    pub descriptor: FormatDescriptor,
    /// Header fields, `null` when unresolved.
    pub header: Header,
    /// Slot layout that resolved the player table.
    pub player_layout: Option<&'static str>,
    /// Active players in slot order.
    pub players: Vec<PlayerRecord>,
    /// Per-player action rates; absent when commands or players are
    /// unresolved.
    pub metrics: Option<Vec<PlayerMetrics>>,
    /// Per-player build orders.
    pub build_orders: Vec<PlayerBuildOrder>,
    /// Confidence in the command decode.
    pub reliability: Reliability,
    /// Tag of the strategy that resolved the command stream.
    pub strategy: &'static str,
    /// Working buffer offset where the command stream was decoded from.
    pub command_offset: Option<usize>,
    /// Number of decoded command events.
    pub event_count: usize,
    /// Non-fatal failures, in stage order.
    pub issues: Vec<Issue>,
    /// Decoded command events.
    #[serde(skip)]
    pub events: Vec<CommandEvent>,
}

impl ExtractionResult {
    /// Returns whether the command stream was resolved.
    #[must_use]
    pub fn commands_resolved(&self) -> bool {
        self.reliability != Reliability::None
    }
}

/// A reusable replay parser.
///
/// # Example
///
/// ```
/// use bw_replay::{ParseOptions, ReplayParser};
///
/// let parser = ReplayParser::new(ParseOptions::default()).unwrap();
/// let result = parser.parse(&[0xFF; 10_000]).unwrap();
/// assert_eq!(result.strategy, "unresolved");
/// assert!(result.metrics.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReplayParser {
    options: ParseOptions,
}

impl ReplayParser {
    /// Creates a parser with validated options.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the options fail validation.
    pub fn new(options: ParseOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    /// Returns the options this parser was built with.
    #[must_use]
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Decodes a complete replay file held in memory.
    ///
    /// # Errors
    ///
    /// Returns `BufferEmptyOrTooLarge` if `data` is empty or larger than
    /// `max_buffer_size`. Every other failure is recorded in
    /// [`ExtractionResult::issues`].
    pub fn parse(&self, data: &[u8]) -> Result<ExtractionResult> {
        let max = self.options.max_buffer_size;
        if data.is_empty() || data.len() > max {
            return Err(ParserError::BufferEmptyOrTooLarge {
                size: data.len(),
                max,
            });
        }

        let mut issues = Vec::new();
        let detection = detect(data, max);
        let descriptor = detection.descriptor;
        let buffer: &[u8] = &detection.buffer;
        if !descriptor.is_recognized() {
            let err = ParserError::FormatUnrecognized {
                reason: format!(
                    "no replay magic and no inflatable candidate (score {})",
                    descriptor.score
                ),
            };
            warn!(error = %err, "continuing with raw buffer");
            issues.push(Issue::from(&err));
        }

        let header = Header::parse(buffer, &descriptor);
        for field in header.unresolved_fields() {
            issues.push(Issue::from(&ParserError::HeaderFieldUnresolved { field }));
        }

        let table = match parse_players(buffer, &descriptor) {
            Ok(table) => Some(table),
            Err(err) => {
                warn!(error = %err, "player table unresolved");
                issues.push(Issue::from(&err));
                None
            }
        };
        let active = table.as_ref().map(|t| t.ids()).unwrap_or_default();

        let ctx = StreamContext {
            buffer,
            descriptor: &descriptor,
            header_frames: header.frame_count,
            active_players: &active,
        };
        let resolution = match resolve(&ctx, &self.options) {
            Ok(resolution) => Some(resolution),
            Err(err) => {
                warn!(error = %err, "command stream unresolved");
                issues.push(Issue::from(&err));
                None
            }
        };

        let (players, player_layout) = match table {
            Some(table) => (table.players, Some(table.layout)),
            None => (Vec::new(), None),
        };

        let Some(resolution) = resolution else {
            return Ok(ExtractionResult {
                descriptor,
                header,
                player_layout,
                players,
                metrics: None,
                build_orders: Vec::new(),
                reliability: Reliability::None,
                strategy: UNRESOLVED,
                command_offset: None,
                event_count: 0,
                issues,
                events: Vec::new(),
            });
        };

        if resolution.outcome.truncated {
            let err = ParserError::CommandStreamTruncated {
                events: resolution.outcome.events.len(),
                offset: resolution.outcome.end_offset,
            };
            warn!(error = %err, "partial command decode");
            issues.push(Issue::from(&err));
        }

        let events = resolution.outcome.events;
        let (metrics, build_orders) = if player_layout.is_some() {
            (
                Some(metrics::compute(
                    &events,
                    &active,
                    resolution.outcome.final_frame,
                )),
                build_order::reconstruct(&events, &players, self.options.max_build_order_len),
            )
        } else {
            (None, Vec::new())
        };

        debug!(
            strategy = resolution.strategy.tag(),
            events = events.len(),
            players = players.len(),
            issues = issues.len(),
            "replay parsed"
        );

        Ok(ExtractionResult {
            descriptor,
            header,
            player_layout,
            players,
            metrics,
            build_orders,
            reliability: resolution.reliability,
            strategy: resolution.strategy.tag(),
            command_offset: Some(resolution.start),
            event_count: events.len(),
            issues,
            events,
        })
    }
}

/// Parses a replay with default options.
///
/// # Errors
///
/// See [`ReplayParser::parse`].
pub fn parse(data: &[u8]) -> Result<ExtractionResult> {
    ReplayParser::default().parse(data)
}
