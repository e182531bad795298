//! Command stream location strategies.
//!
//! Where the command stream starts is not always where the header says. The
//! orchestrator runs the decoder under each [`Strategy`] in [`STRATEGIES`]
//! order, cheapest first, and keeps the first decode that clears the
//! acceptance threshold:
//!
//! 1. **descriptor-anchored**: the fixed offset for the detected revision,
//!    bounded by the declared section length when it is plausible.
//! 2. **signature-anchored**: just past a known marker such as `CMDS`.
//! 3. **heuristic-scan**: probe offsets at a fixed stride, decode a short
//!    window at each, and take the first whose frames and players look
//!    consistent.
//!
//! A decode is accepted when it has at least `min_events` events and at
//! least `min_frame_ratio` of them are frame-consistent. How far above the
//! threshold it scored becomes its [`Reliability`]. When every strategy
//! fails, the result is [`ParserError::CommandStreamUnresolved`]; nothing is
//! invented in its place.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, trace};

use crate::binary::ByteCursor;
use crate::commands::{CommandDecoder, CommandEvent, DecodeOutcome, MAX_PLAYER_ID};
use crate::config::ParseOptions;
use crate::error::{ParserError, Result};
use crate::format::{FormatDescriptor, HEADER_SECTION_LEN};

/// Marker sequences some writers place before the command stream.
pub const SIGNATURE_MARKERS: &[&[u8; 4]] = &[b"CMDS", b"rCMD"];

/// Largest frame gap between consecutive events still considered consistent.
pub const MAX_FRAME_GAP: u32 = 4096;

/// Frames an event may run past the header frame count.
pub const FRAME_SLACK: u32 = 1024;

/// Events a heuristic probe window must contain.
pub const PROBE_MIN_EVENTS: usize = 4;

/// Most marker matches tried by the signature strategy.
const MAX_SIGNATURE_MATCHES: usize = 8;

/// A way of locating the command stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Fixed offset for the detected revision.
    DescriptorAnchored,
    /// Offset just past a known marker.
    SignatureAnchored,
    /// Bounded sliding-window probe.
    HeuristicScan,
}

/// Strategies in the order they are tried.
pub const STRATEGIES: &[Strategy] = &[
    Strategy::DescriptorAnchored,
    Strategy::SignatureAnchored,
    Strategy::HeuristicScan,
];

impl Strategy {
    /// Returns the stable tag reported on results.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Strategy::DescriptorAnchored => "descriptor-anchored",
            Strategy::SignatureAnchored => "signature-anchored",
            Strategy::HeuristicScan => "heuristic-scan",
        }
    }
}

/// Confidence in a command decode.
///
/// Variants are ordered from least to most confident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
    /// No command stream was resolved.
    None,
    /// Accepted, but close to the threshold or degraded.
    Low,
    /// Comfortably above the threshold.
    Medium,
    /// Far above the threshold with no truncation.
    High,
}

impl Reliability {
    fn downgrade(self) -> Self {
        match self {
            Reliability::High => Reliability::Medium,
            Reliability::Medium | Reliability::Low => Reliability::Low,
            Reliability::None => Reliability::None,
        }
    }
}

/// Everything a strategy needs to know about the parse so far.
#[derive(Debug, Clone, Copy)]
pub struct StreamContext<'a> {
    /// Working buffer.
    pub buffer: &'a [u8],
    /// Detector output.
    pub descriptor: &'a FormatDescriptor,
    /// Frame count from the header, if resolved.
    pub header_frames: Option<u32>,
    /// Ids of active players; empty when the player table is unresolved.
    pub active_players: &'a [u8],
}

impl StreamContext<'_> {
    fn is_known_player(&self, player: u8) -> bool {
        if self.active_players.is_empty() {
            player <= MAX_PLAYER_ID
        } else {
            self.active_players.contains(&player)
        }
    }
}

/// An accepted command decode.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Strategy that produced the decode.
    pub strategy: Strategy,
    /// First byte of the decoded range.
    pub start: usize,
    /// End of the decoded range.
    pub end: usize,
    /// Decoder output.
    pub outcome: DecodeOutcome,
    /// Share of frame-consistent events.
    pub frame_ratio: f64,
    /// Confidence grade.
    pub reliability: Reliability,
}

impl Resolution {
    /// Returns the decoded events.
    #[must_use]
    pub fn events(&self) -> &[CommandEvent] {
        &self.outcome.events
    }
}

/// Returns the share of events whose frame is consistent with the one
/// before it.
///
/// An event is consistent when its frame does not decrease, is at most
/// [`MAX_FRAME_GAP`] past the previous event (frame 0 for the first), and
/// does not run more than [`FRAME_SLACK`] past the header frame count.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn frame_consistency(events: &[CommandEvent], header_frames: Option<u32>) -> f64 {
    if events.is_empty() {
        return 0.0;
    }
    let limit = header_frames.map(|f| f.saturating_add(FRAME_SLACK));
    let mut previous = 0u32;
    let mut consistent = 0usize;
    for event in events {
        let ordered = event.frame >= previous && event.frame - previous <= MAX_FRAME_GAP;
        let bounded = limit.map_or(true, |l| event.frame <= l);
        if ordered && bounded {
            consistent += 1;
        }
        previous = event.frame;
    }
    consistent as f64 / events.len() as f64
}

/// Grades an accepted decode.
#[must_use]
pub fn grade(
    strategy: Strategy,
    outcome: &DecodeOutcome,
    frame_ratio: f64,
    descriptor: &FormatDescriptor,
    min_events: usize,
) -> Reliability {
    let events = outcome.events.len();
    let mut reliability = if frame_ratio >= 0.99 && events >= 4 * min_events {
        Reliability::High
    } else if frame_ratio >= 0.95 && events >= 2 * min_events {
        Reliability::Medium
    } else {
        Reliability::Low
    };
    if outcome.truncated {
        reliability = reliability.downgrade();
    }
    if strategy == Strategy::HeuristicScan {
        reliability = reliability.min(Reliability::Medium);
    }
    if !descriptor.is_recognized() {
        reliability = reliability.min(Reliability::Low);
    }
    reliability
}

/// Runs the strategies in order and returns the first accepted decode.
///
/// # Errors
///
/// Returns `ParserError::CommandStreamUnresolved` when no strategy clears
/// the acceptance threshold or the time budget runs out.
pub fn resolve(ctx: &StreamContext<'_>, options: &ParseOptions) -> Result<Resolution> {
    let deadline = options.time_budget().map(|budget| Instant::now() + budget);
    let mut rejected = Vec::new();

    for &strategy in STRATEGIES {
        match attempt(strategy, ctx, options, deadline)? {
            Some(resolution) => {
                debug!(
                    strategy = strategy.tag(),
                    start = resolution.start,
                    events = resolution.outcome.events.len(),
                    ratio = resolution.frame_ratio,
                    reliability = ?resolution.reliability,
                    "command stream resolved"
                );
                return Ok(resolution);
            }
            None => rejected.push(strategy.tag()),
        }
    }

    Err(ParserError::CommandStreamUnresolved {
        reason: format!("rejected by {}", rejected.join(", ")),
    })
}

fn attempt(
    strategy: Strategy,
    ctx: &StreamContext<'_>,
    options: &ParseOptions,
    deadline: Option<Instant>,
) -> Result<Option<Resolution>> {
    check_deadline(deadline)?;
    let end = ctx.buffer.len();
    match strategy {
        Strategy::DescriptorAnchored => {
            let Some((start, end)) = descriptor_range(ctx) else {
                trace!("no fixed command offset for this revision");
                return Ok(None);
            };
            Ok(accept(strategy, ctx, options, start, end))
        }
        Strategy::SignatureAnchored => {
            for start in signature_offsets(ctx) {
                check_deadline(deadline)?;
                if let Some(resolution) = accept(strategy, ctx, options, start, end) {
                    return Ok(Some(resolution));
                }
            }
            Ok(None)
        }
        Strategy::HeuristicScan => {
            let base = ctx.descriptor.section_offset;
            let first = if base + HEADER_SECTION_LEN < end {
                base + HEADER_SECTION_LEN
            } else {
                base
            };
            let probes = (first..end)
                .step_by(options.heuristic_stride.max(1))
                .take(options.heuristic_max_probes);
            for start in probes {
                check_deadline(deadline)?;
                if !probe(ctx, options, start) {
                    continue;
                }
                trace!(start, "heuristic probe passed");
                if let Some(resolution) = accept(strategy, ctx, options, start, end) {
                    return Ok(Some(resolution));
                }
            }
            Ok(None)
        }
    }
}

fn check_deadline(deadline: Option<Instant>) -> Result<()> {
    match deadline {
        Some(d) if Instant::now() >= d => Err(ParserError::CommandStreamUnresolved {
            reason: "time budget exhausted".to_string(),
        }),
        _ => Ok(()),
    }
}

/// Decodes `start..end` and applies the acceptance threshold.
fn accept(
    strategy: Strategy,
    ctx: &StreamContext<'_>,
    options: &ParseOptions,
    start: usize,
    end: usize,
) -> Option<Resolution> {
    let outcome =
        CommandDecoder::new(ctx.buffer, start, end, options.max_consecutive_failures).decode_all();
    let frame_ratio = frame_consistency(&outcome.events, ctx.header_frames);
    trace!(
        strategy = strategy.tag(),
        start,
        events = outcome.events.len(),
        ratio = frame_ratio,
        truncated = outcome.truncated,
        "decode attempt"
    );
    if outcome.events.len() < options.min_events || frame_ratio < options.min_frame_ratio {
        return None;
    }
    let reliability = grade(
        strategy,
        &outcome,
        frame_ratio,
        ctx.descriptor,
        options.min_events,
    );
    Some(Resolution {
        strategy,
        start,
        end,
        outcome,
        frame_ratio,
        reliability,
    })
}

/// Returns the revision's fixed command range.
///
/// The declared section length bounds the range when it fits the buffer.
fn descriptor_range(ctx: &StreamContext<'_>) -> Option<(usize, usize)> {
    let base = ctx.descriptor.section_offset;
    let revision = ctx.descriptor.revision;
    let start = revision.command_offset(base)?;
    let declared = ByteCursor::at(ctx.buffer, revision.command_length_offset(base))
        .and_then(|mut c| c.read_u32_le())
        .ok()
        .and_then(|len| usize::try_from(len).ok());
    let end = match declared {
        Some(len) if len > 0 && start.saturating_add(len) <= ctx.buffer.len() => start + len,
        _ => ctx.buffer.len(),
    };
    Some((start, end))
}

/// Returns the offsets just past each marker match, in buffer order.
fn signature_offsets(ctx: &StreamContext<'_>) -> Vec<usize> {
    let from = ctx.descriptor.section_offset.min(ctx.buffer.len());
    let mut offsets: Vec<usize> = ctx.buffer[from..]
        .windows(4)
        .enumerate()
        .filter(|(_, window)| SIGNATURE_MARKERS.iter().any(|m| *window == m.as_slice()))
        .map(|(i, _)| from + i + 4)
        .take(MAX_SIGNATURE_MATCHES)
        .collect();
    offsets.sort_unstable();
    offsets
}

/// Decodes a short window and checks that it looks like a command stream.
#[allow(clippy::cast_precision_loss)]
fn probe(ctx: &StreamContext<'_>, options: &ParseOptions, start: usize) -> bool {
    let end = start.saturating_add(options.probe_window);
    let events: Vec<CommandEvent> =
        CommandDecoder::new(ctx.buffer, start, end, options.max_consecutive_failures).collect();
    if events.len() < PROBE_MIN_EVENTS {
        return false;
    }
    let ordered = events
        .windows(2)
        .filter(|pair| pair[1].frame >= pair[0].frame && pair[1].frame - pair[0].frame <= MAX_FRAME_GAP)
        .count();
    let ratio = ordered as f64 / (events.len() - 1) as f64;
    ratio >= 0.9 && events.iter().all(|e| ctx.is_known_player(e.player))
}
