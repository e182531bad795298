//! Per-player action rates.
//!
//! APM counts every decoded command of a player; EAPM counts only the
//! substantive ones (see [`is_substantive`]). Both share the same
//! denominator, the decoded frame span converted to minutes, so
//! `apm >= eapm` always holds. A rate is `0` only for a zero count; a
//! nonzero count that rounds down is reported as `1`.

use serde::Serialize;

use crate::commands::{is_substantive, opcode_name, CommandEvent};
use crate::format::frames_to_ms;

/// Shortest span used as a denominator, in milliseconds.
const MIN_SPAN_MS: u64 = 1000;

/// Count of one opcode within a player's commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpcodeCount {
    /// Opcode name.
    pub name: &'static str,
    /// Number of commands.
    pub count: u32,
}

/// Action statistics for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerMetrics {
    /// Player id.
    pub player_id: u8,
    /// Actions per minute.
    pub apm: u32,
    /// Effective actions per minute.
    pub eapm: u32,
    /// Total commands.
    pub actions: u32,
    /// Substantive commands.
    pub effective_actions: u32,
    /// Commands per opcode, in opcode order.
    pub breakdown: Vec<OpcodeCount>,
}

/// Running command counts for a single player.
#[derive(Debug, Default, Clone)]
pub struct CommandStatistics {
    /// Total commands recorded.
    pub actions: u32,
    /// Substantive commands recorded.
    pub effective_actions: u32,
    counts: Vec<(u8, u32)>,
}

impl CommandStatistics {
    /// Creates empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one command.
    pub fn record(&mut self, event: &CommandEvent) {
        self.actions += 1;
        if is_substantive(event.opcode) {
            self.effective_actions += 1;
        }
        match self.counts.binary_search_by_key(&event.opcode, |&(code, _)| code) {
            Ok(index) => self.counts[index].1 += 1,
            Err(index) => self.counts.insert(index, (event.opcode, 1)),
        }
    }

    /// Converts the counts into rates over `span_frames`.
    #[must_use]
    pub fn finish(self, player_id: u8, span_frames: u32) -> PlayerMetrics {
        let minutes = frames_to_ms(span_frames).max(MIN_SPAN_MS) as f64 / 60_000.0;
        let rate = |count: u32| match count {
            0 => 0,
            n => ((f64::from(n) / minutes).round() as u32).max(1),
        };
        PlayerMetrics {
            player_id,
            apm: rate(self.actions),
            eapm: rate(self.effective_actions),
            actions: self.actions,
            effective_actions: self.effective_actions,
            breakdown: self
                .counts
                .into_iter()
                .map(|(code, count)| OpcodeCount {
                    name: opcode_name(code),
                    count,
                })
                .collect(),
        }
    }
}

/// Computes metrics for each id in `players`, in that order.
///
/// `span_frames` is the last frame the decoder reached. Events from other
/// ids are ignored, and a player with no events gets zero rates.
#[must_use]
pub fn compute(events: &[CommandEvent], players: &[u8], span_frames: u32) -> Vec<PlayerMetrics> {
    let mut stats: Vec<CommandStatistics> = vec![CommandStatistics::new(); players.len()];
    for event in events {
        if let Some(index) = players.iter().position(|&id| id == event.player) {
            stats[index].record(event);
        }
    }
    players
        .iter()
        .zip(stats)
        .map(|(&id, s)| s.finish(id, span_frames))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{codes, CommandParams};

    fn event(frame: u32, player: u8, opcode: u8) -> CommandEvent {
        let params = match opcode {
            codes::SELECT => CommandParams::Selection { units: vec![1] },
            codes::TRAIN => CommandParams::UnitRef { unit: 7 },
            _ => CommandParams::None,
        };
        CommandEvent {
            frame,
            player,
            opcode,
            params,
            payload_len: 0,
        }
    }

    #[test]
    fn test_apm_over_one_minute() {
        // 1429 frames * 42 ms is just over a minute
        let mut events = Vec::new();
        for i in 0..60 {
            let opcode = if i % 2 == 0 { codes::SELECT } else { codes::TRAIN };
            events.push(event(i * 20, 0, opcode));
        }
        let metrics = compute(&events, &[0, 1], 1429);
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].apm, 60);
        assert_eq!(metrics[0].eapm, 30);
        assert_eq!(metrics[0].actions, 60);
        assert_eq!(metrics[1].apm, 0);
        assert_eq!(metrics[1].eapm, 0);
        assert!(metrics[1].breakdown.is_empty());
    }

    #[test]
    fn test_breakdown_is_ordered_by_opcode() {
        let events = vec![
            event(10, 2, codes::TRAIN),
            event(20, 2, codes::SELECT),
            event(30, 2, codes::TRAIN),
        ];
        let metrics = compute(&events, &[2], 2000);
        assert_eq!(
            metrics[0].breakdown,
            vec![
                OpcodeCount { name: "select", count: 1 },
                OpcodeCount { name: "train", count: 2 },
            ]
        );
    }

    #[test]
    fn test_short_span_is_clamped() {
        let events = vec![event(0, 0, codes::TRAIN), event(1, 0, codes::TRAIN)];
        let metrics = compute(&events, &[0], 1);
        assert_eq!(metrics[0].apm, 120);
    }

    #[test]
    fn test_sparse_player_over_long_span() {
        // 100_000 frames is 70 minutes
        let events = vec![event(500, 0, codes::TRAIN), event(900, 1, codes::SELECT)];
        let metrics = compute(&events, &[0, 1, 2], 100_000);

        assert_eq!((metrics[0].actions, metrics[0].apm, metrics[0].eapm), (1, 1, 1));
        assert_eq!((metrics[1].apm, metrics[1].eapm), (1, 0));
        assert_eq!((metrics[2].apm, metrics[2].eapm), (0, 0));
    }

    #[test]
    fn test_apm_never_below_eapm() {
        let opcodes = [codes::SELECT, codes::TRAIN, codes::KEEP_ALIVE, codes::STOP];
        let events: Vec<_> = (0..200)
            .map(|i| event(i * 7, (i % 3) as u8, opcodes[i as usize % opcodes.len()]))
            .collect();
        for m in compute(&events, &[0, 1, 2], 1400) {
            assert!(m.apm >= m.eapm);
            assert!(m.actions >= m.effective_actions);
        }
    }
}
