//! Property tests for the full pipeline.

mod common;

use bw_replay::{parse, ParserError};
use proptest::prelude::*;

use common::{legacy_replay, two_players, Stream};

/// One generated command: (kind, player, frames to advance first).
fn command() -> impl Strategy<Value = (u8, u8, u16)> {
    (0u8..6, 0u8..2, 0u16..400)
}

fn assemble(commands: &[(u8, u8, u16)]) -> (Vec<u8>, u32) {
    let mut stream = Stream::new();
    let mut frames = 0u32;
    for (i, &(kind, player, gap)) in commands.iter().enumerate() {
        if gap > 0 {
            stream.sync(gap);
            frames += u32::from(gap);
        }
        let tag = 0x100 + i as u16;
        match kind {
            0 => stream.select(player, &[tag]),
            1 => stream.train(player, if player == 0 { 7 } else { 64 }),
            2 => stream.build(player, if player == 0 { 109 } else { 156 }),
            3 => stream.hotkey(player, 0, 2),
            4 => stream.move_to(player, 10, 20),
            _ => stream.research(player, 0),
        };
    }
    (stream.bytes(), frames)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: arbitrary input never panics, and a result never carries
    /// data without a resolved source.
    #[test]
    fn prop_arbitrary_bytes_never_panic(data in proptest::collection::vec(any::<u8>(), 1..4096)) {
        match parse(&data) {
            Ok(result) => {
                if result.metrics.is_some() {
                    prop_assert!(result.commands_resolved());
                    prop_assert!(!result.players.is_empty());
                }
                if !result.commands_resolved() {
                    prop_assert_eq!(result.strategy, "unresolved");
                    prop_assert_eq!(result.event_count, 0);
                    prop_assert!(result.build_orders.is_empty());
                }
            }
            Err(e) => prop_assert!(matches!(e, ParserError::BufferEmptyOrTooLarge { .. }), "unexpected error: {:?}", e),
        }
    }

    /// Property: generated games satisfy the rate and ordering invariants
    /// and decode identically twice.
    #[test]
    fn prop_generated_games(commands in proptest::collection::vec(command(), 1..120)) {
        let (stream, frames) = assemble(&commands);
        let data = legacy_replay(frames.max(300) + 50, &two_players(), &stream);

        let first = parse(&data).unwrap();
        let second = parse(&data).unwrap();
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );

        if let Some(metrics) = &first.metrics {
            for m in metrics {
                prop_assert!(m.apm >= m.eapm);
            }
        }
        for order in &first.build_orders {
            prop_assert!(order.entries.windows(2).all(|w| w[0].frame <= w[1].frame));
        }
        if !first.commands_resolved() {
            prop_assert!(first.metrics.is_none());
        }
    }
}
