//! Integration tests for the full decode pipeline on synthetic fixtures.

mod common;

use bw_replay::build_order::BuildAction;
use bw_replay::commands::{codes, CommandDecoder};
use bw_replay::error::ErrorKind;
use bw_replay::format::{Compression, EngineRevision};
use bw_replay::{parse, ParseOptions, Race, Reliability, ReplayParser};

use common::{game_stream, legacy_replay, two_players, valid_replay, Stream};

fn kinds(result: &bw_replay::ExtractionResult) -> Vec<ErrorKind> {
    result.issues.iter().map(|i| i.kind).collect()
}

// ============================================================================
// Resolved fixtures
// ============================================================================

#[test]
fn test_valid_fixture_resolves_everything() {
    let result = parse(&valid_replay()).unwrap();

    assert!(result.players.len() >= 2);
    assert_eq!(result.header.map_name.as_deref(), Some("Fighting Spirit"));
    assert_eq!(result.header.frame_count, Some(41 * 24 + 100));
    assert_eq!(result.descriptor.revision, EngineRevision::Legacy);
    assert_eq!(result.strategy, "descriptor-anchored");
    assert_eq!(result.reliability, Reliability::High);
    assert_eq!(result.command_offset, Some(0x281));
    assert_eq!(result.event_count, 242);
    assert!(result.issues.is_empty(), "{:?}", result.issues);

    let flash = &result.players[0];
    assert_eq!(flash.name, "Flash");
    assert_eq!(flash.race, Race::Terran);
    assert_eq!(flash.color, Some("Red"));
    assert_eq!(result.players[1].race, Race::Protoss);
}

#[test]
fn test_metrics_apm_not_below_eapm() {
    let result = parse(&valid_replay()).unwrap();
    let metrics = result.metrics.expect("metrics present");
    assert_eq!(metrics.len(), 2);

    for m in &metrics {
        assert!(m.apm >= m.eapm, "player {}: {} < {}", m.player_id, m.apm, m.eapm);
        assert!(m.apm > 0);
    }

    // player 0: build + 40 x (select, train, move) + research
    assert_eq!(metrics[0].actions, 122);
    assert_eq!(metrics[0].effective_actions, 82);
    // player 1: 40 x (hotkey, select, train)
    assert_eq!(metrics[1].actions, 120);
    assert_eq!(metrics[1].effective_actions, 80);
    let select = metrics[1]
        .breakdown
        .iter()
        .find(|c| c.name == "select")
        .unwrap();
    assert_eq!(select.count, 40);
}

#[test]
fn test_build_orders_are_frame_monotonic() {
    let result = parse(&valid_replay()).unwrap();
    assert_eq!(result.build_orders.len(), 2);

    for order in &result.build_orders {
        assert!(!order.entries.is_empty());
        assert!(order
            .entries
            .windows(2)
            .all(|pair| pair[0].frame <= pair[1].frame));
    }

    let terran = &result.build_orders[0];
    assert_eq!(terran.name, "Flash");
    assert_eq!(terran.entries[0].name, "Supply Depot");
    assert_eq!(terran.entries[0].action, BuildAction::Build);
    assert_eq!(terran.entries[1].name, "SCV");
    assert_eq!(terran.entries.last().unwrap().name, "Stim Packs");

    let protoss = &result.build_orders[1];
    assert!(protoss.entries.iter().all(|e| e.name == "Probe"));
    assert_eq!(protoss.entries[0].supply, 4);
    assert_eq!(protoss.entries[0].supply_cap, Some(9));
}

#[test]
fn test_build_order_length_is_capped() {
    let parser = ReplayParser::new(ParseOptions {
        max_build_order_len: 5,
        ..ParseOptions::default()
    })
    .unwrap();
    let result = parser.parse(&valid_replay()).unwrap();
    assert!(result.build_orders.iter().all(|o| o.entries.len() == 5));
}

#[test]
fn test_modern_revision_skips_checksum() {
    let (stream, last_frame) = game_stream(20);
    let data = common::modern_replay(last_frame + 50, &two_players(), &stream);
    let result = parse(&data).unwrap();

    assert_eq!(result.descriptor.revision, EngineRevision::Modern);
    assert_eq!(result.header.map_name.as_deref(), Some("Circuit Breaker"));
    assert_eq!(result.strategy, "descriptor-anchored");
    assert_eq!(result.command_offset, Some(0x285));
    assert_eq!(result.event_count, 122);
}

#[test]
fn test_compressed_fixture() {
    let result = parse(&common::zlib(&valid_replay())).unwrap();
    assert_eq!(result.descriptor.compression, Compression::Inflate { offset: 0 });
    assert_eq!(result.strategy, "descriptor-anchored");
    assert_eq!(result.event_count, 242);
    assert!(!kinds(&result).contains(&ErrorKind::FormatUnrecognized));

    let mut prefixed = b"BWREPLAY\0\0\0\0".to_vec();
    prefixed.extend_from_slice(&common::zlib(&valid_replay()));
    let result = parse(&prefixed).unwrap();
    assert_eq!(result.descriptor.compression, Compression::Inflate { offset: 12 });
    assert_eq!(result.players.len(), 2);
}

#[test]
fn test_output_is_deterministic() {
    let data = valid_replay();
    let first = serde_json::to_string(&parse(&data).unwrap()).unwrap();
    let second = serde_json::to_string(&parse(&data).unwrap()).unwrap();
    assert_eq!(first, second);

    let parser = ReplayParser::default();
    let third = serde_json::to_string(&parser.parse(&data).unwrap()).unwrap();
    assert_eq!(first, third);
}

#[test]
fn test_json_shape() {
    let result = parse(&valid_replay()).unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["strategy"], "descriptor-anchored");
    assert_eq!(json["reliability"], "high");
    assert_eq!(json["header"]["game_speed"], "fastest");
    assert_eq!(json["players"][0]["race"], "terran");
    assert_eq!(json["build_orders"][0]["entries"][0]["name"], "Supply Depot");
    assert_eq!(json["build_orders"][0]["entries"][0]["category"], "supply");
    assert!(json["metrics"][0]["apm"].is_u64());
    assert!(json["issues"].as_array().unwrap().is_empty());
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn test_round_trip_two_commands() {
    let stream = Stream::new()
        .sync(24)
        .build(0, 109)
        .sync(100)
        .train(1, 64)
        .bytes();

    let events = CommandDecoder::new(&stream, 0, stream.len(), 64).decode_all().events;
    assert_eq!(events.len(), 2);
    assert_eq!((events[0].frame, events[0].player, events[0].opcode), (24, 0, codes::BUILD));
    assert_eq!((events[1].frame, events[1].player, events[1].opcode), (124, 1, codes::TRAIN));

    let parser = ReplayParser::new(ParseOptions {
        min_events: 2,
        ..ParseOptions::default()
    })
    .unwrap();
    let result = parser
        .parse(&legacy_replay(1000, &two_players(), &stream))
        .unwrap();
    assert_eq!(result.strategy, "descriptor-anchored");
    assert_eq!(result.event_count, 2);

    let orders = &result.build_orders;
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].entries.len(), 1);
    assert_eq!(orders[0].entries[0].frame, 24);
    assert_eq!(orders[0].entries[0].name, "Supply Depot");
    assert_eq!(orders[1].entries.len(), 1);
    assert_eq!(orders[1].entries[0].frame, 124);
    assert_eq!(orders[1].entries[0].name, "Probe");
    assert_eq!(orders[1].entries[0].time, "0:05");
}

// ============================================================================
// Degraded inputs
// ============================================================================

#[test]
fn test_ff_buffer_is_unresolved() {
    let result = parse(&[0xFF; 10_000]).unwrap();
    assert_eq!(result.strategy, "unresolved");
    assert_eq!(result.reliability, Reliability::None);
    assert!(result.metrics.is_none());
    assert!(result.build_orders.is_empty());
    assert!(kinds(&result).contains(&ErrorKind::CommandStreamUnresolved));
}

#[test]
fn test_header_only_has_absent_metrics() {
    let data = legacy_replay(1000, &two_players(), &[]);
    let result = parse(&data).unwrap();

    assert_eq!(result.header.map_name.as_deref(), Some("Fighting Spirit"));
    assert_eq!(result.header.frame_count, Some(1000));
    assert_eq!(result.players.len(), 2);
    assert!(result.build_orders.is_empty());
    assert!(result.metrics.is_none());
    assert_eq!(result.strategy, "unresolved");
    assert_eq!(kinds(&result), vec![ErrorKind::CommandStreamUnresolved]);

    let json = serde_json::to_value(&result).unwrap();
    assert!(json["metrics"].is_null());
}

#[test]
fn test_truncated_stream_lowers_reliability() {
    let (mut stream, last_frame) = game_stream(40);
    stream.extend_from_slice(&[0xFF; 200]);
    let result = parse(&legacy_replay(last_frame + 100, &two_players(), &stream)).unwrap();

    assert_eq!(result.strategy, "descriptor-anchored");
    assert_eq!(result.event_count, 242);
    assert_eq!(result.reliability, Reliability::Medium);
    assert!(kinds(&result).contains(&ErrorKind::CommandStreamTruncated));
    assert!(result.metrics.is_some());
}

#[test]
fn test_unresolved_players_keep_commands() {
    let players = &two_players()[..1];
    let (stream, last_frame) = game_stream(20);
    let result = parse(&legacy_replay(last_frame + 100, players, &stream)).unwrap();

    assert!(result.players.is_empty());
    assert!(result.player_layout.is_none());
    assert_eq!(result.strategy, "descriptor-anchored");
    assert!(result.event_count > 0);
    assert!(result.metrics.is_none());
    assert!(result.build_orders.is_empty());
    assert!(kinds(&result).contains(&ErrorKind::PlayerTableUnresolved));
    assert_eq!(result.header.map_name.as_deref(), Some("Fighting Spirit"));
}

#[test]
fn test_time_budget_expiry_is_unresolved() {
    let parser = ReplayParser::new(ParseOptions {
        time_budget_ms: Some(0),
        ..ParseOptions::default()
    })
    .unwrap();
    let result = parser.parse(&valid_replay()).unwrap();
    assert_eq!(result.strategy, "unresolved");
    assert_eq!(result.players.len(), 2);
    assert!(result.metrics.is_none());
}

#[test]
fn test_oversized_buffer_is_rejected() {
    let parser = ReplayParser::new(ParseOptions {
        max_buffer_size: 512,
        ..ParseOptions::default()
    })
    .unwrap();
    let err = parser.parse(&valid_replay()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BufferEmptyOrTooLarge);
    assert!(err.kind().is_fatal());
}
