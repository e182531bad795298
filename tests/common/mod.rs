//! Synthetic replay fixtures shared by the integration tests.
//!
//! No real replay files are checked in, so fixtures are assembled from the
//! documented layout: header section, player slots, colour table, and a
//! command stream built opcode by opcode.

#![allow(dead_code)]

use std::io::Write;

use bw_replay::format::{offsets, HEADER_SECTION_LEN, LEGACY_MAGIC, MODERN_MAGIC, SECTION_BASE};
use flate2::write::ZlibEncoder;

/// Player slot stride of the standard layout.
pub const SLOT_STRIDE: usize = 36;

/// A player written into the slot table.
#[derive(Debug, Clone)]
pub struct FixturePlayer {
    pub player_id: u8,
    pub race: u8,
    pub team: u8,
    pub name: &'static str,
}

pub const TERRAN: u8 = 1;
pub const ZERG: u8 = 0;
pub const PROTOSS: u8 = 2;

/// Two human players: Terran id 0 and Protoss id 1.
pub fn two_players() -> Vec<FixturePlayer> {
    vec![
        FixturePlayer {
            player_id: 0,
            race: TERRAN,
            team: 1,
            name: "Flash",
        },
        FixturePlayer {
            player_id: 1,
            race: PROTOSS,
            team: 2,
            name: "Bisu",
        },
    ]
}

fn put(buf: &mut [u8], offset: usize, bytes: &[u8]) {
    let at = SECTION_BASE + offset;
    buf[at..at + bytes.len()].copy_from_slice(bytes);
}

/// Builds a header section (magic included) with every field resolvable.
pub fn header(magic: Option<&[u8; 4]>, frames: u32, map: &str, players: &[FixturePlayer]) -> Vec<u8> {
    let mut buf = vec![0u8; SECTION_BASE + HEADER_SECTION_LEN];
    if let Some(magic) = magic {
        buf[..4].copy_from_slice(magic);
    }
    put(&mut buf, offsets::ENGINE, &[1]);
    put(&mut buf, offsets::FRAME_COUNT, &frames.to_le_bytes());
    put(&mut buf, offsets::SAVE_TIME, &1_200_000_000u32.to_le_bytes());
    put(&mut buf, offsets::TITLE, b"Finals game 3");
    put(&mut buf, offsets::MAP_WIDTH, &128u16.to_le_bytes());
    put(&mut buf, offsets::MAP_HEIGHT, &128u16.to_le_bytes());
    put(&mut buf, offsets::GAME_SPEED, &[6]);
    put(&mut buf, offsets::GAME_TYPE, &0x04u16.to_le_bytes());
    put(&mut buf, offsets::HOST_NAME, b"Flash");
    put(&mut buf, offsets::MAP_NAME, map.as_bytes());

    for (index, player) in players.iter().enumerate() {
        let slot = offsets::PLAYER_SLOTS + index * SLOT_STRIDE;
        put(&mut buf, slot, &(index as u16).to_le_bytes());
        put(&mut buf, slot + 0x04, &[player.player_id]);
        put(&mut buf, slot + 0x08, &[2]);
        put(&mut buf, slot + 0x09, &[player.race]);
        put(&mut buf, slot + 0x0A, &[player.team]);
        put(&mut buf, slot + 0x0B, player.name.as_bytes());
    }
    for index in 0..8u32 {
        put(
            &mut buf,
            offsets::COLORS + index as usize * 4,
            &index.to_le_bytes(),
        );
    }
    buf
}

/// A legacy (`reRS`) working buffer: header, declared length, stream.
pub fn legacy_replay(frames: u32, players: &[FixturePlayer], stream: &[u8]) -> Vec<u8> {
    let mut buf = header(Some(LEGACY_MAGIC), frames, "Fighting Spirit", players);
    buf.extend_from_slice(&(stream.len() as u32).to_le_bytes());
    buf.extend_from_slice(stream);
    buf
}

/// A modern (`seRS`) working buffer: header, declared length, checksum,
/// stream.
pub fn modern_replay(frames: u32, players: &[FixturePlayer], stream: &[u8]) -> Vec<u8> {
    let mut buf = header(Some(MODERN_MAGIC), frames, "Circuit Breaker", players);
    buf.extend_from_slice(&(stream.len() as u32).to_le_bytes());
    buf.extend_from_slice(&0xDEAD_BEEFu32.to_le_bytes());
    buf.extend_from_slice(stream);
    buf
}

/// Zlib-compresses `payload`.
pub fn zlib(payload: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(payload).unwrap();
    encoder.finish().unwrap()
}

/// Command stream builder.
#[derive(Debug, Default, Clone)]
pub struct Stream {
    bytes: Vec<u8>,
}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Advances the frame counter by `frames` using the shortest sync opcode.
    pub fn sync(&mut self, frames: u16) -> &mut Self {
        match frames {
            1 => self.raw(&[0x00]),
            2..=255 => self.raw(&[0x01, frames as u8]),
            _ => {
                let [lo, hi] = frames.to_le_bytes();
                self.raw(&[0x02, lo, hi])
            }
        }
    }

    pub fn select(&mut self, player: u8, units: &[u16]) -> &mut Self {
        self.raw(&[0x09, player, units.len() as u8]);
        for unit in units {
            self.raw(&unit.to_le_bytes());
        }
        self
    }

    pub fn build(&mut self, player: u8, unit: u16) -> &mut Self {
        self.raw(&[0x0C, player, 0x1E, 0x40, 0x00, 0x60, 0x00]);
        self.raw(&unit.to_le_bytes())
    }

    pub fn train(&mut self, player: u8, unit: u16) -> &mut Self {
        self.raw(&[0x1F, player]);
        self.raw(&unit.to_le_bytes())
    }

    pub fn morph(&mut self, player: u8, unit: u16) -> &mut Self {
        self.raw(&[0x23, player]);
        self.raw(&unit.to_le_bytes())
    }

    pub fn hotkey(&mut self, player: u8, kind: u8, group: u8) -> &mut Self {
        self.raw(&[0x13, player, kind, group])
    }

    pub fn move_to(&mut self, player: u8, x: u16, y: u16) -> &mut Self {
        self.raw(&[0x14, player]);
        self.raw(&x.to_le_bytes());
        self.raw(&y.to_le_bytes());
        self.raw(&[0x00, 0x00, 0xE4, 0x00, 0x00])
    }

    pub fn research(&mut self, player: u8, tech: u8) -> &mut Self {
        self.raw(&[0x2F, player, tech])
    }
}

/// A two-player game of `rounds` rounds, 24 frames apart. Each round has
/// player 0 select, train an SCV and move, and player 1 select and train a
/// Probe. Returns the stream and the final frame.
pub fn game_stream(rounds: u16) -> (Vec<u8>, u32) {
    let mut stream = Stream::new();
    stream.build(0, 109);
    for round in 0..rounds {
        stream
            .sync(24)
            .select(0, &[0x100 + round])
            .train(0, 7)
            .move_to(0, 100 + round, 200)
            .hotkey(1, 1, 1)
            .select(1, &[0x200 + round, 0x201 + round])
            .train(1, 64);
    }
    stream.sync(24).research(0, 0);
    (stream.bytes(), u32::from(rounds + 1) * 24)
}

/// A complete legacy fixture with a resolvable header, two players and a
/// command stream that the descriptor-anchored strategy accepts.
pub fn valid_replay() -> Vec<u8> {
    let (stream, last_frame) = game_stream(40);
    legacy_replay(last_frame + 100, &two_players(), &stream)
}
