//! Seeded RNG Stream
//!
//! Every random decision in a run flows through a [`RandomSource`] handle that the host
//! threads into the session. The stream is seeded from a [`RunSeed`] supplied by the
//! session/save layer; nothing in the crate generates seeds on its own.

use chrono::NaiveDate;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic integer source.
pub trait RandomSource {
    /// Draw an integer in `[0, bound)`. `bound` must be non-zero.
    fn next_int(&mut self, bound: u32) -> u32;
}

/// Seed of a run, as stored by the save layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunSeed(String);

impl RunSeed {
    pub fn new(seed: impl Into<String>) -> Self {
        RunSeed(seed.into())
    }

    /// Seed shared by every player of the daily challenge for `date`.
    pub fn daily(date: NaiveDate) -> Self {
        RunSeed(format!("daily-{}", date.format("%Y-%m-%d")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 32-byte stream key derived from the seed text.
    pub fn key(&self) -> [u8; 32] {
        *blake3::hash(self.0.as_bytes()).as_bytes()
    }

    /// Short stable identifier used in logs and transcripts.
    pub fn fingerprint(&self) -> String {
        hex::encode(&self.key()[..6])
    }
}

impl fmt::Display for RunSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stream position, persisted alongside the seed so a resumed run continues the same stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamPosition(pub u128);

/// ChaCha20-backed deterministic stream.
#[derive(Debug, Clone)]
pub struct SeededRng {
    seed: RunSeed,
    inner: ChaCha20Rng,
    draws: u64,
}

impl SeededRng {
    pub fn new(seed: RunSeed) -> Self {
        let inner = ChaCha20Rng::from_seed(seed.key());
        Self {
            seed,
            inner,
            draws: 0,
        }
    }

    /// Rebuild a stream at a previously saved position.
    pub fn restore(seed: RunSeed, position: StreamPosition, draws: u64) -> Self {
        let mut rng = Self::new(seed);
        rng.inner.set_word_pos(position.0);
        rng.draws = draws;
        rng
    }

    pub fn seed(&self) -> &RunSeed {
        &self.seed
    }

    pub fn position(&self) -> StreamPosition {
        StreamPosition(self.inner.get_word_pos())
    }

    /// Number of `next_int` calls served so far.
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl RandomSource for SeededRng {
    fn next_int(&mut self, bound: u32) -> u32 {
        assert!(bound > 0, "next_int bound must be > 0");
        self.draws += 1;
        self.inner.random_range(0..bound)
    }
}

/// Replays a fixed list of draws. Useful for pinning a branch in tests and replays.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRng {
    script: Vec<u32>,
    cursor: usize,
}

impl ScriptedRng {
    pub fn new(script: Vec<u32>) -> Self {
        Self { script, cursor: 0 }
    }

    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedRng {
    fn next_int(&mut self, bound: u32) -> u32 {
        let Some(&value) = self.script.get(self.cursor) else {
            panic!("scripted draws exhausted after {} values", self.script.len());
        };
        self.cursor += 1;
        assert!(value < bound, "scripted draw {value} not below bound {bound}");
        value
    }
}

/// Random source held by a session: the seeded stream of a real run, or a fixed script used to
/// pin branches in replays and tests.
#[derive(Debug, Clone)]
pub enum SessionRng {
    Seeded(SeededRng),
    Scripted(ScriptedRng),
}

impl SessionRng {
    /// The seeded stream, if this is one. Scripted sources cannot be saved.
    pub fn as_seeded(&self) -> Option<&SeededRng> {
        match self {
            SessionRng::Seeded(rng) => Some(rng),
            SessionRng::Scripted(_) => None,
        }
    }
}

impl From<SeededRng> for SessionRng {
    fn from(rng: SeededRng) -> Self {
        SessionRng::Seeded(rng)
    }
}

impl From<ScriptedRng> for SessionRng {
    fn from(rng: ScriptedRng) -> Self {
        SessionRng::Scripted(rng)
    }
}

impl RandomSource for SessionRng {
    fn next_int(&mut self, bound: u32) -> u32 {
        match self {
            SessionRng::Seeded(rng) => rng.next_int(bound),
            SessionRng::Scripted(rng) => rng.next_int(bound),
        }
    }
}
