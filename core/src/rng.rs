//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through SimRng instances derived
//! from the single master seed held by the engine's RngBank.
//!
//! Each stream is seeded deterministically from
//! (master_seed, stream slot, tick). This means:
//!   - Seeding the initial infections never shifts the transition draws.
//!   - Step N's draws depend only on the seed and N, so a run resumed
//!     from a snapshot at tick N continues exactly as the original did.

use crate::types::Tick;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG stream.
pub struct SimRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SimRng {
    /// Create a stream directly from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        use rand::RngCore;
        self.inner.next_u64()
    }

    /// Roll a u64 uniformly in [0, n). Returns 0 when n is 0.
    ///
    /// Draws below `2^64 mod n` are rejected so every residue is hit by
    /// the same number of raw values.
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        let reject_below = n.wrapping_neg() % n;
        loop {
            let x = self.next_u64();
            if x >= reject_below {
                return x % n;
            }
        }
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Uniformly random permutation (Fisher–Yates, walking down from the end).
    pub fn shuffle<T>(&mut self, mut items: Vec<T>) -> Vec<T> {
        for i in (1..items.len()).rev() {
            let j = self.next_u64_below(i as u64 + 1) as usize;
            items.swap(i, j);
        }
        items
    }
}

/// Derives every stream for a single run from one master seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn for_stream(&self, slot: StreamSlot) -> SimRng {
        SimRng::new(self.derive(slot, 0)).with_name(slot.name())
    }

    /// The stream a slot uses on one specific tick.
    pub fn for_stream_at_tick(&self, slot: StreamSlot, tick: Tick) -> SimRng {
        SimRng::new(self.derive(slot, tick)).with_name(slot.name())
    }

    fn derive(&self, slot: StreamSlot, tick: Tick) -> u64 {
        self.master_seed
            ^ (slot as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15)
            ^ tick.wrapping_mul(0xbf58_476d_1ce4_e5b9)
    }
}

/// Stable stream slot assignments.
/// NEVER reorder or remove entries — only append.
/// Reordering changes every stream's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StreamSlot {
    Seeding    = 0,
    Transition = 1,
    Topology   = 2,
}

impl StreamSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Seeding    => "seeding",
            Self::Transition => "transition",
            Self::Topology   => "topology",
        }
    }
}
