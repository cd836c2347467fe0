//! Seedable pseudo-random number generator (xorshift64).
//! Deterministic so replays and tests see the same coin flips.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Rng {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Fair coin.
    pub fn coin_flip(&mut self) -> bool {
        self.next_u64() >> 63 == 1
    }
}
