//! Random level assignment for skip list insertion.
//!
//! Treated as a thin, swappable collaborator: the skip list only depends on
//! `LevelGenerator::generate` returning a height in `[1, MAX_HEIGHT]` that is
//! independent of the key being inserted, not on a specific RNG backend.

use parking_lot::Mutex;
use rand::Rng;

/// Geometric distribution with p = 1/2, the standard skip list choice:
/// each additional level is half as likely as the one before it.
pub struct LevelGenerator {
    max_height: usize,
    rng: Mutex<rand::rngs::ThreadRng>,
}

impl LevelGenerator {
    pub fn new(max_height: usize) -> Self {
        Self {
            max_height,
            rng: Mutex::new(rand::thread_rng()),
        }
    }

    /// Returns a level in `[1, max_height]`.
    pub fn generate(&self) -> usize {
        let mut level = 1;
        let mut rng = self.rng.lock();
        while level < self.max_height && rng.gen_bool(0.5) {
            level += 1;
        }
        level
    }
}
