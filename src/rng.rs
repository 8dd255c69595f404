use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng};

/// Seedable random source owned by a simulation; one stream per engine keeps ticks replayable.
#[derive(Clone, Debug)]
pub struct Rng {
    inner: StdRng,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    pub fn bool(&mut self, probability: f64) -> bool {
        self.inner.random_bool(probability.clamp(0.0, 1.0))
    }

    pub fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.inner.random_range(0..len)
    }
}
