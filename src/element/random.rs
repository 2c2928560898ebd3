use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The number of samples drawn up front.
const CACHED_SAMPLES: usize = 64;

/// A deterministic per-element source of uniform samples.
///
/// The samples are drawn once from a generator seeded with the element's id plus
/// the run seed, then handed out in order, wrapping around after the last one.
#[derive(Clone, Debug)]
pub struct Pseudorandom {
    samples: [f64; CACHED_SAMPLES],
    cursor: usize,
}

impl Pseudorandom {
    pub fn new(id: i64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64((id as u64).wrapping_add(seed));
        Self {
            samples: std::array::from_fn(|_| rng.gen()),
            cursor: 0,
        }
    }

    /// The next sample in `[0, 1)`.
    pub fn random_value(&mut self) -> f64 {
        let value = self.samples[self.cursor];
        self.cursor = (self.cursor + 1) % CACHED_SAMPLES;
        value
    }

    /// The next sample mapped to `[-1, 1)`.
    pub fn random_neg_one_to_one(&mut self) -> f64 {
        2.0 * self.random_value() - 1.0
    }

    /// The next sample mapped to an integer in `[0, 1000)`.
    pub fn random_int(&mut self) -> u32 {
        (self.random_value() * 1000.0) as u32
    }

    /// Picks an index below `len`, or `None` if `len` is zero.
    pub fn pick(&mut self, len: usize) -> Option<usize> {
        match len {
            0 => None,
            1 => Some(0),
            _ => Some(self.random_int() as usize % len),
        }
    }
}
