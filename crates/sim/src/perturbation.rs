use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};

/// Source of the random temperature term added each tick.
///
/// Closures `FnMut(low, high) -> i32` implement this, which is how tests
/// script deterministic sequences.
pub trait Perturbation: Send {
    /// Draw from the closed interval `[low, high]`.
    fn draw(&mut self, low: i32, high: i32) -> i32;
}

impl<F> Perturbation for F
where
    F: FnMut(i32, i32) -> i32 + Send,
{
    fn draw(&mut self, low: i32, high: i32) -> i32 {
        self(low, high)
    }
}

/// Uniform integer draws from a seedable RNG.
#[derive(Clone, Debug)]
pub struct UniformPerturbation {
    rng: StdRng,
}

impl UniformPerturbation {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Perturbation for UniformPerturbation {
    fn draw(&mut self, low: i32, high: i32) -> i32 {
        Uniform::new_inclusive(low.min(high), high.max(low)).sample(&mut self.rng)
    }
}
