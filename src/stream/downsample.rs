//! Bernoulli downsampling of records.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::ChunkBatch;
use crate::error::TaqError;

/// Keeps each record independently with a fixed probability.
///
/// Batch count and order are preserved; only the records inside each batch are
/// thinned. The generator is seeded explicitly, so a given seed and input always
/// select the same records.
pub struct Downsample<I> {
    inner: I,
    probability: f64,
    rng: StdRng,
    done: bool,
}

impl<I> Downsample<I> {
    /// Fails with `InvalidConfig` unless `0 <= probability <= 1`.
    pub fn new(inner: I, probability: f64, seed: u64) -> Result<Self, TaqError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(TaqError::InvalidConfig(format!(
                "downsample probability must be in [0, 1], got {}",
                probability
            )));
        }
        Ok(Self {
            inner,
            probability,
            rng: StdRng::seed_from_u64(seed),
            done: false,
        })
    }

    fn sample<B: ChunkBatch>(&mut self, batch: B) -> Result<B, TaqError> {
        if self.probability >= 1.0 {
            return Ok(batch);
        }
        let mask: Vec<bool> = (0..batch.num_rows())
            .map(|_| self.rng.random_bool(self.probability))
            .collect();
        batch.filter_rows(&mask)
    }
}

impl<I, B> Iterator for Downsample<I>
where
    I: Iterator<Item = Result<B, TaqError>>,
    B: ChunkBatch,
{
    type Item = Result<B, TaqError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let sampled = match self.inner.next()? {
            Ok(batch) => self.sample(batch),
            Err(e) => Err(e),
        };
        if sampled.is_err() {
            self.done = true;
        }
        Some(sampled)
    }
}
