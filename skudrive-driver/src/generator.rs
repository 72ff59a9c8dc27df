//! Random identifiers and prices for synthetic products.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use skudrive_types::{Price, Sku, SkuError};

/// Generates synthetic product attributes from a seeded RNG.
///
/// Two generators created with the same seed yield the same sequence of values.
#[derive(Debug, Clone)]
pub struct Generator {
    seed: u64,
    rng: SmallRng,
}

impl Generator {
    /// Creates a generator with the given seed, or a random seed if `None`.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        Self {
            seed,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// The seed this generator was created with, for reproducing a run.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Draws an identifier uniformly from `[0, keyspace)`.
    ///
    /// Fails if the drawn number does not fit an identifier. Callers reject a zero `keyspace` up
    /// front, as `random_range` panics on an empty range.
    pub(crate) fn random_sku(&mut self, keyspace: u64) -> Result<Sku, SkuError> {
        Sku::new(self.rng.random_range(0..keyspace))
    }

    /// Draws a price uniformly from [`Price::MIN`] to [`Price::MAX`], both inclusive.
    pub fn random_price(&mut self) -> Price {
        Price::from_cents(
            self.rng
                .random_range(Price::MIN.cents()..=Price::MAX.cents()),
        )
    }
}
