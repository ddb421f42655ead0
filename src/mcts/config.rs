//! Search configuration parameters.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::utils::{DEFAULT_DIFFICULTY, EXPLORATION, TIE_JITTER};

/// Configuration for one search tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Simulations run before each move ("difficulty").
    pub iterations: usize,

    /// Exploration constant C in the UCB1 score.
    pub exploration: f64,

    /// Scale of the uniform noise added to every UCB1 score so exact ties break at random.
    /// Set to 0.0 to always take the first of equally scored children.
    pub tie_jitter: f64,

    /// Seed for expansion order, rollouts and jitter. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_DIFFICULTY,
            exploration: EXPLORATION,
            tie_jitter: TIE_JITTER,
            seed: None,
        }
    }
}

impl SearchConfig {
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Copy with its own seed for tree number `stream`, so trees built from one seed
    /// (both sides of a game, every game of a tournament) draw unrelated random numbers.
    /// Unseeded configs stay unseeded.
    pub fn for_stream(&self, stream: u64) -> Self {
        let mut config = self.clone();
        config.seed = self.seed.map(|seed| {
            StdRng::seed_from_u64(seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15)).random()
        });
        config
    }

    /// Small, reproducible searches for tests.
    pub fn for_testing() -> Self {
        Self {
            iterations: 200,
            seed: Some(7),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn streams_get_distinct_seeds() {
        let base = SearchConfig::default().with_seed(5);
        let seeds: HashSet<u64> = (0..64).filter_map(|s| base.for_stream(s).seed).collect();
        assert_eq!(seeds.len(), 64);
        // neighbouring base seeds do not line up with neighbouring streams
        assert_ne!(base.for_stream(2).seed, SearchConfig::default().with_seed(6).for_stream(1).seed);
        assert_eq!(base.for_stream(3), base.for_stream(3));
        assert_eq!(base.for_stream(3).iterations, base.iterations);
    }

    #[test]
    fn unseeded_streams_stay_unseeded() {
        assert_eq!(SearchConfig::default().for_stream(9).seed, None);
    }
}
