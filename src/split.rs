use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::Split;

/// Assigns images to train or val one at a time.
///
/// Every call is an independent draw, so frames of the same sequence can end
/// up in different splits.
pub struct DatasetSplitter {
    train_ratio: f64,
    rng: StdRng,
}

impl DatasetSplitter {
    /// A seeded splitter yields the same assignment sequence on every run.
    pub fn seeded(train_ratio: f64, seed: u64) -> Self {
        Self {
            train_ratio,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy(train_ratio: f64) -> Self {
        Self {
            train_ratio,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn new(train_ratio: f64, seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(train_ratio, seed),
            None => Self::from_entropy(train_ratio),
        }
    }

    pub fn train_ratio(&self) -> f64 {
        self.train_ratio
    }

    pub fn assign(&mut self) -> Split {
        if self.rng.gen::<f64>() < self.train_ratio {
            Split::Train
        } else {
            Split::Val
        }
    }
}
