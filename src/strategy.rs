//! The common "propose a column" contract shared by computer players

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::engine::SearchEngine;
use crate::grid::Grid;

/// Anything that can pick a column for the side to move
pub trait Strategy {
    /// Proposes a column, or `None` when the grid has no valid column
    fn propose(&mut self, grid: &Grid) -> Option<usize>;

    /// Display name
    fn name(&self) -> &str;
}

impl Strategy for SearchEngine {
    fn propose(&mut self, grid: &Grid) -> Option<usize> {
        self.get_move(grid)
    }

    fn name(&self) -> &str {
        "Minimax"
    }
}

/// Picks uniformly among the valid columns
pub struct RandomStrategy {
    rng: StdRng,
}

impl RandomStrategy {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// A reproducible strategy for tests and seeded arena runs
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for RandomStrategy {
    fn propose(&mut self, grid: &Grid) -> Option<usize> {
        grid.valid_columns().choose(&mut self.rng).copied()
    }

    fn name(&self) -> &str {
        "Random"
    }
}
