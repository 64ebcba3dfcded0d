//! PageRank parameters.

use serde::{Deserialize, Serialize};

/// Configuration for the power iteration.
///
/// Stored next to a cached ranking; a ranking computed with different
/// parameters is not reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankConfig {
    /// Probability of following an edge rather than teleporting.
    pub damping: f64,

    /// Iteration stops once the L1 change between rounds drops below this.
    pub tolerance: f64,

    /// Hard cap on iterations. Reaching it is not an error.
    pub max_iterations: usize,

    /// Added to the PageRank spread when rescaling to risk, so a graph where
    /// every station ranks the same gives risk 0 instead of dividing by zero.
    pub risk_epsilon: f64,
}

impl RankConfig {
    pub fn new(damping: f64, tolerance: f64, max_iterations: usize) -> Self {
        Self {
            damping,
            tolerance,
            max_iterations,
            ..Self::default()
        }
    }
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            tolerance: 1e-6,
            max_iterations: 100,
            risk_epsilon: 1e-12,
        }
    }
}
