//! Route request defaults.

/// Defaults applied when a route request leaves parameters out.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteConfig {
    /// Risk penalty λ for the robust path, in seconds per unit of risk.
    pub lambda: f64,

    /// Number of top-PageRank stations counted as hubs.
    pub top_k: usize,
}

impl RouteConfig {
    pub fn new(lambda: f64, top_k: usize) -> Self {
        Self { lambda, top_k }
    }
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            lambda: 50.0,
            top_k: 10,
        }
    }
}
