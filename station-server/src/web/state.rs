//! Application state for the web layer.

use std::sync::Arc;

use crate::network::Network;
use crate::routing::RouteConfig;

/// Shared application state.
///
/// The network is built once at startup and never mutated, so handlers
/// share it without locking.
#[derive(Clone)]
pub struct AppState {
    /// Station graph and ranking
    pub network: Arc<Network>,

    /// Defaults for route requests
    pub route: Arc<RouteConfig>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(network: Network, route: RouteConfig) -> Self {
        Self {
            network: Arc::new(network),
            route: Arc::new(route),
        }
    }
}
