//! JSON HTTP API over a loaded network.
//!
//! Serves stations, edges, hubs and route comparisons.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
