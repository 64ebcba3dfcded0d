//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::graph::{StationGraph, StationKey};
use crate::routing::{RouteError, RouteRequest};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/stations", get(list_stations))
        .route("/api/edges", get(list_edges))
        .route("/api/hubs", get(list_hubs))
        .route("/api/route", get(route))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::from_network(&state.network))
}

/// Every station with coordinates and scores.
async fn list_stations(State(state): State<AppState>) -> Json<StationsResponse> {
    let ranking = state.network.ranking();
    let stations = state
        .network
        .graph()
        .nodes()
        .iter()
        .map(|node| StationResult::from_node(node, ranking))
        .collect();
    Json(StationsResponse { stations })
}

/// Every station edge with endpoint coordinates.
async fn list_edges(State(state): State<AppState>) -> Json<EdgesResponse> {
    let graph = state.network.graph();
    let edges = (0..graph.edge_count())
        .map(|i| EdgeResult::from_graph(graph, i))
        .collect();
    Json(EdgesResponse { edges })
}

/// Top stations by PageRank.
async fn list_hubs(
    State(state): State<AppState>,
    Query(req): Query<HubsRequest>,
) -> Json<HubsResponse> {
    Json(hubs(&state, req.k.unwrap_or(state.route.top_k)))
}

fn hubs(state: &AppState, k: usize) -> HubsResponse {
    let graph = state.network.graph();
    let ranking = state.network.ranking();
    let hubs = ranking
        .top_hubs(k)
        .into_iter()
        .filter_map(|(key, _)| graph.position(&key))
        .enumerate()
        .map(|(i, pos)| HubResult {
            rank: i + 1,
            station: StationResult::from_node(graph.node(pos), ranking),
        })
        .collect();
    HubsResponse { hubs }
}

/// Fastest and robust routes between two stations.
async fn route(
    State(state): State<AppState>,
    Query(req): Query<RouteRequestParams>,
) -> Result<Json<RouteResponse>, AppError> {
    plan_route(&state, &req).map(Json)
}

fn plan_route(state: &AppState, req: &RouteRequestParams) -> Result<RouteResponse, AppError> {
    let graph = state.network.graph();
    let request = RouteRequest {
        origin: resolve_station(graph, &req.src)?,
        destination: resolve_station(graph, &req.dst)?,
        lambda: req.lambda.unwrap_or(state.route.lambda),
        top_k: req.top_k.unwrap_or(state.route.top_k),
    };

    let comparison = state.network.route(&request)?;
    Ok(RouteResponse::from_comparison(&comparison, graph))
}

/// Match a station by key, then by exact display name.
fn resolve_station(graph: &StationGraph, query: &str) -> Result<StationKey, AppError> {
    let query = query.trim();
    graph
        .lookup(query)
        .map(|i| graph.node(i).key.clone())
        .ok_or_else(|| AppError::from(RouteError::UnknownStation(query.to_string())))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
}

impl From<RouteError> for AppError {
    fn from(e: RouteError) -> Self {
        match e {
            RouteError::UnknownStation(_) | RouteError::NoPath { .. } => AppError::NotFound {
                message: e.to_string(),
            },
            RouteError::InvalidPenalty(_) => AppError::BadRequest {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
        };

        warn!(%status, %message, "request failed");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
