use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::analyzer::RiskLevel;
use crate::coord::Coordinate;
use crate::engine::RoutingEngine;
use crate::error::Error;
use crate::planner::{RouteKind, RoutePlanner, RouteVariant};
use crate::safety::RiskZone;

// Shared state for concurrency
pub struct AppState<E> {
    pub planner: RoutePlanner<E>,
}

pub fn router<E: RoutingEngine + 'static>(state: Arc<AppState<E>>) -> Router {
    // Allows a local map page to talk to this API
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/v1/routes", post(calculate_routes::<E>))
        .route("/api/v1/zones", get(list_zones::<E>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// --- API DTOs ---

#[derive(Debug, Deserialize, Serialize)]
pub struct RouteRequest {
    pub source: Coordinate,
    pub destination: Coordinate,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RoutesResponse {
    pub routes: Vec<RouteDto>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RouteDto {
    pub id: RouteKind,
    pub distance_km: f64,
    pub duration_minutes: u32,
    pub safety_score: u8,
    pub risk_level: RiskLevel,
    pub geometry: GeoJsonLineString,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GeoJsonLineString {
    pub r#type: String,
    pub coordinates: Vec<[f64; 2]>, // [lng, lat] standard for GeoJSON
}

impl From<RouteVariant> for RouteDto {
    fn from(route: RouteVariant) -> Self {
        Self {
            id: route.id,
            distance_km: route.distance_km,
            duration_minutes: route.duration_minutes,
            safety_score: route.safety_score,
            risk_level: route.risk_level,
            geometry: GeoJsonLineString {
                r#type: "LineString".to_string(),
                coordinates: route.path.iter().map(Coordinate::to_lng_lat).collect(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub struct ApiError(Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            Error::InvalidCoordinate { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

fn validate(c: &Coordinate) -> Result<(), ApiError> {
    if c.is_valid() {
        Ok(())
    } else {
        Err(ApiError(Error::InvalidCoordinate {
            lat: c.lat,
            lng: c.lng,
        }))
    }
}

// --- Handlers ---

async fn calculate_routes<E: RoutingEngine + 'static>(
    State(state): State<Arc<AppState<E>>>,
    Json(payload): Json<RouteRequest>,
) -> Result<Json<RoutesResponse>, ApiError> {
    validate(&payload.source)?;
    validate(&payload.destination)?;

    info!(
        source = ?payload.source,
        destination = ?payload.destination,
        "handling route request"
    );

    let routes = state
        .planner
        .compute_routes(payload.source, payload.destination)
        .await;

    Ok(Json(RoutesResponse {
        routes: routes.into_iter().map(RouteDto::from).collect(),
    }))
}

async fn list_zones<E: RoutingEngine + 'static>(
    State(state): State<Arc<AppState<E>>>,
) -> Json<Vec<RiskZone>> {
    Json(state.planner.zones().zones().to_vec())
}
