//! Boundary to the external path-routing engine.

use std::future::Future;
use std::time::Duration;

use itertools::Itertools;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::coord::Coordinate;

pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org/route/v1/driving";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("routing engine timed out after {0:?}")]
    Timeout(Duration),
    #[error("no route found (code {code})")]
    NoRoute { code: String },
    #[error("invalid route: {0}")]
    InvalidRoute(String),
}

/// A realized road-following path.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineRoute {
    pub path: Vec<Coordinate>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

impl EngineRoute {
    /// Reject routes that would break downstream invariants.
    pub fn validate(self) -> Result<Self, EngineError> {
        if self.path.is_empty() {
            return Err(EngineError::InvalidRoute("empty geometry".into()));
        }
        if !(self.distance_meters.is_finite() && self.distance_meters > 0.0) {
            return Err(EngineError::InvalidRoute(format!(
                "distance {} m",
                self.distance_meters
            )));
        }
        if !(self.duration_seconds.is_finite() && self.duration_seconds > 0.0) {
            return Err(EngineError::InvalidRoute(format!(
                "duration {} s",
                self.duration_seconds
            )));
        }
        Ok(self)
    }
}

/// Turns an ordered list of points (at least two) into a realized route.
pub trait RoutingEngine: Send + Sync {
    fn route(
        &self,
        points: &[Coordinate],
    ) -> impl Future<Output = Result<EngineRoute, EngineError>> + Send;
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
    distance: f64,
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

/// OSRM `route` service client.
#[derive(Clone)]
pub struct OsrmClient {
    client: reqwest::Client,
    base_url: String,
}

impl OsrmClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Http(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn route_url(&self, points: &[Coordinate]) -> String {
        let coords = points
            .iter()
            .map(|p| format!("{},{}", p.lng, p.lat))
            .join(";");
        format!("{}/{}?overview=full&geometries=geojson", self.base_url, coords)
    }
}

fn parse_osrm(body: &str) -> Result<EngineRoute, EngineError> {
    let response: OsrmResponse = serde_json::from_str(body)
        .map_err(|e| EngineError::InvalidRoute(format!("malformed response: {e}")))?;

    let route = match (response.code.as_str(), response.routes.into_iter().next()) {
        ("Ok", Some(route)) => route,
        _ => return Err(EngineError::NoRoute { code: response.code }),
    };

    EngineRoute {
        path: route
            .geometry
            .coordinates
            .into_iter()
            .map(Coordinate::from_lng_lat)
            .collect(),
        distance_meters: route.distance,
        duration_seconds: route.duration,
    }
    .validate()
}

impl RoutingEngine for OsrmClient {
    async fn route(&self, points: &[Coordinate]) -> Result<EngineRoute, EngineError> {
        let url = self.route_url(points);
        debug!(url = %url, points = points.len(), "requesting route");

        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!(
                url = %url,
                error = %e,
                is_timeout = e.is_timeout(),
                "routing request failed"
            );
            EngineError::Http(format!("request failed: {e}"))
        })?;

        // OSRM answers NoRoute with a 400 and a JSON body, so parse regardless of status.
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EngineError::Http(format!("failed to read response: {e}")))?;

        parse_osrm(&body).inspect_err(|e| {
            warn!(
                url = %url,
                status = status.as_u16(),
                error = %e,
                "routing engine returned no usable route"
            );
        })
    }
}
