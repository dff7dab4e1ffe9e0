//! Route orchestration: three engine requests, safety scoring, and the
//! normalization that keeps safest > optimized > fastest.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::analyzer::{MAX_SCORE, RiskLevel, analyze};
use crate::coord::Coordinate;
use crate::engine::{EngineError, EngineRoute, RoutingEngine};
use crate::error::{Error, Result};
use crate::safety::SafetyMap;
use crate::waypoint::{select_forced_safe_waypoint, select_optimized_waypoint};

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    Safest,
    Fastest,
    Optimized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteVariant {
    pub id: RouteKind,
    pub path: Vec<Coordinate>,
    pub distance_km: f64,
    pub duration_minutes: u32,
    pub safety_score: u8,
    pub risk_level: RiskLevel,
}

/// One safety score per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantScores {
    pub safest: i32,
    pub optimized: i32,
    pub fastest: i32,
}

/// Force a strict safest > optimized > fastest chain within `[0, 98]`.
///
/// Raw scores that already respect the ordering pass through untouched.
pub fn normalize_scores(raw: VariantScores) -> VariantScores {
    let max = MAX_SCORE as i32;
    let VariantScores {
        mut safest,
        mut optimized,
        mut fastest,
    } = raw;

    if safest <= optimized || safest <= fastest {
        safest = optimized.max(fastest) + 2;
    }
    safest = safest.min(max);
    if optimized <= fastest {
        optimized = fastest + 1;
    }
    optimized = optimized.min(safest - 1);
    fastest = fastest.min(optimized - 1);

    // A low safest score can push fastest below zero; lift the chain back onto the floor.
    if fastest < 0 {
        fastest = 0;
        optimized = optimized.max(1);
        safest = safest.max(2);
    }

    VariantScores {
        safest,
        optimized,
        fastest,
    }
}

/// Congestion multiplier, stepped by trip length.
pub fn traffic_factor(distance_km: f64) -> f64 {
    if distance_km < 12.0 {
        1.3
    } else if distance_km < 20.0 {
        1.45
    } else {
        2.2
    }
}

/// Meters to kilometers at 100 m resolution.
pub fn round_distance_km(distance_meters: f64) -> f64 {
    (distance_meters / 100.0).round() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripMetrics {
    pub distance_km: f64,
    pub duration_minutes: u32,
}

impl TripMetrics {
    pub fn from_engine(distance_meters: f64, duration_seconds: f64) -> Self {
        let distance_km = round_distance_km(distance_meters).max(0.1);
        let minutes = (duration_seconds / 60.0 * traffic_factor(distance_km)).round();
        Self {
            distance_km,
            duration_minutes: (minutes as u32).max(1),
        }
    }
}

/// Keep the optimized trip strictly between fastest and safest, otherwise
/// replace it with their average.
pub fn order_optimized_metrics(
    fastest: TripMetrics,
    safest: TripMetrics,
    optimized: TripMetrics,
) -> TripMetrics {
    if optimized.distance_km >= safest.distance_km || optimized.distance_km <= fastest.distance_km
    {
        TripMetrics {
            distance_km: ((fastest.distance_km + safest.distance_km) / 2.0 * 10.0).round() / 10.0,
            duration_minutes: ((fastest.duration_minutes + safest.duration_minutes) as f64 / 2.0)
                .round() as u32,
        }
    } else {
        optimized
    }
}

/// Drives the routing engine and ranks the resulting paths by safety.
pub struct RoutePlanner<E> {
    engine: E,
    zones: Arc<SafetyMap>,
    call_timeout: Duration,
}

impl<E: RoutingEngine> RoutePlanner<E> {
    pub fn new(engine: E, zones: Arc<SafetyMap>) -> Self {
        Self {
            engine,
            zones,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn zones(&self) -> &SafetyMap {
        &self.zones
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Routes in order `[safest, fastest, optimized]`, or empty when the
    /// direct route cannot be obtained.
    pub async fn compute_routes(
        &self,
        source: Coordinate,
        destination: Coordinate,
    ) -> Vec<RouteVariant> {
        match self.try_compute_routes(source, destination).await {
            Ok(routes) => routes.into(),
            Err(e) => {
                error!(error = %e, "route computation failed");
                Vec::new()
            }
        }
    }

    pub async fn try_compute_routes(
        &self,
        source: Coordinate,
        destination: Coordinate,
    ) -> Result<[RouteVariant; 3]> {
        let safe_via = select_forced_safe_waypoint(&self.zones, &source, &destination);
        let endpoints = [source, destination];
        let direct = self.request(&endpoints);
        let via_safe = self.request_via(RouteKind::Safest, source, safe_via, destination);

        let (fastest, safest, optimized) =
            match select_optimized_waypoint(&self.zones, &source, &destination) {
                Some(opt_via) => {
                    let via_opt =
                        self.request_via(RouteKind::Optimized, source, Some(opt_via), destination);
                    let (f, s, o) = tokio::join!(direct, via_safe, via_opt);
                    (f, s, Some(o))
                }
                None => {
                    let (f, s) = tokio::join!(direct, via_safe);
                    (f, s, None)
                }
            };

        let fastest = fastest.map_err(|source| Error::RoutingEngineUnavailable { source })?;
        let safest = or_fastest(RouteKind::Safest, safest, &fastest);
        let optimized = match optimized {
            Some(result) => result,
            None => {
                let via = synthetic_waypoint(&source, &destination, &safest.path);
                self.request_via(RouteKind::Optimized, source, Some(via), destination)
                    .await
            }
        };
        let optimized = or_fastest(RouteKind::Optimized, optimized, &fastest);

        let routes = assemble(fastest, safest, optimized, &self.zones)?;
        info!(
            safest = routes[0].safety_score,
            fastest = routes[1].safety_score,
            optimized = routes[2].safety_score,
            "routes computed"
        );
        Ok(routes)
    }

    async fn request(
        &self,
        points: &[Coordinate],
    ) -> std::result::Result<EngineRoute, EngineError> {
        match tokio::time::timeout(self.call_timeout, self.engine.route(points)).await {
            Ok(result) => result.and_then(EngineRoute::validate),
            Err(_) => Err(EngineError::Timeout(self.call_timeout)),
        }
    }

    /// Route through `via`, degrading to a direct request when there is no
    /// waypoint or the waypoint route fails.
    async fn request_via(
        &self,
        kind: RouteKind,
        source: Coordinate,
        via: Option<Coordinate>,
        destination: Coordinate,
    ) -> std::result::Result<EngineRoute, EngineError> {
        match via {
            Some(via) => match self.request(&[source, via, destination]).await {
                Ok(route) => return Ok(route),
                Err(e) => {
                    warn!(
                        route = ?kind,
                        error = %e,
                        "waypoint route failed, falling back to direct request"
                    );
                }
            },
            None => warn!(route = ?kind, "no waypoint available, requesting direct route"),
        }
        self.request(&[source, destination]).await
    }
}

fn or_fastest(
    kind: RouteKind,
    result: std::result::Result<EngineRoute, EngineError>,
    fastest: &EngineRoute,
) -> EngineRoute {
    result.unwrap_or_else(|e| {
        warn!(route = ?kind, error = %e, "fallback request failed, reusing direct route");
        fastest.clone()
    })
}

// Halfway between the source and the middle of the safest polyline.
fn synthetic_waypoint(
    source: &Coordinate,
    destination: &Coordinate,
    safest: &[Coordinate],
) -> Coordinate {
    safest
        .get(safest.len() / 2)
        .map_or_else(|| source.midpoint(destination), |mid| source.midpoint(mid))
}

fn assemble(
    fastest: EngineRoute,
    safest: EngineRoute,
    optimized: EngineRoute,
    zones: &SafetyMap,
) -> Result<[RouteVariant; 3]> {
    let scores = normalize_scores(VariantScores {
        safest: analyze(&safest.path, zones)?.overall_score as i32,
        optimized: analyze(&optimized.path, zones)?.overall_score as i32,
        fastest: analyze(&fastest.path, zones)?.overall_score as i32,
    });

    let f_trip = TripMetrics::from_engine(fastest.distance_meters, fastest.duration_seconds);
    let s_trip = TripMetrics::from_engine(safest.distance_meters, safest.duration_seconds);
    let o_trip = order_optimized_metrics(
        f_trip,
        s_trip,
        TripMetrics::from_engine(optimized.distance_meters, optimized.duration_seconds),
    );

    // The default route is never labelled risky.
    let fastest_level = if scores.fastest > 75 {
        RiskLevel::Safe
    } else {
        RiskLevel::Moderate
    };

    Ok([
        variant(
            RouteKind::Safest,
            safest.path,
            s_trip,
            scores.safest,
            RiskLevel::Safe,
        ),
        variant(
            RouteKind::Fastest,
            fastest.path,
            f_trip,
            scores.fastest,
            fastest_level,
        ),
        variant(
            RouteKind::Optimized,
            optimized.path,
            o_trip,
            scores.optimized,
            RiskLevel::Safe,
        ),
    ])
}

fn variant(
    id: RouteKind,
    path: Vec<Coordinate>,
    trip: TripMetrics,
    score: i32,
    risk_level: RiskLevel,
) -> RouteVariant {
    RouteVariant {
        id,
        path,
        distance_km: trip.distance_km,
        duration_minutes: trip.duration_minutes,
        safety_score: score.clamp(0, MAX_SCORE as i32) as u8,
        risk_level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(safest: i32, optimized: i32, fastest: i32) -> VariantScores {
        VariantScores {
            safest,
            optimized,
            fastest,
        }
    }

    fn assert_chain(s: VariantScores) {
        assert!(s.safest > s.optimized, "{s:?}");
        assert!(s.optimized > s.fastest, "{s:?}");
        assert!(s.safest <= 98 && s.fastest >= 0, "{s:?}");
    }

    #[test]
    fn ordered_scores_pass_through() {
        assert_eq!(normalize_scores(scores(90, 70, 50)), scores(90, 70, 50));
    }

    #[test]
    fn safest_not_above_optimized_is_lifted() {
        let s = normalize_scores(scores(60, 70, 50));
        assert_eq!(s, scores(72, 70, 50));
    }

    #[test]
    fn all_equal_scores() {
        let s = normalize_scores(scores(98, 98, 98));
        assert_eq!(s, scores(98, 97, 96));
    }

    #[test]
    fn optimized_not_above_fastest() {
        let s = normalize_scores(scores(90, 40, 60));
        assert_eq!(s, scores(90, 61, 60));
    }

    #[test]
    fn low_scores_stay_non_negative() {
        assert_eq!(normalize_scores(scores(1, 0, 0)), scores(2, 1, 0));
        assert_eq!(normalize_scores(scores(0, 0, 0)), scores(2, 1, 0));
    }

    #[test]
    fn chain_holds_across_grid() {
        for s in (0..=98).step_by(7) {
            for o in (0..=98).step_by(7) {
                for f in (0..=98).step_by(7) {
                    assert_chain(normalize_scores(scores(s, o, f)));
                }
            }
        }
    }

    #[test]
    fn traffic_factor_boundaries() {
        assert_eq!(traffic_factor(11.9), 1.3);
        assert_eq!(traffic_factor(12.0), 1.45);
        assert_eq!(traffic_factor(19.9), 1.45);
        assert_eq!(traffic_factor(20.0), 2.2);
    }

    #[test]
    fn distance_rounds_to_100m() {
        assert_eq!(round_distance_km(14_250.0), 14.3);
        assert_eq!(round_distance_km(14_249.0), 14.2);
        assert_eq!(round_distance_km(999.0), 1.0);
    }

    #[test]
    fn duration_applies_traffic_factor() {
        // 11.0 km, 20 min raw -> 26 min
        let trip = TripMetrics::from_engine(11_000.0, 1_200.0);
        assert_eq!(trip.distance_km, 11.0);
        assert_eq!(trip.duration_minutes, 26);
        // 25.0 km, 30 min raw -> 66 min
        let trip = TripMetrics::from_engine(25_000.0, 1_800.0);
        assert_eq!(trip.duration_minutes, 66);
    }

    #[test]
    fn optimized_between_bounds_is_kept() {
        let f = TripMetrics {
            distance_km: 10.0,
            duration_minutes: 20,
        };
        let s = TripMetrics {
            distance_km: 14.0,
            duration_minutes: 30,
        };
        let o = TripMetrics {
            distance_km: 12.0,
            duration_minutes: 27,
        };
        assert_eq!(order_optimized_metrics(f, s, o), o);
    }

    #[test]
    fn optimized_out_of_bounds_is_averaged() {
        let f = TripMetrics {
            distance_km: 10.0,
            duration_minutes: 20,
        };
        let s = TripMetrics {
            distance_km: 14.5,
            duration_minutes: 31,
        };
        let o = TripMetrics {
            distance_km: 16.0,
            duration_minutes: 40,
        };
        let averaged = order_optimized_metrics(f, s, o);
        assert_eq!(averaged.distance_km, 12.3);
        assert_eq!(averaged.duration_minutes, 26);

        let at_fastest = TripMetrics {
            distance_km: 10.0,
            duration_minutes: 20,
        };
        assert_eq!(order_optimized_metrics(f, s, at_fastest), averaged);
    }

    #[test]
    fn synthetic_waypoint_uses_safest_middle() {
        let src = Coordinate::new(0.0, 0.0);
        let dst = Coordinate::new(4.0, 4.0);
        let path = [
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 3.0),
            Coordinate::new(2.0, 2.0),
        ];
        assert_eq!(
            synthetic_waypoint(&src, &dst, &path),
            Coordinate::new(0.5, 1.5)
        );
        assert_eq!(synthetic_waypoint(&src, &dst, &[]), Coordinate::new(2.0, 2.0));
    }
}
