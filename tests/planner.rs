mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{GAJUWAKA, MockEngine, SHEELANAGAR, SIRIPURAM};
use saferoute::{
    Coordinate, Error, RiskLevel, RiskZone, RouteKind, RoutePlanner, RouteVariant, SafetyMap,
    ZoneClass,
};

fn build_planner(engine: MockEngine, zones: SafetyMap) -> RoutePlanner<MockEngine> {
    RoutePlanner::new(engine, Arc::new(zones))
}

fn catalog_without(class: ZoneClass) -> SafetyMap {
    let zones: Vec<RiskZone> = SafetyMap::visakhapatnam()
        .zones()
        .iter()
        .filter(|z| z.class != class)
        .cloned()
        .collect();
    SafetyMap::new(zones)
}

fn assert_ordered(routes: &[RouteVariant]) {
    assert_eq!(routes.len(), 3);
    let ids: Vec<_> = routes.iter().map(|r| r.id).collect();
    assert_eq!(
        ids,
        vec![RouteKind::Safest, RouteKind::Fastest, RouteKind::Optimized]
    );
    let (safest, fastest, optimized) = (&routes[0], &routes[1], &routes[2]);

    assert!(safest.safety_score > optimized.safety_score);
    assert!(optimized.safety_score > fastest.safety_score);
    assert!(safest.safety_score <= 98);

    assert_eq!(safest.risk_level, RiskLevel::Safe);
    assert_eq!(optimized.risk_level, RiskLevel::Safe);
    assert_ne!(fastest.risk_level, RiskLevel::Risky);

    for route in routes {
        assert!(route.distance_km > 0.0);
        assert!(route.duration_minutes > 0);
        assert!(!route.path.is_empty());
    }

    let (f, s, o) = (fastest.distance_km, safest.distance_km, optimized.distance_km);
    let averaged = ((f + s) / 2.0 * 10.0).round() / 10.0;
    assert!((f < o && o < s) || o == averaged, "f={f} o={o} s={s}");
}

#[tokio::test]
async fn siripuram_to_gajuwaka_yields_three_ordered_routes() {
    let planner = build_planner(MockEngine::default(), SafetyMap::visakhapatnam());
    let routes = planner.compute_routes(SIRIPURAM, GAJUWAKA).await;

    assert_ordered(&routes);
    // Safest route is forced through the nearest safe haven.
    assert!(routes[0].path.contains(&SHEELANAGAR));
    // Fastest is the direct request.
    assert_eq!(routes[1].path.first(), Some(&SIRIPURAM));
    assert_eq!(routes[1].path.last(), Some(&GAJUWAKA));
}

#[tokio::test]
async fn direct_route_failure_returns_nothing() {
    let engine = MockEngine {
        fail_direct: true,
        ..Default::default()
    };
    let planner = build_planner(engine, SafetyMap::visakhapatnam());
    assert!(planner.compute_routes(SIRIPURAM, GAJUWAKA).await.is_empty());

    let err = planner
        .try_compute_routes(SIRIPURAM, GAJUWAKA)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RoutingEngineUnavailable { .. }));
}

#[tokio::test]
async fn missing_safe_zones_degrade_to_direct_request() {
    let planner = build_planner(MockEngine::default(), catalog_without(ZoneClass::Safe));
    let routes = planner.compute_routes(SIRIPURAM, GAJUWAKA).await;
    assert_ordered(&routes);

    let calls = planner.engine().calls();
    // Direct plus the degraded safe request; only the optimized route uses a waypoint.
    assert_eq!(calls.iter().filter(|c| c.len() == 2).count(), 2);
    assert_eq!(calls.iter().filter(|c| c.len() == 3).count(), 1);
    assert_eq!(routes[0].path, routes[1].path);
}

#[tokio::test]
async fn failed_waypoint_requests_fall_back_to_direct() {
    let engine = MockEngine {
        fail_via: true,
        ..Default::default()
    };
    let planner = build_planner(engine, SafetyMap::visakhapatnam());
    let routes = planner.compute_routes(SIRIPURAM, GAJUWAKA).await;
    assert_ordered(&routes);

    let calls = planner.engine().calls();
    assert_eq!(calls.iter().filter(|c| c.len() == 3).count(), 2);
    assert_eq!(calls.iter().filter(|c| c.len() == 2).count(), 3);
    assert_eq!(routes[1].distance_km, routes[2].distance_km);
}

#[tokio::test]
async fn missing_moderate_zones_use_synthetic_waypoint() {
    let planner = build_planner(MockEngine::default(), catalog_without(ZoneClass::Moderate));
    let routes = planner.compute_routes(SIRIPURAM, GAJUWAKA).await;
    assert_ordered(&routes);

    let safest_path = &routes[0].path;
    let expected = SIRIPURAM.midpoint(&safest_path[safest_path.len() / 2]);
    let vias: Vec<Coordinate> = planner
        .engine()
        .calls()
        .iter()
        .filter(|c| c.len() == 3)
        .map(|c| c[1])
        .collect();
    assert_eq!(vias, vec![SHEELANAGAR, expected]);
}

#[tokio::test]
async fn slow_engine_times_out() {
    let engine = MockEngine {
        delay: Some(Duration::from_millis(300)),
        ..Default::default()
    };
    let planner = build_planner(engine, SafetyMap::visakhapatnam())
        .with_call_timeout(Duration::from_millis(20));
    assert!(planner.compute_routes(SIRIPURAM, GAJUWAKA).await.is_empty());
}

#[tokio::test]
async fn timed_out_waypoint_requests_fall_back_to_direct() {
    let engine = MockEngine {
        delay_via: Some(Duration::from_millis(300)),
        ..Default::default()
    };
    let planner = build_planner(engine, SafetyMap::visakhapatnam())
        .with_call_timeout(Duration::from_millis(50));
    let routes = planner.compute_routes(SIRIPURAM, GAJUWAKA).await;
    assert_ordered(&routes);

    let calls = planner.engine().calls();
    let vias: Vec<Coordinate> = calls
        .iter()
        .filter(|c| c.len() == 3)
        .map(|c| c[1])
        .collect();
    assert_eq!(vias.len(), 2);
    assert!(vias.contains(&SHEELANAGAR));
    // Initial direct request plus one direct fallback per timed-out waypoint request.
    assert_eq!(calls.iter().filter(|c| c.len() == 2).count(), 3);
    for route in &routes {
        assert_eq!(route.path, routes[1].path);
    }
}
