#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use saferoute::{Coordinate, EngineError, EngineRoute, RoutingEngine, haversine_distance};

pub const SIRIPURAM: Coordinate = Coordinate::new(17.7222, 83.315);
pub const GAJUWAKA: Coordinate = Coordinate::new(17.6896, 83.2085);
pub const SHEELANAGAR: Coordinate = Coordinate::new(17.7029, 83.2291);

/// Scripted engine that draws densified straight lines through the requested points.
#[derive(Default)]
pub struct MockEngine {
    pub calls: Mutex<Vec<Vec<Coordinate>>>,
    pub fail_direct: bool,
    pub fail_via: bool,
    pub delay: Option<Duration>,
    /// Applies to waypoint (3+ point) requests only.
    pub delay_via: Option<Duration>,
}

impl MockEngine {
    pub fn calls(&self) -> Vec<Vec<Coordinate>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_with(&self, points: usize) -> usize {
        self.calls().iter().filter(|c| c.len() == points).count()
    }
}

impl RoutingEngine for MockEngine {
    async fn route(&self, points: &[Coordinate]) -> Result<EngineRoute, EngineError> {
        self.calls.lock().unwrap().push(points.to_vec());
        let delay = if points.len() == 2 {
            self.delay
        } else {
            self.delay.or(self.delay_via)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failing = if points.len() == 2 {
            self.fail_direct
        } else {
            self.fail_via
        };
        if failing {
            return Err(EngineError::NoRoute {
                code: "NoRoute".into(),
            });
        }
        Ok(straight_route(points))
    }
}

pub fn straight_route(points: &[Coordinate]) -> EngineRoute {
    const STEPS: usize = 40;
    let mut path = Vec::new();
    let mut distance = 0.0;
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        distance += haversine_distance(&a, &b);
        for i in 0..STEPS {
            let t = i as f64 / STEPS as f64;
            path.push(Coordinate::new(
                a.lat + (b.lat - a.lat) * t,
                a.lng + (b.lng - a.lng) * t,
            ));
        }
    }
    if let Some(last) = points.last() {
        path.push(*last);
    }
    EngineRoute {
        path,
        distance_meters: distance,
        // ~30 km/h
        duration_seconds: distance / 8.33,
    }
}
