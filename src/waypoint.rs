//! Waypoint selection that biases the routing engine toward safer paths.

use crate::coord::Coordinate;
use crate::safety::{RiskZone, SafetyMap};

/// Safe-only zone nearest the naive midpoint of `source` and `destination`.
pub fn select_forced_safe_waypoint(
    zones: &SafetyMap,
    source: &Coordinate,
    destination: &Coordinate,
) -> Option<Coordinate> {
    nearest_to_midpoint(zones.safe_zones(), source, destination)
}

/// Moderate zone nearest the naive midpoint of `source` and `destination`.
pub fn select_optimized_waypoint(
    zones: &SafetyMap,
    source: &Coordinate,
    destination: &Coordinate,
) -> Option<Coordinate> {
    nearest_to_midpoint(zones.moderate_zones(), source, destination)
}

// Ties resolve to the earliest zone in catalog order.
fn nearest_to_midpoint<'a>(
    candidates: impl Iterator<Item = &'a RiskZone>,
    source: &Coordinate,
    destination: &Coordinate,
) -> Option<Coordinate> {
    let mid = source.midpoint(destination);
    candidates
        .map(|zone| (mid.distance_to(&zone.coordinate), zone))
        .min_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, zone)| zone.coordinate)
}
