//! Route safety scoring against danger-zone proximity.

use serde::{Deserialize, Serialize};

use crate::coord::Coordinate;
use crate::error::{Error, Result};
use crate::safety::SafetyMap;

/// Every Nth polyline point is scored.
pub const SAMPLE_STRIDE: usize = 10;
/// Danger zones closer than this contribute a penalty.
pub const PENALTY_RADIUS_METERS: f64 = 1200.0;
pub const PENALTY_MULTIPLIER: f64 = 5.0;
/// A perfect 100 is never reported.
pub const MAX_SCORE: u8 = 98;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Safe,
    Moderate,
    Risky,
}

impl RiskLevel {
    pub fn from_score(score: i64) -> Self {
        if score > 75 {
            RiskLevel::Safe
        } else if score > 45 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Risky
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetyAnalysis {
    pub overall_score: u8,
    pub risk_level: RiskLevel,
}

/// Score a realized path by sampling it and penalizing proximity to danger zones.
pub fn analyze(path: &[Coordinate], zones: &SafetyMap) -> Result<SafetyAnalysis> {
    let samples: Vec<&Coordinate> = path.iter().step_by(SAMPLE_STRIDE).collect();
    if samples.is_empty() {
        return Err(Error::EmptyPath);
    }

    let total: f64 = samples
        .iter()
        .map(|point| {
            let penalty: f64 = zones
                .danger_zones_within(point, PENALTY_RADIUS_METERS)
                .iter()
                .map(|zone| zone.risk * PENALTY_MULTIPLIER)
                .sum();
            (100.0 - penalty).max(0.0)
        })
        .sum();

    let score = (total / samples.len() as f64).round() as i64;
    Ok(SafetyAnalysis {
        overall_score: score.clamp(0, MAX_SCORE as i64) as u8,
        risk_level: RiskLevel::from_score(score),
    })
}
