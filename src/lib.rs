//! Safety-ranked route alternatives.
//!
//! Takes the single path an external routing engine produces between two
//! points and derives three ordered variants (safest, fastest, optimized),
//! scored by proximity to known danger zones.

pub mod analyzer;
pub mod api;
pub mod config;
pub mod coord;
pub mod engine;
pub mod error;
pub mod logging;
pub mod planner;
pub mod safety;
pub mod waypoint;

pub use analyzer::{RiskLevel, SafetyAnalysis, analyze};
pub use coord::{Coordinate, haversine_distance};
pub use engine::{EngineError, EngineRoute, OsrmClient, RoutingEngine};
pub use error::{Error, Result};
pub use planner::{RouteKind, RoutePlanner, RouteVariant, VariantScores, normalize_scores};
pub use safety::{RiskZone, SafetyMap, ZoneClass};
pub use waypoint::{select_forced_safe_waypoint, select_optimized_waypoint};
