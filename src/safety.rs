use std::path::Path;

use rstar::{RTree, primitives::GeomWithData};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::coord::{Coordinate, EARTH_RADIUS_METERS};
use crate::error::{Error, Result};

/// Effective safety class of a zone. Exactly one per zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneClass {
    Danger,
    Moderate,
    Safe,
}

impl ZoneClass {
    /// Collapse the persisted `is_safe` / `is_moderate` flag pair.
    /// A zone flagged moderate but not safe has no valid class.
    pub fn from_flags(is_safe: bool, is_moderate: bool) -> Option<Self> {
        match (is_safe, is_moderate) {
            (false, false) => Some(ZoneClass::Danger),
            (true, true) => Some(ZoneClass::Moderate),
            (true, false) => Some(ZoneClass::Safe),
            (false, true) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskZone {
    pub name: String,
    #[serde(flatten)]
    pub coordinate: Coordinate,
    pub risk: f64,
    pub class: ZoneClass,
}

/// Zone record in its persisted two-flag shape.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneRecord {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub risk: f64,
    pub is_safe: bool,
    #[serde(default)]
    pub is_moderate: bool,
}

impl TryFrom<ZoneRecord> for RiskZone {
    type Error = Error;

    fn try_from(record: ZoneRecord) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidZone {
            name: record.name.clone(),
            reason: reason.to_string(),
        };

        let class = ZoneClass::from_flags(record.is_safe, record.is_moderate)
            .ok_or_else(|| invalid("flagged moderate without being safe"))?;
        if !record.risk.is_finite() || record.risk < 0.0 {
            return Err(invalid("risk score must be finite and non-negative"));
        }
        let coordinate = Coordinate::new(record.lat, record.lng);
        if !coordinate.is_valid() {
            return Err(invalid("coordinate out of range"));
        }

        Ok(RiskZone {
            name: record.name,
            coordinate,
            risk: record.risk,
            class,
        })
    }
}

// Visakhapatnam reference data: (name, lat, lng, risk, class)
const VISAKHAPATNAM: &[(&str, f64, f64, f64, ZoneClass)] = &[
    ("Beach Road", 17.7142, 83.3235, 11.0, ZoneClass::Danger),
    ("Dwarakanagar", 17.7265, 83.3013, 9.07, ZoneClass::Danger),
    ("Vizianagaram", 18.1067, 83.3955, 8.44, ZoneClass::Danger),
    ("Kancharapalem", 17.7303, 83.2801, 7.89, ZoneClass::Danger),
    ("Gajuwaka", 17.6896, 83.2085, 7.84, ZoneClass::Danger),
    ("One Town", 17.6975, 83.2974, 7.12, ZoneClass::Danger),
    ("Maddilapalem", 17.7356, 83.3164, 5.88, ZoneClass::Danger),
    ("MVP Colony", 17.7436, 83.3304, 6.93, ZoneClass::Danger),
    ("NAD", 17.7441, 83.2505, 2.1, ZoneClass::Moderate),
    ("Akkayapalem", 17.7289, 83.2986, 2.85, ZoneClass::Moderate),
    ("PM Palem", 17.7947, 83.3444, 2.53, ZoneClass::Moderate),
    ("Siripuram", 17.7222, 83.315, 1.13, ZoneClass::Safe),
    ("Tagarapuvalasa", 17.9304, 83.4257, 1.2, ZoneClass::Safe),
    ("Arilova", 17.7705, 83.3283, 1.81, ZoneClass::Safe),
    ("Sheelanagar", 17.7029, 83.2291, 1.39, ZoneClass::Safe),
];

type DangerEntry = GeomWithData<[f64; 2], usize>;

/// Immutable risk-zone catalog.
///
/// Danger zones are additionally indexed in an R-tree keyed on `[lng, lat]`
/// so radius queries only run haversine on nearby candidates.
pub struct SafetyMap {
    zones: Vec<RiskZone>,
    danger_index: RTree<DangerEntry>,
}

impl SafetyMap {
    pub fn new(zones: Vec<RiskZone>) -> Self {
        let entries = zones
            .iter()
            .enumerate()
            .filter(|(_, z)| z.class == ZoneClass::Danger)
            .map(|(i, z)| GeomWithData::new(z.coordinate.to_lng_lat(), i))
            .collect();

        Self {
            zones,
            danger_index: RTree::bulk_load(entries),
        }
    }

    /// The compiled-in Visakhapatnam catalog.
    pub fn visakhapatnam() -> Self {
        let zones = VISAKHAPATNAM
            .iter()
            .map(|&(name, lat, lng, risk, class)| RiskZone {
                name: name.to_string(),
                coordinate: Coordinate::new(lat, lng),
                risk,
                class,
            })
            .collect();
        Self::new(zones)
    }

    pub fn from_records(records: Vec<ZoneRecord>) -> Result<Self> {
        let zones = records
            .into_iter()
            .map(RiskZone::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(zones))
    }

    /// Parse a JSON array of zone records.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let records: Vec<ZoneRecord> = serde_json::from_str(json)?;
        Self::from_records(records)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let map = Self::from_json_str(&std::fs::read_to_string(path)?)?;
        info!(path = %path.display(), zones = map.zones.len(), "loaded safety zones");
        Ok(map)
    }

    pub fn zones(&self) -> &[RiskZone] {
        &self.zones
    }

    pub fn danger_zones(&self) -> impl Iterator<Item = &RiskZone> {
        self.of_class(ZoneClass::Danger)
    }

    pub fn safe_zones(&self) -> impl Iterator<Item = &RiskZone> {
        self.of_class(ZoneClass::Safe)
    }

    pub fn moderate_zones(&self) -> impl Iterator<Item = &RiskZone> {
        self.of_class(ZoneClass::Moderate)
    }

    fn of_class(&self, class: ZoneClass) -> impl Iterator<Item = &RiskZone> {
        self.zones.iter().filter(move |z| z.class == class)
    }

    /// Danger zones strictly closer than `radius_meters`, in catalog order.
    pub fn danger_zones_within(&self, point: &Coordinate, radius_meters: f64) -> Vec<&RiskZone> {
        // Degree-space search disc that is guaranteed to contain the haversine disc.
        let lat_span = (radius_meters / EARTH_RADIUS_METERS).to_degrees() * 1.5;
        let lng_span = (lat_span / point.lat.to_radians().cos().max(1e-6)).min(360.0);
        let max_squared = lat_span * lat_span + lng_span * lng_span;

        // Near the antimeridian the disc wraps; search the shifted copies as well.
        let mut centers = vec![point.lng];
        if point.lng - lng_span < -180.0 {
            centers.push(point.lng + 360.0);
        }
        if point.lng + lng_span > 180.0 {
            centers.push(point.lng - 360.0);
        }

        let mut hits: Vec<usize> = centers
            .into_iter()
            .flat_map(|lng| {
                self.danger_index
                    .locate_within_distance([lng, point.lat], max_squared)
                    .map(|entry| entry.data)
            })
            .filter(|&i| self.zones[i].coordinate.distance_to(point) < radius_meters)
            .collect();
        hits.sort_unstable();
        hits.dedup();
        hits.into_iter().map(|i| &self.zones[i]).collect()
    }
}

impl Default for SafetyMap {
    fn default() -> Self {
        Self::visakhapatnam()
    }
}
