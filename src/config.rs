use std::path::PathBuf;
use std::time::Duration;

use crate::engine::DEFAULT_OSRM_URL;
use crate::logging::LoggingConfig;

/// Service configuration, read from the environment.
///
/// - `SERVICE_PORT` (default 3000)
/// - `OSRM_URL` (default: public OSRM driving profile)
/// - `ROUTING_TIMEOUT_SECS` per engine call (default 10)
/// - `SAFETY_ZONES_PATH` optional JSON zone records; built-in catalog otherwise
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub port: u16,
    pub osrm_url: String,
    pub routing_timeout: Duration,
    pub zones_path: Option<PathBuf>,
    pub logging: LoggingConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            osrm_url: DEFAULT_OSRM_URL.to_string(),
            routing_timeout: Duration::from_secs(10),
            zones_path: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparsable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: lookup("SERVICE_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            osrm_url: lookup("OSRM_URL").unwrap_or(defaults.osrm_url),
            routing_timeout: lookup("ROUTING_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.routing_timeout),
            zones_path: lookup("SAFETY_ZONES_PATH").map(PathBuf::from),
            logging: LoggingConfig::from_lookup(&lookup),
        }
    }
}
