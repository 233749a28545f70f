//! Client configuration, loaded from a TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration for the Raipur dataset.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::facilities::DEFAULT_OVERPASS_URL;
use crate::models::{Coordinate, FacilityKind, GeoBbox};
use crate::proximity::ZONE_RADIUS_METERS;
use crate::routing::{DEFAULT_NOMINATIM_URL, DEFAULT_OSRM_URL};
use crate::weather::DEFAULT_WEATHER_URL;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ClientConfig {
    pub server: ServerConfig,
    pub map: MapConfig,
    pub tracking: TrackingConfig,
    pub facilities: FacilitiesConfig,
    pub routing: RoutingConfig,
    pub weather: WeatherConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// Root of the zone server (`/zones` is resolved against it)
    pub base_url: String,
    /// User-Agent sent to every remote service
    pub user_agent: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000/".to_string(),
            user_agent: concat!("zonewatch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub initial_center: Coordinate,
    pub initial_zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_center: Coordinate::new(21.2375, 81.6400),
            initial_zoom: 13,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TrackingConfig {
    pub zone_radius_m: f64,
    /// Accuracy circle radius when the sensor reports none
    pub default_accuracy_m: f64,
    /// Minimum zoom while following the live position
    pub tracking_zoom: u8,
    /// View shown when the sensor fails before the first fix
    pub fallback_center: Coordinate,
    pub fallback_zoom: u8,
    /// Samples older than this are dropped
    pub max_age_ms: u64,
    /// Longest wait for the next sample before reporting a timeout
    pub timeout_ms: u64,
}

impl TrackingConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_millis(self.max_age_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            zone_radius_m: ZONE_RADIUS_METERS,
            default_accuracy_m: 25.0,
            tracking_zoom: 15,
            fallback_center: Coordinate::new(21.2514, 81.6296),
            fallback_zoom: 13,
            max_age_ms: 5_000,
            timeout_ms: 15_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FacilitiesConfig {
    pub overpass_url: String,
    /// City bounds searched for facilities
    pub bbox: GeoBbox,
    /// Facility looked up automatically after the first fix
    pub startup_kind: Option<String>,
}

impl FacilitiesConfig {
    pub fn startup_kind(&self) -> Option<FacilityKind> {
        self.startup_kind.as_deref().map(FacilityKind::from_tag)
    }
}

impl Default for FacilitiesConfig {
    fn default() -> Self {
        Self {
            overpass_url: DEFAULT_OVERPASS_URL.to_string(),
            bbox: GeoBbox::new(21.15, 81.60, 21.30, 81.65),
            startup_kind: Some("hospital".to_string()),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RoutingConfig {
    pub nominatim_url: String,
    pub osrm_url: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            nominatim_url: DEFAULT_NOMINATIM_URL.to_string(),
            osrm_url: DEFAULT_OSRM_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WeatherConfig {
    pub url: String,
    /// Weather lookups are skipped when unset
    pub api_key: Option<String>,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WEATHER_URL.to_string(),
            api_key: None,
        }
    }
}

impl ClientConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: ClientConfig =
            toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}
