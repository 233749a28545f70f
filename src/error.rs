//! Error kinds surfaced by the tracking client.
//!
//! Every variant is recovered at the boundary where it occurs and turned into a
//! single user notification via [`MapError::user_message`]. The `Display` text
//! carries the technical detail and is only meant for logs.

use thiserror::Error;

use crate::models::FacilityKind;
use crate::surface::Severity;

/// Remote resource a fetch was made against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Zones,
    Facilities,
    Geocoding,
    Route,
    Weather,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Resource::Zones => "zones",
            Resource::Facilities => "facilities",
            Resource::Geocoding => "geocoding",
            Resource::Route => "route",
            Resource::Weather => "weather",
        };
        f.write_str(s)
    }
}

/// What a lookup came back empty for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Destination(String),
    Facility(FacilityKind),
}

/// Failure reported by the location sensor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("timed out waiting for a position")]
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    /// Network error or non-success status
    #[error("failed to fetch {resource}: {reason}")]
    FetchFailed { resource: Resource, reason: String },

    #[error("no results for {0:?}")]
    NoResultsFound(Lookup),

    /// The device has no location sensor
    #[error("location sensor unsupported")]
    SensorUnavailable,

    #[error("location sensor error: {0}")]
    Sensor(#[from] SensorError),

    /// Action needs a live position before the first fix
    #[error("no live position yet")]
    OriginNotReady,

    #[error("empty input")]
    EmptyInput,

    /// A newer route request replaced this one before it resolved
    #[error("route request superseded")]
    Superseded,
}

impl MapError {
    pub fn fetch(resource: Resource, reason: impl std::fmt::Display) -> Self {
        MapError::FetchFailed {
            resource,
            reason: reason.to_string(),
        }
    }

    /// Domain-worded notification text
    pub fn user_message(&self) -> String {
        match self {
            MapError::FetchFailed { resource, .. } => match resource {
                Resource::Zones => "Failed to load zones.".to_string(),
                Resource::Facilities => "Unable to load facilities right now.".to_string(),
                Resource::Geocoding | Resource::Route => "Failed to fetch route!".to_string(),
                Resource::Weather => "Weather is unavailable right now.".to_string(),
            },
            MapError::NoResultsFound(Lookup::Destination(place)) => {
                format!("No results found for: {}", place)
            }
            MapError::NoResultsFound(Lookup::Facility(kind)) => {
                format!("No {} found in the city.", kind.label())
            }
            MapError::SensorUnavailable => "Geolocation not supported on this device.".to_string(),
            MapError::Sensor(_) => "Unable to access location. Using default view.".to_string(),
            MapError::OriginNotReady => "User location not available yet!".to_string(),
            MapError::EmptyInput => "Enter a destination!".to_string(),
            MapError::Superseded => "Route request replaced by a newer one.".to_string(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            MapError::FetchFailed { resource, .. } => match resource {
                Resource::Weather => Severity::Warn,
                _ => Severity::Error,
            },
            MapError::NoResultsFound(Lookup::Destination(_)) => Severity::Error,
            MapError::NoResultsFound(Lookup::Facility(_)) => Severity::Warn,
            MapError::SensorUnavailable
            | MapError::Sensor(_)
            | MapError::OriginNotReady
            | MapError::EmptyInput => Severity::Warn,
            MapError::Superseded => Severity::Info,
        }
    }
}
