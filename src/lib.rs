//! Zonewatch - live crime-zone tracking for a map client
//!
//! This library provides the proximity matching and state-deduplication engine
//! shared by the `tracker` client and the `zone-server` binary.

pub mod config;
pub mod dataset;
pub mod error;
pub mod facilities;
pub mod models;
pub mod proximity;
pub mod render;
pub mod routing;
pub mod session;
pub mod surface;
pub mod tracking;
pub mod weather;
pub mod zones;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{MapError, SensorError};
pub use models::{Coordinate, Facility, FacilityKind, Zone, ZoneKey};
pub use session::MapSession;
