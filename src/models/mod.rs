//! Core data models for the tracking client.

pub mod coordinate;
pub mod facility;
pub mod route;
pub mod zone;

pub use coordinate::{Coordinate, GeoBbox};
pub use facility::{Facility, FacilityKind};
pub use route::{Route, RouteSession};
pub use zone::{RiskBand, Zone, ZoneKey};
