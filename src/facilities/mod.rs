//! Nearby facilities: the amenity query and the nearest-facility workflow.

mod locator;
mod overpass;

pub use locator::FacilityLocator;
pub use overpass::{FacilitySource, OverpassClient, DEFAULT_OVERPASS_URL};
