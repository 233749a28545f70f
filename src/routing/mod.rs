//! Destination search and route overlay.

mod geocoder;
mod orchestrator;
mod router;

pub use geocoder::{GeocodeCandidate, Geocoder, NominatimGeocoder, DEFAULT_NOMINATIM_URL};
pub use orchestrator::RouteOrchestrator;
pub use router::{OsrmRouter, RouteService, DEFAULT_OSRM_URL};
