//! Fixed-radius zone membership.

use tracing::trace;

use crate::models::{Coordinate, Zone};

/// A point within this distance of a zone centre is inside the zone
pub const ZONE_RADIUS_METERS: f64 = 1550.0;

/// First zone (in dataset order) whose centre is within [`ZONE_RADIUS_METERS`].
pub fn match_zone<'a>(point: &Coordinate, zones: &'a [Zone]) -> Option<&'a Zone> {
    match_zone_within(point, zones, ZONE_RADIUS_METERS)
}

/// First zone (in dataset order) whose centre is at most `radius_m` away.
///
/// Overlapping zones resolve to whichever is listed first, even when a later
/// one is closer. The boundary is inclusive.
pub fn match_zone_within<'a>(
    point: &Coordinate,
    zones: &'a [Zone],
    radius_m: f64,
) -> Option<&'a Zone> {
    zones.iter().find(|zone| {
        let distance = point.distance_to(&zone.center());
        trace!(zone = %zone.key(), distance, "zone distance");
        distance <= radius_m
    })
}
