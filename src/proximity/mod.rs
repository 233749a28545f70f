//! Proximity lookups: zone membership and nearest candidate.
//!
//! Both are plain linear scans over small, already fetched sets and have no
//! side effects.

mod matcher;
mod nearest;

pub use matcher::{match_zone, match_zone_within, ZONE_RADIUS_METERS};
pub use nearest::{find_nearest, Located, Nearest};
