//! Zone data: the remote source and the process-wide cache in front of it.

mod cache;
mod source;

pub use cache::ZoneCache;
pub use source::{HttpZoneSource, ZoneSource};
