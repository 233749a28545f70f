//! Minimum-distance search over a candidate set.

use crate::models::{Coordinate, Facility, Zone};

/// Anything with a position on the map
pub trait Located {
    fn location(&self) -> Coordinate;
}

impl Located for Facility {
    fn location(&self) -> Coordinate {
        self.location
    }
}

impl Located for Zone {
    fn location(&self) -> Coordinate {
        self.center()
    }
}

impl Located for Coordinate {
    fn location(&self) -> Coordinate {
        *self
    }
}

/// The closest candidate and its distance in meters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest<'a, T> {
    pub item: &'a T,
    pub distance_m: f64,
}

/// Closest candidate to `point`, or `None` for an empty candidate set.
///
/// Ties keep the first candidate encountered, so the result is deterministic
/// for a given input order.
pub fn find_nearest<'a, T: Located>(point: &Coordinate, candidates: &'a [T]) -> Option<Nearest<'a, T>> {
    find_nearest_by(candidates, |c| point.distance_to(&c.location()))
}

/// Same scan with a caller-supplied distance function
pub(crate) fn find_nearest_by<'a, T, F>(candidates: &'a [T], mut distance: F) -> Option<Nearest<'a, T>>
where
    F: FnMut(&T) -> f64,
{
    let mut best: Option<Nearest<'a, T>> = None;

    for item in candidates {
        let d = distance(item);
        // Strict comparison: ties keep the earlier item and NaN never wins
        let closer = match &best {
            Some(b) => d < b.distance_m,
            None => !d.is_nan(),
        };
        if closer {
            best = Some(Nearest {
                item,
                distance_m: d,
            });
        }
    }

    best
}
