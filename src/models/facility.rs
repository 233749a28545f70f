//! Emergency/utility facilities returned by the amenity query.

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Amenity type of a facility (OSM `amenity=*` value)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityKind {
    Hospital,
    Police,
    FireStation,
    Atm,
    /// Any other amenity tag, kept verbatim
    Other(String),
}

impl FacilityKind {
    /// Parse an amenity tag; unknown tags become `Other`
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "hospital" => FacilityKind::Hospital,
            "police" => FacilityKind::Police,
            "fire_station" => FacilityKind::FireStation,
            "atm" => FacilityKind::Atm,
            other => FacilityKind::Other(other.to_string()),
        }
    }

    /// The OSM amenity tag value
    pub fn tag(&self) -> &str {
        match self {
            FacilityKind::Hospital => "hospital",
            FacilityKind::Police => "police",
            FacilityKind::FireStation => "fire_station",
            FacilityKind::Atm => "atm",
            FacilityKind::Other(tag) => tag,
        }
    }

    /// Human label: tag with underscores as spaces
    pub fn label(&self) -> String {
        self.tag().replace('_', " ")
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            FacilityKind::Hospital => "🏥",
            FacilityKind::Police => "👮",
            FacilityKind::FireStation => "🚒",
            FacilityKind::Atm => "🏧",
            FacilityKind::Other(_) => "📍",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            FacilityKind::Hospital => "#ef5350",
            FacilityKind::Police => "#42a5f5",
            FacilityKind::FireStation => "#ff7043",
            FacilityKind::Atm => "#ab47bc",
            FacilityKind::Other(_) => "#90a4ae",
        }
    }
}

impl std::fmt::Display for FacilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

impl std::str::FromStr for FacilityKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FacilityKind::from_tag(s))
    }
}

/// A single facility. Ephemeral: fetched per query, never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub location: Coordinate,
    pub kind: FacilityKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Facility {
    /// Display name, falling back to the upper-cased kind label
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.kind.label().to_uppercase())
    }
}
