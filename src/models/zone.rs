//! Crime-risk zone records as served by `/zones`.

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Fallback scale for the info panel bar when the record has no `max_crime_rate`
pub const DEFAULT_MAX_CRIME_RATE: f64 = 500.0;

/// A named locality with a crime-rate classification.
///
/// Field names follow the JSON records of the zone endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub locality: String,
    pub district: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub crime_rate_per_100k: f64,
    #[serde(default)]
    pub total_crimes: i64,
    #[serde(default)]
    pub safety_level: String,

    /// Precomputed bar colour (server side classification)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bar_color: Option<String>,

    /// Highest rate in the dataset, used to scale the bar
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_crime_rate: Option<f64>,

    /// Distance from the query point, only set on crime-info answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl Zone {
    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    pub fn key(&self) -> ZoneKey {
        ZoneKey {
            locality: self.locality.clone(),
            district: self.district.clone(),
        }
    }

    pub fn risk_band(&self) -> RiskBand {
        RiskBand::from_rate(self.crime_rate_per_100k)
    }

    /// Bar fill in percent, clamped to 0..=100
    pub fn bar_percent(&self) -> f64 {
        let max = self
            .max_crime_rate
            .filter(|m| *m > 0.0)
            .unwrap_or(DEFAULT_MAX_CRIME_RATE)
            .max(1.0);
        ((self.crime_rate_per_100k / max) * 100.0).clamp(0.0, 100.0)
    }

    /// Colour for the info panel bar: server-provided, else derived from the rate
    pub fn display_color(&self) -> &str {
        self.bar_color
            .as_deref()
            .unwrap_or_else(|| self.risk_band().zone_color())
    }
}

/// Identity of a zone within the dataset: `(locality, district)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ZoneKey {
    pub locality: String,
    pub district: String,
}

impl std::fmt::Display for ZoneKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.locality, self.district)
    }
}

/// Crime-rate classification per 100k inhabitants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBand {
    /// rate <= 200
    Low,
    /// rate <= 320
    Moderate,
    High,
}

impl RiskBand {
    pub fn from_rate(rate: f64) -> Self {
        if rate <= 200.0 {
            RiskBand::Low
        } else if rate <= 320.0 {
            RiskBand::Moderate
        } else {
            RiskBand::High
        }
    }

    /// Circle colour on the map
    pub fn zone_color(&self) -> &'static str {
        match self {
            RiskBand::Low => "green",
            RiskBand::Moderate => "yellow",
            RiskBand::High => "red",
        }
    }

    /// Bar colour reported by the crime-info endpoint
    pub fn bar_color(&self) -> &'static str {
        match self {
            RiskBand::Low => "green",
            RiskBand::Moderate => "orange",
            RiskBand::High => "red",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(rate: f64) -> Zone {
        Zone {
            locality: "Telibandha".to_string(),
            district: "Raipur".to_string(),
            latitude: 21.24,
            longitude: 81.66,
            crime_rate_per_100k: rate,
            total_crimes: 120,
            safety_level: "Moderate".to_string(),
            bar_color: None,
            max_crime_rate: None,
            distance_km: None,
        }
    }

    #[test]
    fn test_key_display() {
        assert_eq!(zone(10.0).key().to_string(), "Telibandha|Raipur");
    }

    #[test]
    fn test_risk_band_thresholds() {
        assert_eq!(RiskBand::from_rate(200.0), RiskBand::Low);
        assert_eq!(RiskBand::from_rate(200.1), RiskBand::Moderate);
        assert_eq!(RiskBand::from_rate(320.0), RiskBand::Moderate);
        assert_eq!(RiskBand::from_rate(321.0), RiskBand::High);
        assert_eq!(RiskBand::Moderate.zone_color(), "yellow");
        assert_eq!(RiskBand::Moderate.bar_color(), "orange");
    }

    #[test]
    fn test_bar_percent_uses_default_scale() {
        assert_eq!(zone(250.0).bar_percent(), 50.0);
        assert_eq!(zone(900.0).bar_percent(), 100.0);
        assert_eq!(zone(-5.0).bar_percent(), 0.0);
    }

    #[test]
    fn test_bar_percent_uses_dataset_max() {
        let mut z = zone(100.0);
        z.max_crime_rate = Some(400.0);
        assert_eq!(z.bar_percent(), 25.0);
    }

    #[test]
    fn test_display_color_prefers_server_value() {
        let mut z = zone(400.0);
        assert_eq!(z.display_color(), "red");
        z.bar_color = Some("orange".to_string());
        assert_eq!(z.display_color(), "orange");
    }

    #[test]
    fn test_deserialize_minimal_record() {
        let json = r#"{
            "locality": "Shankar Nagar",
            "district": "Raipur",
            "latitude": 21.2514,
            "longitude": 81.6296,
            "crime_rate_per_100k": 180.5,
            "total_crimes": 95,
            "safety_level": "Safe"
        }"#;
        let z: Zone = serde_json::from_str(json).unwrap();
        assert_eq!(z.locality, "Shankar Nagar");
        assert_eq!(z.total_crimes, 95);
        assert!(z.bar_color.is_none());
        assert_eq!(z.center(), Coordinate::new(21.2514, 81.6296));
    }
}
