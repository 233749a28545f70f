//! Server-side zone dataset loaded from CSV.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::Serialize;
use tracing::{info, warn};

use crate::models::zone::DEFAULT_MAX_CRIME_RATE;
use crate::models::{Coordinate, RiskBand, Zone};
use crate::proximity::find_nearest;

/// Farthest a zone may be from the query point to describe it
pub const MAX_INFO_DISTANCE_KM: f64 = 1.0;

const BAR_CELLS: usize = 10;

/// Answer of `/crime-info`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrimeInfo {
    pub locality: String,
    pub district: String,
    pub crime_rate_per_100k: f64,
    pub total_crimes: i64,
    pub safety_level: String,
    pub distance_km: f64,
    /// Ten cells, filled proportionally to the dataset maximum
    pub bar: String,
    pub bar_color: String,
    pub max_crime_rate: f64,
}

pub struct ZoneDataset {
    zones: Vec<Zone>,
    max_crime_rate: f64,
}

impl ZoneDataset {
    /// Load `locality,district,latitude,longitude,crime_rate_per_100k,total_crimes,safety_level`
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading zone dataset from {}", path.display());
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open dataset {}", path.display()))?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut zones = Vec::new();
        for (line, record) in csv_reader.deserialize::<Zone>().enumerate() {
            let zone = record.with_context(|| format!("Malformed dataset row {}", line + 1))?;
            if !zone.center().is_valid() {
                warn!(locality = %zone.locality, "Skipping zone with invalid coordinates");
                continue;
            }
            zones.push(zone);
        }

        info!("Loaded {} zones", zones.len());
        Ok(Self::new(zones))
    }

    pub fn new(zones: Vec<Zone>) -> Self {
        let max = zones
            .iter()
            .map(|z| z.crime_rate_per_100k)
            .fold(f64::NEG_INFINITY, f64::max);
        let max_crime_rate = if max > 0.0 { max } else { DEFAULT_MAX_CRIME_RATE };
        Self {
            zones,
            max_crime_rate,
        }
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn max_crime_rate(&self) -> f64 {
        self.max_crime_rate
    }

    /// Describe the zone nearest to `point`, if one lies within
    /// [`MAX_INFO_DISTANCE_KM`]
    pub fn crime_info(&self, point: &Coordinate) -> Option<CrimeInfo> {
        let nearest = find_nearest(point, &self.zones)?;
        let distance_km = nearest.distance_m / 1000.0;
        if distance_km > MAX_INFO_DISTANCE_KM {
            return None;
        }

        let zone = nearest.item;
        let rate = zone.crime_rate_per_100k;
        Some(CrimeInfo {
            locality: zone.locality.clone(),
            district: zone.district.clone(),
            crime_rate_per_100k: rate,
            total_crimes: zone.total_crimes,
            safety_level: zone.safety_level.clone(),
            distance_km: (distance_km * 1000.0).round() / 1000.0,
            bar: bar(rate, self.max_crime_rate),
            bar_color: RiskBand::from_rate(rate).bar_color().to_string(),
            max_crime_rate: self.max_crime_rate,
        })
    }
}

fn bar(rate: f64, max: f64) -> String {
    let filled = if max > 0.0 {
        ((rate / max) * BAR_CELLS as f64).floor().clamp(0.0, BAR_CELLS as f64) as usize
    } else {
        0
    };
    format!("{}{}", "█".repeat(filled), "-".repeat(BAR_CELLS - filled))
}
