//! HTML content for popups and the info panel.
//!
//! The rendering surface shows these strings verbatim, so every value coming
//! from a remote record is escaped here.

use crate::models::{Facility, Zone};
use crate::weather::Weather;

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn or_unknown(s: &str) -> &str {
    if s.is_empty() {
        "Unknown"
    } else {
        s
    }
}

/// Popup bound to the live marker when a zone is entered
pub fn zone_popup(zone: &Zone) -> String {
    format!(
        "<b>{}, {}</b><br>Crime Rate: {}<br>Total Crimes: {}<br>Safety: {}",
        escape(&zone.locality),
        escape(&zone.district),
        zone.crime_rate_per_100k,
        zone.total_crimes,
        escape(&zone.safety_level)
    )
}

/// Popup on a zone circle of the overview layer
pub fn zone_circle_popup(zone: &Zone) -> String {
    format!(
        "<b>{}, {}</b><br>Crime Rate: {} per 100k<br>Total Crimes: {}<br>Safety: {}",
        escape(&zone.locality),
        escape(&zone.district),
        zone.crime_rate_per_100k,
        zone.total_crimes,
        escape(&zone.safety_level)
    )
}

/// Info panel content for the zone the user is in
pub fn info_panel(zone: &Zone) -> String {
    let title = if zone.district.is_empty() {
        escape(or_unknown(&zone.locality))
    } else {
        format!(
            "{}, {}",
            escape(or_unknown(&zone.locality)),
            escape(&zone.district)
        )
    };
    let distance = zone
        .distance_km
        .map(|d| d.to_string())
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        "<h3>{}</h3>\
         <p><b>Crime Rate:</b> {} per 100k</p>\
         <p><b>Total Crimes:</b> {}</p>\
         <p><b>Safety:</b> {}</p>\
         <div class=\"bar\"><div class=\"bar-fill\" style=\"width:{}%; background:{}\"></div></div>\
         <p class=\"muted\">Nearest locality • {} km</p>",
        title,
        zone.crime_rate_per_100k,
        zone.total_crimes,
        escape(&zone.safety_level),
        zone.bar_percent(),
        escape(zone.display_color()),
        distance
    )
}

pub fn facility_popup(facility: &Facility, distance_m: f64) -> String {
    format!(
        "<b>{}</b><br>{}<br>Distance: {:.2} km",
        escape(&facility.display_name()),
        escape(&facility.kind.label()),
        distance_m / 1000.0
    )
}

pub fn weather_popup(weather: &Weather) -> String {
    let summary = weather.summary.as_deref().unwrap_or("Weather");
    let temp = weather
        .temperature_c
        .map(|t| format!("{}", t.round()))
        .unwrap_or_else(|| "?".to_string());
    format!("🌦 <b>{}</b><br>🌡 {}°C", escape(summary), temp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, FacilityKind};

    fn zone() -> Zone {
        Zone {
            locality: "Civil Lines".to_string(),
            district: "Raipur".to_string(),
            latitude: 21.25,
            longitude: 81.64,
            crime_rate_per_100k: 250.0,
            total_crimes: 310,
            safety_level: "Moderate".to_string(),
            bar_color: None,
            max_crime_rate: None,
            distance_km: None,
        }
    }

    #[test]
    fn test_zone_popup() {
        assert_eq!(
            zone_popup(&zone()),
            "<b>Civil Lines, Raipur</b><br>Crime Rate: 250<br>Total Crimes: 310<br>Safety: Moderate"
        );
    }

    #[test]
    fn test_info_panel_bar_and_distance() {
        let html = info_panel(&zone());
        assert!(html.contains("<h3>Civil Lines, Raipur</h3>"));
        assert!(html.contains("width:50%; background:yellow"));
        assert!(html.contains("N/A km"));

        let mut z = zone();
        z.distance_km = Some(0.412);
        z.locality.clear();
        z.district.clear();
        let html = info_panel(&z);
        assert!(html.contains("<h3>Unknown</h3>"));
        assert!(html.contains("0.412 km"));
    }

    #[test]
    fn test_escaping() {
        let mut z = zone();
        z.locality = "<script>".to_string();
        assert!(zone_popup(&z).starts_with("<b>&lt;script&gt;, Raipur</b>"));
    }

    #[test]
    fn test_facility_popup() {
        let f = Facility {
            location: Coordinate::new(21.2, 81.6),
            kind: FacilityKind::Hospital,
            name: Some("AIIMS Raipur".to_string()),
        };
        assert_eq!(
            facility_popup(&f, 1234.0),
            "<b>AIIMS Raipur</b><br>hospital<br>Distance: 1.23 km"
        );
    }

    #[test]
    fn test_weather_popup() {
        let w = Weather {
            summary: Some("Clouds".to_string()),
            temperature_c: Some(28.6),
        };
        assert_eq!(weather_popup(&w), "🌦 <b>Clouds</b><br>🌡 29°C");
        let w = Weather {
            summary: None,
            temperature_c: None,
        };
        assert_eq!(weather_popup(&w), "🌦 <b>Weather</b><br>🌡 ?°C");
    }
}
