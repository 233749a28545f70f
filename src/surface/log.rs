//! Headless surface that reports every rendering call as a tracing event.

use std::sync::atomic::{AtomicU8, Ordering};

use tracing::{debug, error, info, warn};

use super::{LayerId, MapSurface, Notifier, Severity, Shape};
use crate::models::Coordinate;

/// Logs map updates and notifications instead of drawing them.
pub struct TracingSurface {
    zoom: AtomicU8,
}

impl TracingSurface {
    pub fn new(initial_zoom: u8) -> Self {
        Self {
            zoom: AtomicU8::new(initial_zoom),
        }
    }
}

impl MapSurface for TracingSurface {
    fn zoom(&self) -> u8 {
        self.zoom.load(Ordering::Relaxed)
    }

    fn set_view(&self, center: Coordinate, zoom: u8) {
        self.zoom.store(zoom, Ordering::Relaxed);
        debug!(%center, zoom, "view");
    }

    fn fly_to(&self, center: Coordinate, zoom: u8) {
        self.zoom.store(zoom, Ordering::Relaxed);
        info!(%center, zoom, "fly to");
    }

    fn set_layer(&self, layer: LayerId, shapes: Vec<Shape>) {
        for shape in &shapes {
            match shape {
                Shape::Marker { at, icon, popup } => debug!(
                    ?layer,
                    %at,
                    ?icon,
                    popup_open = popup.as_ref().map(|p| p.open).unwrap_or(false),
                    "marker"
                ),
                Shape::Circle {
                    center,
                    radius_m,
                    color,
                    ..
                } => debug!(?layer, %center, radius_m, color = %color, "circle"),
                Shape::Path { points, color, .. } => {
                    debug!(?layer, vertices = points.len(), color = %color, "path")
                }
            }
        }
        debug!(?layer, shapes = shapes.len(), "layer replaced");
    }

    fn clear_layer(&self, layer: LayerId) {
        debug!(?layer, "layer cleared");
    }

    fn open_popup(&self, at: Coordinate, html: &str) {
        info!(%at, html, "popup");
    }

    fn show_panel(&self, html: &str) {
        info!(html, "info panel");
    }

    fn hide_panel(&self) {
        debug!("info panel hidden");
    }

    fn set_loading(&self, message: Option<&str>) {
        match message {
            Some(m) => debug!("{}", m),
            None => debug!("loading done"),
        }
    }
}

impl Notifier for TracingSurface {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info | Severity::Success => info!(%severity, "{}", message),
            Severity::Warn => warn!(%severity, "{}", message),
            Severity::Error => error!(%severity, "{}", message),
        }
    }
}
