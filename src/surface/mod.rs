//! Rendering and notification surfaces consumed by the core.
//!
//! The core never draws anything itself. It hands shapes, popups and messages to
//! a [`MapSurface`] and a [`Notifier`]; both are fire-and-forget and take `&self`
//! so one surface can be shared by every component of a session.

mod log;

pub use log::TracingSurface;

use crate::models::{Coordinate, FacilityKind};

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
    Success,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Success => "success",
        };
        f.write_str(s)
    }
}

/// Independent overlay groups on the map. Setting a layer replaces its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerId {
    LiveMarker,
    Accuracy,
    Zones,
    Facilities,
    Route,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerIcon {
    User,
    Facility(FacilityKind),
}

/// Popup bound to a shape; `html` is passed through verbatim
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub html: String,
    pub open: bool,
}

impl Popup {
    pub fn closed(html: String) -> Self {
        Self { html, open: false }
    }

    pub fn opened(html: String) -> Self {
        Self { html, open: true }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Marker {
        at: Coordinate,
        icon: MarkerIcon,
        popup: Option<Popup>,
    },
    Circle {
        center: Coordinate,
        radius_m: f64,
        color: String,
        fill_opacity: f64,
        popup: Option<Popup>,
    },
    Path {
        points: Vec<Coordinate>,
        color: String,
        weight: f64,
        opacity: f64,
    },
}

/// Rendering collaborator
pub trait MapSurface: Send + Sync {
    /// Current zoom level
    fn zoom(&self) -> u8;

    fn set_view(&self, center: Coordinate, zoom: u8);

    /// Animated pan/zoom
    fn fly_to(&self, center: Coordinate, zoom: u8);

    /// Replace everything in `layer` with `shapes`
    fn set_layer(&self, layer: LayerId, shapes: Vec<Shape>);

    fn clear_layer(&self, layer: LayerId);

    /// Free-standing popup at a coordinate
    fn open_popup(&self, at: Coordinate, html: &str);

    /// Show the informational side panel with the given content
    fn show_panel(&self, html: &str);

    fn hide_panel(&self);

    /// Loading indicator; `None` hides it
    fn set_loading(&self, message: Option<&str>);
}

/// Notification collaborator: transient, non-blocking, auto-dismissing
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Both surfaces, as every component needs them together
pub trait Ui: MapSurface + Notifier {}

impl<T: MapSurface + Notifier> Ui for T {}
