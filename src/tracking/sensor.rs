//! Location sensor modelled as a subscription yielding an async stream.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::channel::mpsc;
use futures::stream::{BoxStream, StreamExt};
use serde::Deserialize;

use crate::error::{MapError, SensorError};
use crate::models::Coordinate;

/// One position fix
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Sample {
    pub coordinate: Coordinate,
    /// Radius of the 68% confidence circle, if the sensor reports one
    pub accuracy_m: Option<f64>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Sample {
    pub fn new(latitude: f64, longitude: f64, accuracy_m: Option<f64>) -> Self {
        Self {
            coordinate: Coordinate::new(latitude, longitude),
            accuracy_m,
            timestamp: Utc::now(),
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Age relative to `now`; fixes stamped in the future count as fresh
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.timestamp).to_std().unwrap_or(Duration::ZERO)
    }

    /// Reported accuracy, or `default` when missing or not a positive number
    pub fn accuracy_or(&self, default: f64) -> f64 {
        self.accuracy_m
            .filter(|a| a.is_finite() && *a > 0.0)
            .unwrap_or(default)
    }
}

pub type SensorEvent = Result<Sample, SensorError>;

/// Samples and errors in delivery order; ends when the sensor goes away
pub type SensorStream = BoxStream<'static, SensorEvent>;

/// A device location sensor
pub trait SensorSource: Send + Sync {
    /// Start delivering samples. Fails with [`MapError::SensorUnavailable`]
    /// when the device cannot provide positions at all.
    fn subscribe(&self) -> Result<SensorStream, MapError>;
}

/// Producer half of an in-process sensor
#[derive(Clone)]
pub struct SensorFeed {
    tx: mpsc::UnboundedSender<SensorEvent>,
}

impl SensorFeed {
    /// Deliver an event; returns false once the subscriber is gone
    pub fn push(&self, event: SensorEvent) -> bool {
        self.tx.unbounded_send(event).is_ok()
    }

    pub fn sample(&self, sample: Sample) -> bool {
        self.push(Ok(sample))
    }

    pub fn error(&self, error: SensorError) -> bool {
        self.push(Err(error))
    }
}

/// Sensor fed through a [`SensorFeed`]. It can be subscribed to once.
pub struct ChannelSensor {
    rx: Mutex<Option<mpsc::UnboundedReceiver<SensorEvent>>>,
}

impl SensorSource for ChannelSensor {
    fn subscribe(&self) -> Result<SensorStream, MapError> {
        let rx = self
            .rx
            .lock()
            .map_err(|_| MapError::SensorUnavailable)?
            .take()
            .ok_or(MapError::SensorUnavailable)?;
        Ok(rx.boxed())
    }
}

/// Create a connected feed/sensor pair
pub fn channel() -> (SensorFeed, ChannelSensor) {
    let (tx, rx) = mpsc::unbounded();
    (
        SensorFeed { tx },
        ChannelSensor {
            rx: Mutex::new(Some(rx)),
        },
    )
}
