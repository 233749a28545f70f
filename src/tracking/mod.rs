//! Live position tracking: the sensor subscription and the per-sample coordinator.

mod coordinator;
mod sensor;

pub use coordinator::{LiveLocationState, LocationCoordinator, SampleOutcome};
pub use sensor::{channel, ChannelSensor, Sample, SensorEvent, SensorFeed, SensorSource, SensorStream};
