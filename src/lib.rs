pub mod calibration;
pub mod characteristic;
pub mod clock;
pub mod config;
pub mod heading;
pub mod magnetometer;
pub mod sampler;
pub mod telemetry;

#[cfg(feature = "ble")]
pub mod ble;

// Re-export commonly used types
pub use heading::{CalibrationOffset, HeadingReading, compute_heading};
pub use magnetometer::{Magnetometer, RawSample, SensorError};
pub use sampler::{DirectionalCentroid, SensorSampler};

#[cfg(test)]
pub(crate) mod mocks;
