use std::time::Duration;

use crate::magnetometer::SensorModel;

// ** CALIBRATION CONFIGURATION ** //

// Magnetometer calibration offsets (hard iron correction)
// Obtained from the `calibrate` tool: paste the two lines it prints here.
pub const X_OFFSET: f64 = 0.0;
pub const Y_OFFSET: f64 = 0.0;

/// Countdown before the first (north) capture.
pub const FIRST_COUNTDOWN: Duration = Duration::from_secs(5);
/// Countdown while the operator rotates to east, south and west.
pub const ROTATE_COUNTDOWN: Duration = Duration::from_secs(15);
/// Sampling window per cardinal direction.
pub const SAMPLE_WINDOW: Duration = Duration::from_secs(5);
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(100);
pub const MAX_SAMPLES_PER_WINDOW: usize = 500;

// ** SENSOR CONFIGURATION ** //

/// GY-271 boards carry a QMC5883L.
pub const SENSOR_MODEL: SensorModel = SensorModel::Qmc5883l;
pub const QMC5883L_ADDR: u16 = 0x0D;
pub const LIS3MDL_ADDR: u16 = 0x1C;

// ** TELEMETRY CONFIGURATION ** //

pub const TELEMETRY_PERIOD: Duration = Duration::from_millis(200);
pub const HEARTBEAT_PERIOD: Duration = Duration::from_millis(1000);

// ** BLUETOOTH CONFIGURATION ** //

/// Primary service and characteristic identifiers, as 128-bit UUIDs.
pub const SERVICE_UUID: u128 = 0x0000ff00_0000_1000_8000_00805f9b34fb;
pub const CHARACTERISTIC_UUID: u128 = 0x0000ff01_0000_1000_8000_00805f9b34fb;
/// Desktop clients match on the "ESP32" substring when scanning.
pub const DEVICE_NAME: &str = "ESP32_Compass";
pub const ADV_APPEARANCE: u16 = 0x0000;
/// Advertising interval bounds in 0.625 ms units.
pub const ADV_MIN_INTERVAL: u16 = 0x20;
pub const ADV_MAX_INTERVAL: u16 = 0x40;
