use compass_beacon::ble::{GattOptions, GattServer};
use compass_beacon::clock::{SystemClock, halt};
use compass_beacon::config::{DEVICE_NAME, SENSOR_MODEL};
use compass_beacon::magnetometer::open_magnetometer;
use compass_beacon::telemetry::TelemetryPublisher;
use compass_beacon::{CalibrationOffset, SensorSampler};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("Starting compass beacon...");

    // The service must be up before the first heading is published
    let server = GattServer::start(GattOptions::read_notify(DEVICE_NAME))?;

    let sensor = match open_magnetometer(SENSOR_MODEL) {
        Ok(sensor) => sensor,
        Err(e) => {
            eprintln!("Magnetometer initialization failed: {}", e);
            eprintln!("Halted. Check wiring and power-cycle the device.");
            halt();
        }
    };

    let offset = CalibrationOffset::configured();
    if offset == CalibrationOffset::default() {
        println!("⚠ No calibration offset configured; run `calibrate` first for accurate headings");
    }

    let mut publisher = TelemetryPublisher::new(SensorSampler::new(sensor), server, offset);
    let mut clock = SystemClock::new();
    publisher.run(&mut clock)
}
