use compass_beacon::ble::{GattOptions, GattServer};
use compass_beacon::clock::SystemClock;
use compass_beacon::config::DEVICE_NAME;
use compass_beacon::telemetry::Heartbeat;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("Starting heartbeat demo (no sensor)...");

    let server = GattServer::start(GattOptions::writable(DEVICE_NAME))?;
    let mut heartbeat = Heartbeat::new(server);
    let mut clock = SystemClock::new();
    heartbeat.run(&mut clock)
}
