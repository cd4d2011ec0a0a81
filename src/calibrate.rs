use std::io::{self, Write};

use compass_beacon::SensorSampler;
use compass_beacon::calibration::{CalibrationSettings, run_calibration};
use compass_beacon::clock::SystemClock;
use compass_beacon::config::SENSOR_MODEL;
use compass_beacon::magnetometer::open_magnetometer;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║     Four-Direction Magnetometer Calibration          ║");
    println!("╚══════════════════════════════════════════════════════╝\n");

    let settings = CalibrationSettings::default();

    println!("Instructions:");
    println!("1. Keep the board LEVEL (horizontal) the whole time");
    println!("2. Point it NORTH, then EAST, SOUTH and WEST when prompted");
    println!(
        "3. You get {} s before the first capture and {} s to rotate before each of the others",
        settings.first_countdown.as_secs(),
        settings.rotate_countdown.as_secs()
    );
    println!(
        "4. Hold still while sampling ({} s per direction)",
        settings.window.max_duration.as_secs()
    );
    println!("5. A wrong orientation cannot be redone: press Ctrl+C and start over\n");

    let sensor = open_magnetometer(SENSOR_MODEL)?;
    let mut sampler = SensorSampler::new(sensor);
    let mut clock = SystemClock::new();

    let stdout = io::stdout();
    let mut console = stdout.lock();
    run_calibration(&mut sampler, &mut clock, &mut console, &settings)?;
    console.flush()?;

    Ok(())
}
