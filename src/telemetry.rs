use std::time::Duration;

use log::{info, warn};

use crate::characteristic::Characteristic;
use crate::clock::Clock;
use crate::config::{HEARTBEAT_PERIOD, TELEMETRY_PERIOD};
use crate::heading::{CalibrationOffset, HeadingReading, compute_heading};
use crate::magnetometer::{Magnetometer, RawSample};
use crate::sampler::SensorSampler;

/// What a single cycle did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CycleOutcome {
    /// The heading was written to the characteristic and notified.
    Published(HeadingReading),
    /// The sensor read failed; clients keep seeing the previous value.
    SkippedRead,
    /// The heading was computed but the wireless stack rejected the write or notify.
    LinkFailed(HeadingReading),
}

fn sleep_rest_of_period<C: Clock>(clock: &mut C, started: Duration, period: Duration) {
    clock.sleep(period.saturating_sub(clock.elapsed_since(started)));
}

/// Runs `cycle` forever, one call per `period` measured from the start of each call.
fn run_paced<C: Clock>(clock: &mut C, period: Duration, mut cycle: impl FnMut()) -> ! {
    loop {
        let started = clock.now();
        cycle();
        sleep_rest_of_period(clock, started, period);
    }
}

/// Steady-state loop: sample, correct, compute heading, publish.
pub struct TelemetryPublisher<M, K> {
    sampler: SensorSampler<M>,
    characteristic: K,
    offset: CalibrationOffset,
    period: Duration,
}

impl<M: Magnetometer, K: Characteristic> TelemetryPublisher<M, K> {
    pub fn new(sampler: SensorSampler<M>, characteristic: K, offset: CalibrationOffset) -> Self {
        Self {
            sampler,
            characteristic,
            offset,
            period: TELEMETRY_PERIOD,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn characteristic(&self) -> &K {
        &self.characteristic
    }

    pub fn characteristic_mut(&mut self) -> &mut K {
        &mut self.characteristic
    }

    pub fn run_cycle(&mut self) -> CycleOutcome {
        accept_subscriber(&mut self.characteristic);

        let sample = match self.sampler.read_one() {
            Ok(sample) => sample,
            Err(e) => {
                warn!("Sensor read failed, skipping cycle: {}", e);
                return CycleOutcome::SkippedRead;
            }
        };

        let heading = compute_heading(sample, self.offset);
        let payload = heading.to_string();

        log_heading(&heading, &payload, sample);

        if let Err(e) = self.characteristic.publish(&payload) {
            warn!("Failed to publish heading {}: {}", payload, e);
            return CycleOutcome::LinkFailed(heading);
        }
        CycleOutcome::Published(heading)
    }

    /// Runs `cycles` paced cycles and returns their outcomes.
    pub fn run_for<C: Clock>(&mut self, clock: &mut C, cycles: usize) -> Vec<CycleOutcome> {
        let mut outcomes = Vec::with_capacity(cycles);
        for _ in 0..cycles {
            let started = clock.now();
            outcomes.push(self.run_cycle());
            sleep_rest_of_period(clock, started, self.period);
        }
        outcomes
    }

    pub fn run<C: Clock>(&mut self, clock: &mut C) -> ! {
        info!(
            "Publishing heading every {} ms (offset X: {:.4}, Y: {:.4})",
            self.period.as_millis(),
            self.offset.offset_x,
            self.offset.offset_y
        );
        let period = self.period;
        run_paced(clock, period, || {
            self.run_cycle();
        })
    }
}

/// Brings a client that subscribed since the last cycle up to date.
fn accept_subscriber<K: Characteristic>(characteristic: &mut K) {
    match characteristic.on_subscribe() {
        Ok(true) => info!("Client subscribed"),
        Ok(false) => {}
        Err(e) => warn!("Failed to notify new subscriber: {}", e),
    }
}

fn log_heading(heading: &HeadingReading, payload: &str, sample: RawSample) {
    info!(
        "Heading: {}° ({})  raw X: {:.0}  Y: {:.0}",
        payload,
        heading.direction(),
        sample.x,
        sample.y
    );
}

/// Static payloads alternated by the heartbeat demo.
pub const HEARTBEAT_ON: &str = "ON";
pub const HEARTBEAT_OFF: &str = "OFF";

/// Non-sensor demo: toggles the characteristic between two fixed values.
///
/// A value written by a remote client replaces the payload for the cycle in which it arrives.
pub struct Heartbeat<K> {
    characteristic: K,
    on: bool,
    period: Duration,
}

impl<K: Characteristic> Heartbeat<K> {
    pub fn new(characteristic: K) -> Self {
        Self {
            characteristic,
            on: false,
            period: HEARTBEAT_PERIOD,
        }
    }

    pub fn characteristic(&self) -> &K {
        &self.characteristic
    }

    pub fn characteristic_mut(&mut self) -> &mut K {
        &mut self.characteristic
    }

    /// Returns the payload that was published.
    pub fn run_cycle(&mut self) -> String {
        accept_subscriber(&mut self.characteristic);

        let payload = match self.characteristic.take_written() {
            Some(written) => {
                info!("Client wrote: {:?}", written);
                written
            }
            None => {
                self.on = !self.on;
                let value = if self.on { HEARTBEAT_ON } else { HEARTBEAT_OFF };
                value.to_string()
            }
        };

        match self.characteristic.publish(&payload) {
            Ok(()) => info!("Heartbeat: {}", payload),
            Err(e) => warn!("Failed to publish heartbeat {}: {}", payload, e),
        }
        payload
    }

    pub fn run<C: Clock>(&mut self, clock: &mut C) -> ! {
        info!("Heartbeat every {} ms", self.period.as_millis());
        let period = self.period;
        run_paced(clock, period, || {
            self.run_cycle();
        })
    }
}
