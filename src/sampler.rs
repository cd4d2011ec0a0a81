use std::fmt;
use std::time::Duration;

use log::{debug, warn};

use crate::clock::Clock;
use crate::config::{MAX_SAMPLES_PER_WINDOW, SAMPLE_INTERVAL, SAMPLE_WINDOW};
use crate::magnetometer::{Magnetometer, RawSample, SensorError};

/// Average raw reading over one sampling window.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DirectionalCentroid {
    pub mean_x: f64,
    pub mean_y: f64,
}

impl DirectionalCentroid {
    pub fn new(mean_x: f64, mean_y: f64) -> Self {
        Self { mean_x, mean_y }
    }
}

impl fmt::Display for DirectionalCentroid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X: {:.2}  Y: {:.2}", self.mean_x, self.mean_y)
    }
}

/// Bounds for `SensorSampler::read_batch_averaged`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BatchWindow {
    pub max_duration: Duration,
    pub sample_interval: Duration,
    pub max_samples: usize,
}

impl Default for BatchWindow {
    fn default() -> Self {
        Self {
            max_duration: SAMPLE_WINDOW,
            sample_interval: SAMPLE_INTERVAL,
            max_samples: MAX_SAMPLES_PER_WINDOW,
        }
    }
}

/// Outcome of one batch: the centroid plus how it was obtained.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BatchSummary {
    pub centroid: DirectionalCentroid,
    pub samples: usize,
    pub faults: usize,
}

impl BatchSummary {
    /// No sample made it into the window; the centroid is the zero vector.
    pub fn is_degenerate(&self) -> bool {
        self.samples == 0
    }
}

/// Sole owner of the magnetometer.
pub struct SensorSampler<M> {
    sensor: M,
}

impl<M: Magnetometer> SensorSampler<M> {
    pub fn new(sensor: M) -> Self {
        Self { sensor }
    }

    pub fn sensor(&self) -> &M {
        &self.sensor
    }

    /// Takes one reading; driver faults are returned as-is, without retry.
    pub fn read_one(&mut self) -> Result<RawSample, SensorError> {
        self.sensor.read_raw()
    }

    /// Polls every `sample_interval` until `max_duration` has passed since entry or
    /// `max_samples` readings were collected, then averages x and y independently.
    ///
    /// A poll is only started while its whole interval still fits in the window, so at most
    /// `min(max_duration / sample_interval, max_samples)` readings are taken. Failed reads are
    /// skipped. If nothing was collected the centroid is `(0.0, 0.0)`.
    ///
    /// A zero `sample_interval` is rejected: no reads are taken and the batch is degenerate.
    pub fn read_batch_averaged<C: Clock>(
        &mut self,
        clock: &mut C,
        window: BatchWindow,
    ) -> BatchSummary {
        if window.sample_interval.is_zero() {
            warn!("Rejecting batch with a zero sample interval");
            return BatchSummary {
                centroid: DirectionalCentroid::default(),
                samples: 0,
                faults: 0,
            };
        }

        let start = clock.now();
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut samples = 0;
        let mut faults = 0;

        while clock.elapsed_since(start) + window.sample_interval <= window.max_duration
            && samples < window.max_samples
        {
            match self.read_one() {
                Ok(sample) => {
                    sum_x += sample.x;
                    sum_y += sample.y;
                    samples += 1;
                }
                Err(e) => {
                    debug!("Skipping sample: {}", e);
                    faults += 1;
                }
            }
            clock.sleep(window.sample_interval);
        }

        let centroid = if samples == 0 {
            DirectionalCentroid::default()
        } else {
            DirectionalCentroid::new(sum_x / samples as f64, sum_y / samples as f64)
        };

        BatchSummary {
            centroid,
            samples,
            faults,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::mock_clock::MockClock;
    use crate::mocks::mock_magnetometer::MockMagnetometer;

    fn window(duration_ms: u64, interval_ms: u64, max_samples: usize) -> BatchWindow {
        BatchWindow {
            max_duration: Duration::from_millis(duration_ms),
            sample_interval: Duration::from_millis(interval_ms),
            max_samples,
        }
    }

    #[test]
    fn test_read_one_propagates_fault() {
        let mut sampler = SensorSampler::new(MockMagnetometer::failing());
        assert!(matches!(
            sampler.read_one(),
            Err(SensorError::DataNotReady)
        ));
    }

    #[test]
    fn test_batch_averages_each_axis() {
        let script = [
            Some(RawSample::new(10.0, -2.0)),
            Some(RawSample::new(20.0, -4.0)),
            Some(RawSample::new(30.0, -6.0)),
        ];
        let mut sampler = SensorSampler::new(MockMagnetometer::scripted(script));
        let mut clock = MockClock::new();

        let summary = sampler.read_batch_averaged(&mut clock, window(10_000, 100, 3));

        assert_eq!(summary.samples, 3);
        assert_eq!(summary.centroid, DirectionalCentroid::new(20.0, -4.0));
    }

    #[test]
    fn test_batch_stops_at_duration() {
        let mut sampler =
            SensorSampler::new(MockMagnetometer::repeating(RawSample::new(1.0, 1.0)));
        let mut clock = MockClock::new();

        let summary = sampler.read_batch_averaged(&mut clock, window(5_000, 100, 500));

        assert_eq!(summary.samples, 50);
        assert_eq!(clock.now(), Duration::from_millis(5_000));
    }

    #[test]
    fn test_batch_stops_at_sample_cap() {
        let mut sampler =
            SensorSampler::new(MockMagnetometer::repeating(RawSample::new(1.0, 1.0)));
        let mut clock = MockClock::new();

        let summary = sampler.read_batch_averaged(&mut clock, window(5_000, 100, 7));

        assert_eq!(summary.samples, 7);
        assert_eq!(sampler.sensor().reads(), 7);
    }

    #[test]
    fn test_batch_sample_count_bound() {
        for (duration, interval, cap) in [(1_000, 100, 500), (1_000, 300, 500), (2_000, 10, 25)] {
            let expected = ((duration / interval) as usize).min(cap);
            let mut sampler =
                SensorSampler::new(MockMagnetometer::repeating(RawSample::new(0.0, 5.0)));
            let mut clock = MockClock::new();
            let summary = sampler.read_batch_averaged(&mut clock, window(duration, interval, cap));

            assert_eq!(summary.samples, expected);
        }
    }

    #[test]
    fn test_batch_skips_faulty_reads() {
        let script = [
            Some(RawSample::new(4.0, 8.0)),
            None,
            Some(RawSample::new(8.0, 16.0)),
            None,
        ];
        let mut sampler = SensorSampler::new(MockMagnetometer::scripted(script));
        let mut clock = MockClock::new();

        let summary = sampler.read_batch_averaged(&mut clock, window(400, 100, 500));

        assert_eq!(sampler.sensor().reads(), 4);
        assert_eq!(summary.samples, 2);
        assert_eq!(summary.faults, 2);
        assert_eq!(summary.centroid, DirectionalCentroid::new(6.0, 12.0));
    }

    #[test]
    fn test_degenerate_batch_yields_zero_vector() {
        let mut sampler = SensorSampler::new(MockMagnetometer::failing());
        let mut clock = MockClock::new();

        let summary = sampler.read_batch_averaged(&mut clock, window(500, 100, 500));

        assert!(summary.is_degenerate());
        assert_eq!(summary.faults, 5);
        assert_eq!(summary.centroid, DirectionalCentroid::new(0.0, 0.0));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let mut sampler = SensorSampler::new(MockMagnetometer::failing());
        let mut clock = MockClock::new();

        let summary = sampler.read_batch_averaged(&mut clock, window(5_000, 0, 500));

        assert!(summary.is_degenerate());
        assert_eq!(sampler.sensor().reads(), 0);
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn test_zero_duration_collects_nothing() {
        let mut sampler =
            SensorSampler::new(MockMagnetometer::repeating(RawSample::new(9.0, 9.0)));
        let mut clock = MockClock::new();

        let summary = sampler.read_batch_averaged(&mut clock, window(0, 100, 500));

        assert!(summary.is_degenerate());
        assert_eq!(sampler.sensor().reads(), 0);
    }

    #[test]
    fn test_window_measured_from_call_entry() {
        let mut sampler =
            SensorSampler::new(MockMagnetometer::repeating(RawSample::new(2.0, 2.0)));
        let mut clock = MockClock::new();
        clock.advance(Duration::from_millis(150));

        let summary = sampler.read_batch_averaged(&mut clock, window(1_000, 100, 500));

        assert_eq!(summary.samples, 10);
        assert_eq!(clock.now(), Duration::from_millis(1_150));
    }
}
