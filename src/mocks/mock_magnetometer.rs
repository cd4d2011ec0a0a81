// This file is only compiled during tests

use std::collections::VecDeque;

use crate::magnetometer::{Magnetometer, RawSample, SensorError};

/// Replays a script of readings; `None` entries fail with `DataNotReady`.
///
/// Once the script runs out the mock keeps returning `fallback`, or faults if there is none.
#[derive(Debug, Default)]
pub struct MockMagnetometer {
    script: VecDeque<Option<RawSample>>,
    fallback: Option<RawSample>,
    reads: usize,
}

impl MockMagnetometer {
    pub fn repeating(sample: RawSample) -> Self {
        Self {
            fallback: Some(sample),
            ..Self::default()
        }
    }

    pub fn scripted(script: impl IntoIterator<Item = Option<RawSample>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    /// Number of `read_raw` calls, including failed ones.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl Magnetometer for MockMagnetometer {
    fn read_raw(&mut self) -> Result<RawSample, SensorError> {
        self.reads += 1;
        let next = match self.script.pop_front() {
            Some(entry) => entry,
            None => self.fallback,
        };
        next.ok_or(SensorError::DataNotReady)
    }
}
