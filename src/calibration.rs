//! Operator-guided four-direction hard-iron calibration.
//!
//! The operator holds the device level and points it north, east, south and west in turn.
//! Each direction contributes one averaged reading, and the offset is the mean of the four.
//! This treats the four captures as evenly spaced points on the field circle; it is not an
//! ellipse fit, so a sloppy rotation skews the result.

use std::io::{self, Write};
use std::time::Duration;

use log::{info, warn};

use crate::clock::Clock;
use crate::config::{FIRST_COUNTDOWN, ROTATE_COUNTDOWN};
use crate::heading::CalibrationOffset;
use crate::magnetometer::Magnetometer;
use crate::sampler::{BatchWindow, DirectionalCentroid, SensorSampler};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    AwaitNorth,
    AwaitEast,
    AwaitSouth,
    AwaitWest,
    Done,
}

impl Phase {
    /// The only transition: strictly forward, `Done` is terminal.
    pub fn next(self) -> Phase {
        match self {
            Phase::AwaitNorth => Phase::AwaitEast,
            Phase::AwaitEast => Phase::AwaitSouth,
            Phase::AwaitSouth => Phase::AwaitWest,
            Phase::AwaitWest | Phase::Done => Phase::Done,
        }
    }

    pub fn direction_name(self) -> Option<&'static str> {
        match self {
            Phase::AwaitNorth => Some("NORTH"),
            Phase::AwaitEast => Some("EAST"),
            Phase::AwaitSouth => Some("SOUTH"),
            Phase::AwaitWest => Some("WEST"),
            Phase::Done => None,
        }
    }

    /// 1-based step number for operator prompts.
    pub fn step(self) -> usize {
        match self {
            Phase::AwaitNorth => 1,
            Phase::AwaitEast => 2,
            Phase::AwaitSouth => 3,
            Phase::AwaitWest => 4,
            Phase::Done => 5,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CalibrationError {
    #[error("console error: {0}")]
    Console(#[from] io::Error),

    #[error("calibration session is already complete")]
    AlreadyComplete,

    #[error("calibration session ended after {recorded} of 4 directions")]
    Incomplete { recorded: usize },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalibrationSettings {
    /// Countdown before the north capture.
    pub first_countdown: Duration,
    /// Countdown before each of the other captures, while the operator rotates.
    pub rotate_countdown: Duration,
    pub window: BatchWindow,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            first_countdown: FIRST_COUNTDOWN,
            rotate_countdown: ROTATE_COUNTDOWN,
            window: BatchWindow::default(),
        }
    }
}

impl CalibrationSettings {
    fn countdown_for(&self, phase: Phase) -> Duration {
        if phase == Phase::AwaitNorth {
            self.first_countdown
        } else {
            self.rotate_countdown
        }
    }
}

/// Phase plus the centroids collected so far.
#[derive(Debug)]
pub struct CalibrationSession {
    phase: Phase,
    centroids: Vec<DirectionalCentroid>,
}

impl Default for CalibrationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CalibrationSession {
    pub fn new() -> Self {
        Self {
            phase: Phase::AwaitNorth,
            centroids: Vec::with_capacity(4),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn centroids(&self) -> &[DirectionalCentroid] {
        &self.centroids
    }

    /// Stores the centroid for the current phase and advances to the next one.
    pub fn record(&mut self, centroid: DirectionalCentroid) -> Result<Phase, CalibrationError> {
        if self.phase == Phase::Done {
            return Err(CalibrationError::AlreadyComplete);
        }
        self.centroids.push(centroid);
        self.phase = self.phase.next();
        Ok(self.phase)
    }

    /// Available once all four directions are recorded.
    pub fn offset(&self) -> Option<CalibrationOffset> {
        match self.centroids.as_slice() {
            [north, east, south, west] if self.phase == Phase::Done => {
                Some(derive_offset([*north, *east, *south, *west]))
            }
            _ => None,
        }
    }
}

/// Component-wise mean of the four cardinal centroids.
pub fn derive_offset(centroids: [DirectionalCentroid; 4]) -> CalibrationOffset {
    let sum_x: f64 = centroids.iter().map(|c| c.mean_x).sum();
    let sum_y: f64 = centroids.iter().map(|c| c.mean_y).sum();
    CalibrationOffset::new(sum_x / 4.0, sum_y / 4.0)
}

/// Runs one complete session: prompt, countdown, sample and echo for each direction, then
/// prints the offset as literal constants for `config.rs`.
///
/// There is no retry or skip. A mis-oriented capture can only be fixed by running again.
pub fn run_calibration<M, C, W>(
    sampler: &mut SensorSampler<M>,
    clock: &mut C,
    console: &mut W,
    settings: &CalibrationSettings,
) -> Result<CalibrationOffset, CalibrationError>
where
    M: Magnetometer,
    C: Clock,
    W: Write,
{
    let mut session = CalibrationSession::new();

    while let Some(direction) = session.phase().direction_name() {
        let phase = session.phase();
        writeln!(
            console,
            "Step {}/4: Point the device {} and hold it level.",
            phase.step(),
            direction
        )?;
        countdown(clock, console, settings.countdown_for(phase))?;

        writeln!(
            console,
            "Sampling {} for {} s...",
            direction,
            settings.window.max_duration.as_secs()
        )?;
        let summary = sampler.read_batch_averaged(clock, settings.window);
        if summary.is_degenerate() {
            warn!(
                "No samples collected facing {} ({} faults); using (0, 0)",
                direction, summary.faults
            );
            writeln!(console, "  WARNING: no samples collected, using 0, 0")?;
        }
        writeln!(
            console,
            "  {} centroid: {} ({} samples)\n",
            direction, summary.centroid, summary.samples
        )?;
        info!(
            "Captured {}: {} from {} samples, {} faults",
            direction, summary.centroid, summary.samples, summary.faults
        );

        session.record(summary.centroid)?;
    }

    let offset = session.offset().ok_or(CalibrationError::Incomplete {
        recorded: session.centroids().len(),
    })?;
    write_offset(console, &offset)?;
    Ok(offset)
}

/// Second-by-second countdown, e.g. `5... 4... 3... 2... 1...` on separate lines.
///
/// A fractional duration is shown rounded up; the last tick sleeps only the remainder.
fn countdown<C: Clock, W: Write>(
    clock: &mut C,
    console: &mut W,
    duration: Duration,
) -> io::Result<()> {
    let mut left = duration;
    while !left.is_zero() {
        let shown = left.as_secs() + u64::from(left.subsec_nanos() > 0);
        writeln!(console, "  {}...", shown)?;
        console.flush()?;

        let tick = left.min(Duration::from_secs(1));
        clock.sleep(tick);
        left -= tick;
    }
    Ok(())
}

fn write_offset<W: Write>(console: &mut W, offset: &CalibrationOffset) -> io::Result<()> {
    writeln!(console, "Calibration complete.")?;
    writeln!(
        console,
        "Offset (x, y): ({:.4}, {:.4})\n",
        offset.offset_x, offset.offset_y
    )?;
    writeln!(console, "Paste into src/config.rs:")?;
    writeln!(console, "pub const X_OFFSET: f64 = {:.4};", offset.offset_x)?;
    writeln!(console, "pub const Y_OFFSET: f64 = {:.4};", offset.offset_y)?;
    Ok(())
}
