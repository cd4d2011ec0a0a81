use std::fmt;

use crate::config::{X_OFFSET, Y_OFFSET};
use crate::magnetometer::RawSample;

/// Hard-iron bias: the center of the raw-reading circle traced by a full horizontal rotation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CalibrationOffset {
    pub offset_x: f64,
    pub offset_y: f64,
}

impl CalibrationOffset {
    pub fn new(offset_x: f64, offset_y: f64) -> Self {
        Self { offset_x, offset_y }
    }

    /// The offset baked into `config.rs`.
    pub fn configured() -> Self {
        Self::new(X_OFFSET, Y_OFFSET)
    }
}

/// Compass bearing in degrees, always within `[0, 360)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadingReading {
    azimuth_degrees: f64,
}

impl HeadingReading {
    pub fn azimuth_degrees(&self) -> f64 {
        self.azimuth_degrees
    }

    pub fn direction(&self) -> Direction {
        heading_to_direction_8point(self.azimuth_degrees)
    }
}

/// One decimal place. Values that would round up to 360.0 are shown as 0.0.
impl fmt::Display for HeadingReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = format!("{:.1}", self.azimuth_degrees);
        if text == "360.0" {
            write!(f, "0.0")
        } else {
            write!(f, "{}", text)
        }
    }
}

/// Subtracts the hard-iron offset, then measures the angle of the corrected vector.
///
/// No rounding happens here. A corrected vector of exactly `(0, 0)` yields 0.0 because
/// `atan2(0, 0) == 0`.
pub fn compute_heading(sample: RawSample, offset: CalibrationOffset) -> HeadingReading {
    let x = sample.x - offset.offset_x;
    let y = sample.y - offset.offset_y;

    let mut azimuth = y.atan2(x).to_degrees();
    if azimuth < 0.0 {
        azimuth += 360.0;
    }
    // A tiny negative angle plus 360 can round to exactly 360
    if azimuth >= 360.0 {
        azimuth -= 360.0;
    }

    HeadingReading {
        azimuth_degrees: azimuth,
    }
}

/// Represents an 8-point compass rose.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Direction {
    N,  // north
    NE, // northeast
    E,  // east
    SE, // southeast
    S,  // south
    SW, // southwest
    W,  // west
    NW, // northwest
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

impl Direction {
    pub fn abbreviation(&self) -> &str {
        match self {
            Direction::N => "N",
            Direction::NE => "NE",
            Direction::E => "E",
            Direction::SE => "SE",
            Direction::S => "S",
            Direction::SW => "SW",
            Direction::W => "W",
            Direction::NW => "NW",
        }
    }
}

/// Converts a heading to an 8-point compass direction.
pub fn heading_to_direction_8point(heading: f64) -> Direction {
    // normalize heading to 0-360 range
    let normalized = ((heading % 360.0) + 360.0) % 360.0;

    // each direction covers 45 degrees (360 / 8)
    match normalized {
        h if h < 22.5 => Direction::N,
        h if h < 67.5 => Direction::NE,
        h if h < 112.5 => Direction::E,
        h if h < 157.5 => Direction::SE,
        h if h < 202.5 => Direction::S,
        h if h < 247.5 => Direction::SW,
        h if h < 292.5 => Direction::W,
        h if h < 337.5 => Direction::NW,
        _ => Direction::N,
    }
}
