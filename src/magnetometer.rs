use std::thread;
use std::time::Duration;

use log::info;
use rppal::i2c::I2c;

use crate::config::{LIS3MDL_ADDR, QMC5883L_ADDR};

/// One instantaneous reading on the two horizontal axes, in raw sensor counts.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RawSample {
    pub x: f64,
    pub y: f64,
}

impl RawSample {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    #[error("I2C error: {0}")]
    I2c(#[from] rppal::i2c::Error),

    #[error("wrong device ID: 0x{found:02X}, expected 0x{expected:02X}")]
    WrongDevice { found: u8, expected: u8 },

    #[error("magnetometer hardware not responding (no data ready)")]
    NotResponding,

    #[error("magnetometer data not ready")]
    DataNotReady,

    #[error("magnetometer measurement overflow")]
    Overflow,
}

/// The blocking "take one reading" side of a sensor driver.
///
/// Initialization is the driver's constructor; a value of this trait is always ready to read.
pub trait Magnetometer {
    fn read_raw(&mut self) -> Result<RawSample, SensorError>;
}

impl<M: Magnetometer + ?Sized> Magnetometer for Box<M> {
    fn read_raw(&mut self) -> Result<RawSample, SensorError> {
        (**self).read_raw()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SensorModel {
    /// QST QMC5883L, found on GY-271 breakout boards.
    Qmc5883l,
    /// ST LIS3MDL.
    Lis3mdl,
}

/// Opens and initializes the configured magnetometer on the default I2C bus.
pub fn open_magnetometer(model: SensorModel) -> Result<Box<dyn Magnetometer>, SensorError> {
    Ok(match model {
        SensorModel::Qmc5883l => Box::new(Qmc5883l::new()?),
        SensorModel::Lis3mdl => Box::new(Lis3mdl::new()?),
    })
}

/// Reads two little-endian i16 axis values starting at `first_reg`.
fn read_xy(i2c: &mut I2c, first_reg: u8) -> Result<RawSample, SensorError> {
    let mut data = [0u8; 4];
    for (i, item) in data.iter_mut().enumerate() {
        *item = i2c.smbus_read_byte(first_reg + i as u8)?;
    }

    let x = i16::from_le_bytes([data[0], data[1]]) as f64;
    let y = i16::from_le_bytes([data[2], data[3]]) as f64;
    Ok(RawSample::new(x, y))
}

// QMC5883L register map
const QMC_OUT_X_L: u8 = 0x00;
const QMC_STATUS: u8 = 0x06;
const QMC_CONTROL1: u8 = 0x09;
const QMC_CONTROL2: u8 = 0x0A;
const QMC_SET_RESET_PERIOD: u8 = 0x0B;
const QMC_CHIP_ID: u8 = 0x0D;

const QMC_STATUS_DRDY: u8 = 0x01;
const QMC_STATUS_OVL: u8 = 0x02;

pub struct Qmc5883l {
    i2c: I2c,
}

impl Qmc5883l {
    pub fn new() -> Result<Self, SensorError> {
        let mut i2c = I2c::new()?;
        i2c.set_slave_address(QMC5883L_ADDR)?;

        let chip_id = i2c.smbus_read_byte(QMC_CHIP_ID)?;
        if chip_id != 0xFF {
            return Err(SensorError::WrongDevice {
                found: chip_id,
                expected: 0xFF,
            });
        }

        // Soft reset, then the recommended SET/RESET period
        i2c.smbus_write_byte(QMC_CONTROL2, 0x80)?;
        thread::sleep(Duration::from_millis(10));
        i2c.smbus_write_byte(QMC_SET_RESET_PERIOD, 0x01)?;

        // CONTROL1: OSR 512, range ±8 gauss, ODR 200 Hz, continuous mode
        i2c.smbus_write_byte(QMC_CONTROL1, 0x1D)?;

        thread::sleep(Duration::from_millis(100));

        let status = i2c.smbus_read_byte(QMC_STATUS)?;
        if status & QMC_STATUS_DRDY == 0 {
            return Err(SensorError::NotResponding);
        }

        info!("Compass (QMC5883L) initialized");
        Ok(Self { i2c })
    }
}

impl Magnetometer for Qmc5883l {
    fn read_raw(&mut self) -> Result<RawSample, SensorError> {
        let status = self.i2c.smbus_read_byte(QMC_STATUS)?;
        if status & QMC_STATUS_DRDY == 0 {
            return Err(SensorError::DataNotReady);
        }
        if status & QMC_STATUS_OVL != 0 {
            return Err(SensorError::Overflow);
        }

        read_xy(&mut self.i2c, QMC_OUT_X_L)
    }
}

// LIS3MDL register map
const LIS_WHO_AM_I: u8 = 0x0F;
const LIS_CTRL_REG1: u8 = 0x20;
const LIS_CTRL_REG2: u8 = 0x21;
const LIS_CTRL_REG3: u8 = 0x22;
const LIS_CTRL_REG4: u8 = 0x23;
const LIS_CTRL_REG5: u8 = 0x24;
const LIS_STATUS_REG: u8 = 0x27;
const LIS_OUT_X_L: u8 = 0x28;

const LIS_STATUS_ZYXDA: u8 = 0x08;

pub struct Lis3mdl {
    i2c: I2c,
}

impl Lis3mdl {
    pub fn new() -> Result<Self, SensorError> {
        let mut i2c = I2c::new()?;
        i2c.set_slave_address(LIS3MDL_ADDR)?;

        let who_am_i = i2c.smbus_read_byte(LIS_WHO_AM_I)?;
        if who_am_i != 0x3D {
            return Err(SensorError::WrongDevice {
                found: who_am_i,
                expected: 0x3D,
            });
        }

        // Ultra-high performance X/Y, ODR 80 Hz
        i2c.smbus_write_byte(LIS_CTRL_REG1, 0x7C)?;
        // ±4 gauss
        i2c.smbus_write_byte(LIS_CTRL_REG2, 0x00)?;
        // Continuous conversion
        i2c.smbus_write_byte(LIS_CTRL_REG3, 0x00)?;
        // Ultra-high performance Z, little endian
        i2c.smbus_write_byte(LIS_CTRL_REG4, 0x0C)?;
        // Block data update
        i2c.smbus_write_byte(LIS_CTRL_REG5, 0x40)?;

        thread::sleep(Duration::from_millis(100));

        let status = i2c.smbus_read_byte(LIS_STATUS_REG)?;
        if status == 0 {
            return Err(SensorError::NotResponding);
        }

        info!("Compass (LIS3MDL) initialized");
        Ok(Self { i2c })
    }
}

impl Magnetometer for Lis3mdl {
    fn read_raw(&mut self) -> Result<RawSample, SensorError> {
        let status = self.i2c.smbus_read_byte(LIS_STATUS_REG)?;
        if status & LIS_STATUS_ZYXDA == 0 {
            return Err(SensorError::DataNotReady);
        }

        read_xy(&mut self.i2c, LIS_OUT_X_L)
    }
}
