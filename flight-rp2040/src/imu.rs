//! MPU-6050 inertial sensor driver.
//!
//! Minimal async driver covering what the control loop needs: wake the
//! device, program the per-vehicle hardware offsets, and burst-read the
//! six motion channels. DMP features of the chip are not used.
//!
//! # Wiring
//!
//! The sensor sits on the shared I2C bus at address `0x68` (AD0 low).

use embedded_hal_async::i2c::I2c;
use flight_core::{ImuError, ImuSample, ImuSource};

/// Default I2C address (AD0 pin low).
pub const MPU6050_ADDRESS: u8 = 0x68;

/// Expected WHO_AM_I response.
const WHO_AM_I_VALUE: u8 = 0x68;

// Register map (subset)
const RA_XA_OFFS_H: u8 = 0x06;
const RA_XG_OFFS_USRH: u8 = 0x13;
const RA_SMPLRT_DIV: u8 = 0x19;
const RA_CONFIG: u8 = 0x1A;
const RA_GYRO_CONFIG: u8 = 0x1B;
const RA_ACCEL_CONFIG: u8 = 0x1C;
const RA_ACCEL_XOUT_H: u8 = 0x3B;
const RA_PWR_MGMT_1: u8 = 0x6B;
const RA_WHO_AM_I: u8 = 0x75;

/// Clock source: PLL with X axis gyroscope reference.
const CLKSEL_PLL_XGYRO: u8 = 0x01;

/// Per-vehicle sensor trim, written to the chip's hardware offset
/// registers at init.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, defmt::Format)]
pub struct ImuOffsets {
    pub accel: [i16; 3],
    pub gyro: [i16; 3],
}

/// Async MPU-6050 driver over any `embedded-hal-async` I2C bus.
pub struct Mpu6050<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Mpu6050<I2C> {
    /// Create a driver at the default address. No bus traffic yet.
    #[must_use]
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            address: MPU6050_ADDRESS,
        }
    }

    /// Probe, wake and configure the sensor.
    ///
    /// Verifies WHO_AM_I, selects the X-gyro PLL clock (which also clears
    /// the sleep bit), programs full-scale ranges and the digital low-pass
    /// filter, and writes the hardware offsets.
    ///
    /// # Errors
    ///
    /// [`ImuError::BadDevice`] if WHO_AM_I does not match,
    /// [`ImuError::Bus`] on any transfer failure.
    pub async fn init(&mut self, offsets: &ImuOffsets) -> Result<(), ImuError> {
        let mut who = [0u8; 1];
        self.i2c
            .write_read(self.address, &[RA_WHO_AM_I], &mut who)
            .await
            .map_err(|_| ImuError::Bus)?;
        if who[0] != WHO_AM_I_VALUE {
            return Err(ImuError::BadDevice);
        }

        // Wake from sleep, clock from X gyro PLL
        self.write_reg(RA_PWR_MGMT_1, CLKSEL_PLL_XGYRO).await?;

        // 1 kHz / (1 + 4) = 200 Hz internal sample rate
        self.write_reg(RA_SMPLRT_DIV, 0x04).await?;
        // DLPF at 42 Hz bandwidth
        self.write_reg(RA_CONFIG, 0x03).await?;
        // +/- 250 deg/s and +/- 2 g full scale
        self.write_reg(RA_GYRO_CONFIG, 0x00).await?;
        self.write_reg(RA_ACCEL_CONFIG, 0x00).await?;

        self.write_offsets(RA_XA_OFFS_H, &offsets.accel).await?;
        self.write_offsets(RA_XG_OFFS_USRH, &offsets.gyro).await?;

        Ok(())
    }

    async fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), ImuError> {
        self.i2c
            .write(self.address, &[reg, value])
            .await
            .map_err(|_| ImuError::Bus)
    }

    /// Write three consecutive big-endian i16 offset registers.
    async fn write_offsets(&mut self, base: u8, offsets: &[i16; 3]) -> Result<(), ImuError> {
        for (i, &offset) in offsets.iter().enumerate() {
            let bytes = offset.to_be_bytes();
            // Offset register pairs are 2 apart
            let reg = base + (i as u8) * 2;
            self.i2c
                .write(self.address, &[reg, bytes[0], bytes[1]])
                .await
                .map_err(|_| ImuError::Bus)?;
        }
        Ok(())
    }
}

impl<I2C: I2c> ImuSource for Mpu6050<I2C> {
    async fn sample(&mut self) -> Result<ImuSample, ImuError> {
        // Burst read ACCEL_XOUT_H..GYRO_ZOUT_L; temperature sits in the
        // middle and is discarded
        let mut raw = [0u8; 14];
        self.i2c
            .write_read(self.address, &[RA_ACCEL_XOUT_H], &mut raw)
            .await
            .map_err(|_| ImuError::Bus)?;

        let word = |offset: usize| i16::from_be_bytes([raw[offset], raw[offset + 1]]);

        Ok(ImuSample {
            accel: [word(0), word(2), word(4)],
            gyro: [word(8), word(10), word(12)],
        })
    }
}
