//! Inertial sample source trait and error types.

use core::future::Future;

/// Raw 6-channel inertial reading, channel order x, y, z.
///
/// Values are the sensor's signed 16-bit register readings; the core is
/// agnostic to the underlying register/bus encoding and to scale factors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ImuSample {
    pub accel: [i16; 3],
    pub gyro: [i16; 3],
}

/// Error type for inertial sample reads.
///
/// A failed read means "skip this cycle": the last smoothed values and the
/// stabilization bias stay as they are. Errors never turn into sample data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ImuError {
    /// Bus transfer failed (NACK, arbitration loss, device stall).
    Bus,
    /// The device did not identify as the expected sensor.
    BadDevice,
}

/// Async trait for periodic inertial sample sources.
///
/// Abstracts the IMU so the control core can be exercised on host with a
/// scripted source, and so device latency stays off the control path.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap
/// allocation.
pub trait ImuSource {
    /// Read the next raw sample.
    fn sample(&mut self) -> impl Future<Output = Result<ImuSample, ImuError>>;
}
