//! Actuator output sink trait and error types.

use core::future::Future;

use crate::types::RotorLoads;

/// Error type for actuator writes.
///
/// A failed write leaves the motors on their previous setting; the
/// controller marks its output stale and rewrites on the next scheduled
/// update instead of failing the cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActuatorError {
    /// Bus/serial transfer failed.
    Io,
    /// Device not ready (e.g. driver chip not initialized).
    NotReady,
}

/// Async trait for rotor actuator sinks.
///
/// The sink receives final `[0,100]` loads and performs its own
/// hardware-specific encoding (ESC pulse widths, PWM duty registers, ...).
/// Different outputs (PCA9685 driver, serial ESC bridge, host mock) are
/// interchangeable behind this trait.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap
/// allocation.
pub trait ActuatorSink {
    /// Drive all four rotors to the given loads.
    fn write(&mut self, loads: &RotorLoads) -> impl Future<Output = Result<(), ActuatorError>>;

    /// Check if the sink is ready to accept loads.
    fn is_ready(&self) -> bool;
}
