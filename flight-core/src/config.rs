//! Flight controller configuration.

use crate::stabilizer::StabilizationConfig;
use crate::types::FrameMode;

/// Complete control-core configuration.
///
/// Defaults are the tuning of the original airframe ("Maggie"); every
/// value here is expected to be adjusted per vehicle.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlightConfig {
    /// Rotor arrangement. Fixed at startup.
    pub frame_mode: FrameMode,
    /// Smoothing window capacity for the accelerometer channels.
    /// Higher values smooth more at the cost of responsiveness.
    pub accel_window: usize,
    /// Smoothing window capacity for the gyro channels.
    pub gyro_window: usize,
    /// Inertial sampling period.
    pub sensor_period_ms: u64,
    /// Command-link liveness deadline.
    pub link_timeout_ms: u64,
    /// Whether a failsafe clears the stabilization bias or retains it
    /// for the recovery.
    pub clear_bias_on_failsafe: bool,
    /// Stabilization tuning.
    pub stabilization: StabilizationConfig,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            frame_mode: FrameMode::X,
            accel_window: 3,
            gyro_window: 3,
            sensor_period_ms: 20,
            link_timeout_ms: 5000,
            clear_bias_on_failsafe: false,
            stabilization: StabilizationConfig::default(),
        }
    }
}
