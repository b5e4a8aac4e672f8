//! Platform-agnostic quadrotor control core.
//!
//! This crate holds the flight logic with no hardware dependencies: it can
//! run under an embedded executor on the vehicle and as plain functions in
//! host tests.
//!
//! # Overview
//!
//! The crate is organized into several modules:
//!
//! - [`types`]: Core data structures ([`ControlState`], [`RotorVector`], [`Axis`], [`Rotor`])
//! - [`mixer`]: Pure axis-to-rotor mixing ([`mix`], [`mix_command`])
//! - [`smoothing`]: Moving-average sensor filters ([`SmoothingWindow`], [`ImuFilterBank`])
//! - [`stabilizer`]: Threshold-gated attitude trim ([`Stabilizer`])
//! - [`watchdog`]: Command-link liveness deadline ([`LinkWatchdog`])
//! - [`controller`]: Orchestrates the above around an actuator sink ([`FlightController`])
//! - [`imu`]: Inertial source trait ([`ImuSource`])
//! - [`actuator`]: Actuator sink trait ([`ActuatorSink`])
//! - [`config`]: Per-vehicle tuning ([`FlightConfig`])
//!
//! # Control flow
//!
//! A command names one axis and a raw value. The mixer validates it,
//! recomputes all four rotor loads from the full axis state, and either
//! commits both or rejects both. Separately, smoothed accelerometer
//! readings feed a per-rotor bias that trims the committed loads toward
//! level, and a watchdog drops the attitude axes to neutral when the
//! command link goes quiet.
//!
//! # Example
//!
//! ```rust
//! use flight_core::{mix, ControlState, FrameMode, Axis};
//!
//! let state = ControlState::neutral()
//!     .with_axis(Axis::Throttle, 50)
//!     .unwrap()
//!     .with_axis(Axis::Elevator, 30)
//!     .unwrap();
//! let rotors = mix(&state, FrameMode::Plus).unwrap();
//! assert_eq!(rotors.loads(), [50, 50, 80, 50]);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations,
//! making it suitable for embedded systems with limited resources.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod actuator;
pub mod config;
pub mod controller;
pub mod imu;
pub mod mixer;
pub mod smoothing;
pub mod stabilizer;
pub mod types;
pub mod watchdog;

// Re-export main types at crate root
pub use actuator::{ActuatorError, ActuatorSink};
pub use config::FlightConfig;
pub use controller::{CommandError, FlightController};
pub use imu::{ImuError, ImuSample, ImuSource};
pub use mixer::{mix, mix_command, MixError};
pub use smoothing::{ImuFilterBank, SmoothedImu, SmoothingWindow, WindowSizeError, MAX_WINDOW};
pub use stabilizer::{PlusSignConvention, StabilizationConfig, Stabilizer};
pub use types::{
    Axis, AxisRangeError, ControlState, FrameMode, Rotor, RotorLoads, RotorVector,
    StabilizationBias,
};
pub use watchdog::{LinkState, LinkWatchdog};
