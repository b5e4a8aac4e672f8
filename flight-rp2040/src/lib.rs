//! Quadrotor flight controller firmware for RP2040.
//!
//! This crate provides the embedded implementation of the flight control
//! core for a Raspberry Pi Pico (RP2040):
//!
//! 1. Receives pilot commands over UART (115200 baud, 8N1)
//! 2. Runs the mixing, smoothing, stabilization and watchdog logic from
//!    [`flight_core`]
//! 3. Drives the four ESCs through a PCA9685 PWM chip or a serial bridge
//!
//! # Hardware Configuration
//!
//! | Function  | GPIO | Description |
//! |-----------|------|-------------|
//! | UART1 TX  | 8    | Link replies to the pilot client |
//! | UART1 RX  | 9    | Pilot commands |
//! | I2C0 SDA  | 4    | MPU-6050 (0x68) and PCA9685 (0x40) |
//! | I2C0 SCL  | 5    | Shared bus clock |
//! | UART0 TX  | 0    | ESC bridge frames (`esc-uart` only) |
//!
//! # Architecture
//!
//! The firmware uses the Embassy async runtime with three concurrent
//! tasks:
//!
//! - **Link Task**: Reads UART lines, parses requests, forwards them to
//!   the core and sends its replies back, in lockstep
//! - **IMU Task**: Samples the MPU-6050 on a fixed ticker and signals the
//!   latest reading (a failed read skips the cycle)
//! - **Core Task**: Owns the [`FlightController`](flight_core::FlightController)
//!   and the actuator, and serializes commands, samples and the watchdog
//!   deadline into single-threaded control-loop iterations
//!
//! Requests travel over a bounded [`Channel`](embassy_sync::channel::Channel)
//! so the link task blocks rather than drop commands; samples travel over
//! a [`Signal`](embassy_sync::signal::Signal) with "latest value wins"
//! semantics, since only the most recent attitude reading matters.
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)
//! - **`esc-pca9685`** (default): PCA9685 PWM output on the shared I2C bus
//! - **`esc-uart`**: Serial bridge MCU output on UART0
//!
//! # Re-exports
//!
//! This crate re-exports the public items of [`flight_core`] for
//! convenience, so consumers only need to depend on this crate.

#![no_std]

// Ensure mutually exclusive ESC backend features
#[cfg(all(feature = "esc-pca9685", feature = "esc-uart"))]
compile_error!("Cannot enable both `esc-pca9685` and `esc-uart` features - they claim the same actuator role");

// Re-export core types for convenience
pub use flight_core::{
    Axis, CommandError, ControlState, FlightConfig, FlightController, FrameMode, ImuError,
    ImuSample, ImuSource, LinkState, MixError, Rotor, RotorLoads, RotorVector,
};

pub mod actuator;
pub mod imu;
pub mod link;

pub use actuator::TimedSink;

#[cfg(feature = "esc-pca9685")]
pub use actuator::Pca9685Output;

#[cfg(feature = "esc-uart")]
pub use actuator::UartEscOutput;

pub use imu::{ImuOffsets, Mpu6050};
pub use link::{LinkError, LinkPort};
