//! ESC output encodings for the flight core.
//!
//! This crate turns final rotor loads into what the two supported ESC
//! backends actually consume. It is chip-agnostic and fully testable on
//! host:
//!
//! - [`frame`]: ASCII frames for a serial ESC bridge MCU
//! - [`pwm`]: Duty-cycle math for a PCA9685 PWM driver
//!
//! # Example
//!
//! ```
//! use esc_proto::{encode_frame, duty_cycle, MAX_FRAME_SIZE};
//! use flight_core::RotorLoads;
//!
//! let loads = RotorLoads([50.0; 4]);
//!
//! let mut buf = [0u8; MAX_FRAME_SIZE];
//! let len = encode_frame(&loads, &mut buf).unwrap();
//! assert!(buf[..len].starts_with(b"1:1500|"));
//!
//! assert_eq!(duty_cycle(50.0), 305);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

pub mod frame;
pub mod pwm;

// Re-export main items at crate root
pub use frame::{
    encode_frame, encode_frame_vec, pulse_us, FrameError, MAX_FRAME_SIZE, PULSE_MAX_US,
    PULSE_MIN_US,
};
pub use pwm::{duty_cycle, COUNTS_PER_CYCLE, DUTY_MAX, DUTY_MIN, PWM_FREQUENCY_HZ};
