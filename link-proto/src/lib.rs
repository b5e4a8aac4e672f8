//! Serial command-link protocol for the flight core.
//!
//! This crate provides everything needed to work with the pilot command
//! link:
//!
//! - **Types**: Message representations
//!   - [`LinkRequest`] - Commands, pings and state queries from the client
//!   - [`LinkReply`] - Acks and state snapshots back to the client
//!
//! - **Parsing**: Parse incoming protocol messages
//!   - [`parse_request()`] - Vehicle side
//!   - [`parse_reply()`] - Client side
//!
//! - **Serialization**: Serialize outgoing protocol messages
//!   - [`Serialize`] trait for both message directions
//!
//! # Protocol Format
//!
//! The protocol uses ASCII text lines with CRC-8/SMBUS checksums, one
//! message per line, lockstep request/reply.
//!
//! ## Requests
//!
//! ```text
//! C<axis>:<value>*<checksum>\n   set one axis (T, R, E or A)
//! P*<checksum>\n                 liveness ping
//! S*<checksum>\n                 state query
//! ```
//!
//! - `value` - Signed decimal i16; axis range enforcement is the flight
//!   core's job, so an out-of-range command travels intact and earns a
//!   negative ack instead of a parse error
//! - `checksum` - 2 hex digits (CRC-8/SMBUS of the bytes between the
//!   prefix and `*`)
//!
//! ## Replies
//!
//! ```text
//! A<0|1>*<checksum>\n                                       ack
//! S<throttle>:<rudder>:<elevator>:<aileron>*<checksum>\n    state snapshot
//! ```
//!
//! # Examples
//!
//! ```
//! use link_proto::{parse_request, LinkRequest, Serialize};
//! use flight_core::Axis;
//!
//! let request = LinkRequest::Command { axis: Axis::Throttle, value: 50 };
//! let mut buf = [0u8; 16];
//! let len = request.serialize(&mut buf).unwrap();
//! assert_eq!(parse_request(&buf[..len]), Ok(request));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//! - **`heapless`**: Enable `serialize_to_vec()` methods
//! - **`embedded-io`**: Enable `serialize_io()` methods for I/O peripherals
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations,
//! making it suitable for embedded systems with limited resources.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod crc;
mod fmt;
pub mod parser;
pub mod serialize;
pub mod types;

// Re-export types at crate root for convenience
pub use crc::calculate_crc8;
pub use parser::{parse_reply, parse_request, ParseError, MAX_LINE_LENGTH};
pub use serialize::{Serialize, SerializeError, MAX_REPLY_SIZE, MAX_REQUEST_SIZE};
pub use types::{axis_from_letter, axis_letter, LinkReply, LinkRequest};
