//! Serialization for command-link messages.
//!
//! This module provides the [`Serialize`] trait for both link directions:
//! [`LinkRequest`] for the pilot client, [`LinkReply`] for the vehicle.
//!
//! # Protocol Format
//!
//! ## Requests
//!
//! ```text
//! C<axis>:<value>*<checksum>\n
//! P*<checksum>\n
//! S*<checksum>\n
//! ```
//!
//! ## Replies
//!
//! ```text
//! A<0|1>*<checksum>\n
//! S<throttle>:<rudder>:<elevator>:<aileron>*<checksum>\n
//! ```

use crate::crc::CRC8;
use crate::fmt::{write_hex_u8, write_i16, write_u8};
use crate::types::{axis_letter, LinkReply, LinkRequest};

/// Helper for buffer management with incremental CRC-8 checksum calculation.
///
/// Writes directly to the output buffer while accumulating the CRC-8 checksum,
/// eliminating the need for intermediate payload buffers.
struct SerializeBuf<'a> {
    buf: &'a mut [u8],
    pos: usize,
    crc: crc::Digest<'static, u8>,
}

impl<'a> SerializeBuf<'a> {
    /// Create a new serialization buffer.
    #[inline]
    fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            crc: CRC8.digest(),
        }
    }

    /// Write a byte without checksumming (for prefix, separator, newline).
    #[inline]
    fn write_raw(&mut self, byte: u8) {
        self.buf[self.pos] = byte;
        self.pos += 1;
    }

    /// Write a byte and accumulate into CRC-8 checksum.
    #[inline]
    fn write(&mut self, byte: u8) {
        self.buf[self.pos] = byte;
        self.crc.update(&[byte]);
        self.pos += 1;
    }

    /// Write i16 decimal with checksum.
    #[inline]
    fn write_i16(&mut self, value: i16) {
        let mut tmp = [0u8; 6];
        let len = write_i16(&mut tmp, value);
        for &b in &tmp[..len] {
            self.write(b);
        }
    }

    /// Write u8 decimal with checksum.
    #[inline]
    fn write_u8(&mut self, value: u8) {
        let mut tmp = [0u8; 3];
        let len = write_u8(&mut tmp, value);
        for &b in &tmp[..len] {
            self.write(b);
        }
    }

    /// Finalize by writing CRC-8 checksum and newline.
    #[inline]
    fn finalize(self) -> usize {
        let checksum = self.crc.finalize();
        let mut pos = self.pos;

        // Write directly to buffer since we've consumed the CRC digest
        self.buf[pos] = b'*';
        pos += 1;

        pos += write_hex_u8(&mut self.buf[pos..], checksum);

        self.buf[pos] = b'\n';
        pos += 1;

        pos
    }
}

/// Maximum size of a serialized request.
///
/// Breakdown: C(1) + axis(1) + colon(1) + value(6) + *(1) + checksum(2) + \n(1) = 13
/// We use 16 for safety margin.
pub const MAX_REQUEST_SIZE: usize = 16;

/// Maximum size of a serialized reply.
///
/// Breakdown: S(1) + throttle(3) + 3*colon(3) + 3*deflection(12) + *(1) + checksum(2) + \n(1) = 23
/// We use 24 for safety margin.
pub const MAX_REPLY_SIZE: usize = 24;

/// Error type for serialization operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerializeError {
    /// The output buffer is too small to hold the serialized message.
    BufferTooSmall,
    /// A write operation failed (for I/O adapters).
    WriteError,
}

impl core::fmt::Display for SerializeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::WriteError => write!(f, "write error"),
        }
    }
}

/// Extension trait for serializing protocol messages.
pub trait Serialize {
    /// Serialize to the provided buffer.
    ///
    /// Returns the number of bytes written on success.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::BufferTooSmall`] if the buffer is not large enough.
    fn serialize(&self, buf: &mut [u8]) -> Result<usize, SerializeError>;

    /// Serialize to a `heapless::Vec`.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::BufferTooSmall`] if `N` is not large enough.
    #[cfg(feature = "heapless")]
    fn serialize_to_vec<const N: usize>(&self) -> Result<heapless::Vec<u8, N>, SerializeError> {
        let mut vec = heapless::Vec::new();
        // Resize to full capacity to allow serialize() to write
        vec.resize(N, 0)
            .map_err(|_| SerializeError::BufferTooSmall)?;
        let len = self.serialize(&mut vec)?;
        vec.truncate(len);
        Ok(vec)
    }

    /// Serialize to a `core::fmt::Write` implementation.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::WriteError`] if the write fails.
    fn serialize_fmt<W: core::fmt::Write>(&self, writer: &mut W) -> Result<(), SerializeError>;

    /// Serialize to an `embedded_io::Write` implementation.
    ///
    /// This can be used with UART or other I/O peripherals.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::WriteError`] if the write fails.
    #[cfg(feature = "embedded-io")]
    fn serialize_io<W: embedded_io::Write>(&self, writer: &mut W) -> Result<(), SerializeError>;
}

impl Serialize for LinkRequest {
    fn serialize(&self, buf: &mut [u8]) -> Result<usize, SerializeError> {
        if buf.len() < MAX_REQUEST_SIZE {
            return Err(SerializeError::BufferTooSmall);
        }

        let mut sb = SerializeBuf::new(buf);

        match self {
            Self::Command { axis, value } => {
                sb.write_raw(b'C');
                sb.write(axis_letter(*axis));
                sb.write(b':');
                sb.write_i16(*value);
            }
            Self::Ping => sb.write_raw(b'P'),
            Self::StateQuery => sb.write_raw(b'S'),
        }

        Ok(sb.finalize())
    }

    fn serialize_fmt<W: core::fmt::Write>(&self, writer: &mut W) -> Result<(), SerializeError> {
        let mut buf = [0u8; MAX_REQUEST_SIZE];
        let len = self.serialize(&mut buf)?;

        let s = core::str::from_utf8(&buf[..len]).map_err(|_| SerializeError::WriteError)?;
        writer.write_str(s).map_err(|_| SerializeError::WriteError)
    }

    #[cfg(feature = "embedded-io")]
    fn serialize_io<W: embedded_io::Write>(&self, writer: &mut W) -> Result<(), SerializeError> {
        let mut buf = [0u8; MAX_REQUEST_SIZE];
        let len = self.serialize(&mut buf)?;
        writer
            .write_all(&buf[..len])
            .map_err(|_| SerializeError::WriteError)
    }
}

impl Serialize for LinkReply {
    fn serialize(&self, buf: &mut [u8]) -> Result<usize, SerializeError> {
        if buf.len() < MAX_REPLY_SIZE {
            return Err(SerializeError::BufferTooSmall);
        }

        let mut sb = SerializeBuf::new(buf);

        match self {
            Self::Ack(accepted) => {
                sb.write_raw(b'A');
                sb.write(if *accepted { b'1' } else { b'0' });
            }
            Self::State(state) => {
                sb.write_raw(b'S');
                sb.write_u8(state.throttle);
                sb.write(b':');
                sb.write_i16(state.rudder as i16);
                sb.write(b':');
                sb.write_i16(state.elevator as i16);
                sb.write(b':');
                sb.write_i16(state.aileron as i16);
            }
        }

        Ok(sb.finalize())
    }

    fn serialize_fmt<W: core::fmt::Write>(&self, writer: &mut W) -> Result<(), SerializeError> {
        let mut buf = [0u8; MAX_REPLY_SIZE];
        let len = self.serialize(&mut buf)?;

        let s = core::str::from_utf8(&buf[..len]).map_err(|_| SerializeError::WriteError)?;
        writer.write_str(s).map_err(|_| SerializeError::WriteError)
    }

    #[cfg(feature = "embedded-io")]
    fn serialize_io<W: embedded_io::Write>(&self, writer: &mut W) -> Result<(), SerializeError> {
        let mut buf = [0u8; MAX_REPLY_SIZE];
        let len = self.serialize(&mut buf)?;
        writer
            .write_all(&buf[..len])
            .map_err(|_| SerializeError::WriteError)
    }
}
