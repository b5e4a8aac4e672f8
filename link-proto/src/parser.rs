//! Command-link parser.
//!
//! Supports three request types:
//! - Command (C prefix): `C<axis>:<value>*<checksum>\n`
//! - Ping (P prefix): `P*<checksum>\n`
//! - State query (S prefix): `S*<checksum>\n`
//!
//! and the two replies of the return direction:
//! - Ack (A prefix): `A<0|1>*<checksum>\n`
//! - State (S prefix): `S<throttle>:<rudder>:<elevator>:<aileron>*<checksum>\n`

use flight_core::ControlState;

use crate::crc::calculate_crc8;
use crate::types::{axis_from_letter, LinkReply, LinkRequest};

/// Maximum line length for the protocol (including newline).
pub const MAX_LINE_LENGTH: usize = 32;

/// Minimum valid command message length: CT:0*XX = 7 chars
const MIN_COMMAND_LEN: usize = 7;

/// Minimum valid bare (payload-free) message length: P*XX = 4 chars
const MIN_BARE_LEN: usize = 4;

/// Minimum valid ack reply length: A0*XX = 5 chars
const MIN_ACK_LEN: usize = 5;

/// Minimum valid state reply length: S0:0:0:0*XX = 11 chars
const MIN_STATE_LEN: usize = 11;

/// Error type for parsing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Malformed message (bad prefix, field, or number).
    Parse,
    /// Checksum verification failed.
    Checksum,
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Parse => write!(f, "parse error"),
            Self::Checksum => write!(f, "checksum mismatch"),
        }
    }
}

/// Parse a request line from the remote pilot client.
///
/// # Protocol Format
///
/// ```text
/// C<axis>:<value>*<checksum>\n
/// P*<checksum>\n
/// S*<checksum>\n
/// ```
///
/// - `axis` - One of `T`, `R`, `E`, `A`
/// - `value` - Signed decimal i16 (range-checked downstream, not here)
/// - `checksum` - 2 hex digits (CRC-8/SMBUS of the bytes between the
///   prefix and `*`)
/// - `\n` - Line terminator (CR ignored if present)
pub fn parse_request(line: &[u8]) -> Result<LinkRequest, ParseError> {
    let line = strip_line_ending(line);

    if line.is_empty() {
        return Err(ParseError::Parse);
    }

    match line[0] {
        b'C' => parse_command(line),
        b'P' => parse_bare(line).map(|()| LinkRequest::Ping),
        b'S' => parse_bare(line).map(|()| LinkRequest::StateQuery),
        _ => Err(ParseError::Parse),
    }
}

/// Parse a reply line (the client side of the link).
pub fn parse_reply(line: &[u8]) -> Result<LinkReply, ParseError> {
    let line = strip_line_ending(line);

    if line.is_empty() {
        return Err(ParseError::Parse);
    }

    match line[0] {
        b'A' => parse_ack(line),
        b'S' => parse_state(line),
        _ => Err(ParseError::Parse),
    }
}

/// Parse a command message (C prefix).
fn parse_command(line: &[u8]) -> Result<LinkRequest, ParseError> {
    let payload = extract_verified_payload(line, MIN_COMMAND_LEN)?;

    // Payload: <axis>:<value>
    let colon_pos = payload
        .iter()
        .position(|&b| b == b':')
        .ok_or(ParseError::Parse)?;

    let field = &payload[..colon_pos];
    let value = &payload[colon_pos + 1..];

    if field.len() != 1 {
        return Err(ParseError::Parse);
    }
    let axis = axis_from_letter(field[0]).ok_or(ParseError::Parse)?;
    let value = parse_i16(value)?;

    Ok(LinkRequest::Command { axis, value })
}

/// Parse a payload-free message (P and S requests).
fn parse_bare(line: &[u8]) -> Result<(), ParseError> {
    let payload = extract_verified_payload(line, MIN_BARE_LEN)?;
    if !payload.is_empty() {
        return Err(ParseError::Parse);
    }
    Ok(())
}

/// Parse an ack reply (A prefix).
fn parse_ack(line: &[u8]) -> Result<LinkReply, ParseError> {
    let payload = extract_verified_payload(line, MIN_ACK_LEN)?;
    match payload {
        b"1" => Ok(LinkReply::Ack(true)),
        b"0" => Ok(LinkReply::Ack(false)),
        _ => Err(ParseError::Parse),
    }
}

/// Parse a state reply (S prefix).
fn parse_state(line: &[u8]) -> Result<LinkReply, ParseError> {
    let payload = extract_verified_payload(line, MIN_STATE_LEN)?;

    // Payload: throttle:rudder:elevator:aileron
    let mut parts = payload.split(|&b| b == b':');

    let throttle_str = parts.next().ok_or(ParseError::Parse)?;
    let rudder_str = parts.next().ok_or(ParseError::Parse)?;
    let elevator_str = parts.next().ok_or(ParseError::Parse)?;
    let aileron_str = parts.next().ok_or(ParseError::Parse)?;

    // Should have no more parts
    if parts.next().is_some() {
        return Err(ParseError::Parse);
    }

    Ok(LinkReply::State(ControlState {
        throttle: parse_u8(throttle_str)?,
        rudder: parse_i8(rudder_str)?,
        elevator: parse_i8(elevator_str)?,
        aileron: parse_i8(aileron_str)?,
    }))
}

/// Strip trailing CR and/or LF from a line.
#[inline]
fn strip_line_ending(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    if end > 0 && line[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && line[end - 1] == b'\r' {
        end -= 1;
    }
    &line[..end]
}

/// Extract and verify the checksum, returning the payload slice.
///
/// The `min_len` parameter is the minimum valid message length.
/// The input line should have line endings already stripped.
#[inline]
fn extract_verified_payload(line: &[u8], min_len: usize) -> Result<&[u8], ParseError> {
    if line.len() < min_len {
        return Err(ParseError::Parse);
    }

    let checksum_pos = line
        .iter()
        .rposition(|&b| b == b'*')
        .ok_or(ParseError::Parse)?;

    if checksum_pos + 3 != line.len() {
        return Err(ParseError::Parse);
    }

    let payload = &line[1..checksum_pos];
    let checksum_str = &line[checksum_pos + 1..];
    let expected_checksum = calculate_crc8(payload);
    let received_checksum = parse_hex_u8(checksum_str)?;

    if expected_checksum != received_checksum {
        return Err(ParseError::Checksum);
    }

    Ok(payload)
}

/// Parse a 2-character hex string as u8.
#[inline]
fn parse_hex_u8(s: &[u8]) -> Result<u8, ParseError> {
    if s.len() != 2 {
        return Err(ParseError::Parse);
    }
    let high = hex_digit(s[0])?;
    let low = hex_digit(s[1])?;
    Ok((high << 4) | low)
}

/// Convert a hex character to its value.
#[inline]
fn hex_digit(b: u8) -> Result<u8, ParseError> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        _ => Err(ParseError::Parse),
    }
}

/// Parse a decimal string as i16 (with optional sign).
#[inline]
fn parse_i16(s: &[u8]) -> Result<i16, ParseError> {
    if s.is_empty() {
        return Err(ParseError::Parse);
    }

    let (negative, s) = if s[0] == b'-' {
        (true, &s[1..])
    } else if s[0] == b'+' {
        (false, &s[1..])
    } else {
        (false, s)
    };

    if s.is_empty() {
        return Err(ParseError::Parse);
    }

    let mut value: i32 = 0;
    for &b in s {
        if !b.is_ascii_digit() {
            return Err(ParseError::Parse);
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add((b - b'0') as i32))
            .ok_or(ParseError::Parse)?;
    }

    if negative {
        value = -value;
    }

    if value < i16::MIN as i32 || value > i16::MAX as i32 {
        return Err(ParseError::Parse);
    }

    Ok(value as i16)
}

/// Parse a decimal string as i8.
#[inline]
fn parse_i8(s: &[u8]) -> Result<i8, ParseError> {
    let value = parse_i16(s)?;
    if value < i8::MIN as i16 || value > i8::MAX as i16 {
        return Err(ParseError::Parse);
    }
    Ok(value as i8)
}

/// Parse a decimal string as u8.
#[inline]
fn parse_u8(s: &[u8]) -> Result<u8, ParseError> {
    if s.is_empty() {
        return Err(ParseError::Parse);
    }

    let mut value: u16 = 0;
    for &b in s {
        if !b.is_ascii_digit() {
            return Err(ParseError::Parse);
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add((b - b'0') as u16))
            .ok_or(ParseError::Parse)?;
    }

    if value > u8::MAX as u16 {
        return Err(ParseError::Parse);
    }

    Ok(value as u8)
}
