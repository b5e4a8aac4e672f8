//! Field writers for link lines.
//!
//! The wire format is plain ASCII, so the numeric fields (axis values,
//! state snapshots, the checksum) are rendered straight into the
//! caller's buffer. No allocation, no `core::fmt` machinery.

/// Write the checksum field: two uppercase hex digits.
///
/// Returns the number of bytes written (always 2).
///
/// # Panics
///
/// Panics if `buf.len() < 2`.
#[inline]
pub fn write_hex_u8(buf: &mut [u8], value: u8) -> usize {
    buf[0] = hex_digit(value >> 4);
    buf[1] = hex_digit(value & 0x0F);
    2
}

#[inline]
fn hex_digit(nibble: u8) -> u8 {
    match nibble {
        0..=9 => b'0' + nibble,
        _ => b'A' + nibble - 10,
    }
}

/// Write a signed axis value as decimal, `-` prefixed when negative.
///
/// Returns the number of bytes written (1 to 6, `-32768` being the
/// widest).
///
/// # Panics
///
/// Panics if the buffer cannot hold the rendered value.
#[inline]
pub fn write_i16(buf: &mut [u8], value: i16) -> usize {
    if value < 0 {
        buf[0] = b'-';
        // unsigned_abs sidesteps the i16::MIN negation overflow
        1 + write_digits(&mut buf[1..], value.unsigned_abs())
    } else {
        write_digits(buf, value as u16)
    }
}

/// Write a throttle or load value as decimal (1 to 3 bytes).
///
/// # Panics
///
/// Panics if the buffer cannot hold the rendered value.
#[inline]
pub fn write_u8(buf: &mut [u8], value: u8) -> usize {
    write_digits(buf, u16::from(value))
}

/// Digits most significant first, no sign, at least one digit.
fn write_digits(buf: &mut [u8], value: u16) -> usize {
    let mut divisor = 1u16;
    while value / divisor >= 10 {
        divisor *= 10;
    }

    let mut rest = value;
    let mut pos = 0;
    loop {
        buf[pos] = b'0' + (rest / divisor) as u8;
        rest %= divisor;
        pos += 1;
        if divisor == 1 {
            return pos;
        }
        divisor /= 10;
    }
}
