//! Text frame encoding for the serial ESC bridge.
//!
//! The bridge MCU drives the ESCs from servo pulse widths it receives as
//! ASCII frames, one field per rotor:
//!
//! ```text
//! <channel>:<pulse_us>|
//! ```
//!
//! e.g. `1:1500|2:1000|3:1500|4:1000|`. Channels are the one-based ESC
//! outputs of [`Rotor::channel`].

use flight_core::{Rotor, RotorLoads};

/// Shortest pulse an ESC accepts (idle), in microseconds.
pub const PULSE_MIN_US: u16 = 1000;

/// Longest pulse an ESC accepts (full thrust), in microseconds.
pub const PULSE_MAX_US: u16 = 2000;

/// Maximum size of one encoded frame.
///
/// Breakdown: 4 fields of channel(1) + colon(1) + pulse(4) + bar(1) = 28
/// We use 32 for safety margin.
pub const MAX_FRAME_SIZE: usize = 32;

/// Error type for frame encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// The output buffer is too small to hold the frame.
    BufferTooSmall,
}

/// Servo pulse width for a `[0,100]` rotor load.
///
/// Linear over the standard 1-2 ms ESC band, clamped so that a load
/// fractionally outside the band from float arithmetic still produces a
/// legal pulse.
#[inline]
#[must_use]
pub fn pulse_us(load: f32) -> u16 {
    let pulse = PULSE_MIN_US as f32 + load * 10.0;
    pulse.clamp(PULSE_MIN_US as f32, PULSE_MAX_US as f32) as u16
}

/// Encode all four rotor loads into one frame.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// Returns [`FrameError::BufferTooSmall`] if the buffer cannot hold
/// [`MAX_FRAME_SIZE`] bytes.
pub fn encode_frame(loads: &RotorLoads, buf: &mut [u8]) -> Result<usize, FrameError> {
    if buf.len() < MAX_FRAME_SIZE {
        return Err(FrameError::BufferTooSmall);
    }

    let mut pos = 0;
    for rotor in Rotor::ALL {
        buf[pos] = b'0' + rotor.channel();
        pos += 1;
        buf[pos] = b':';
        pos += 1;
        pos += write_u16(&mut buf[pos..], pulse_us(loads.load(rotor)));
        buf[pos] = b'|';
        pos += 1;
    }

    Ok(pos)
}

/// Encode all four rotor loads into a `heapless::Vec`.
///
/// # Errors
///
/// Returns [`FrameError::BufferTooSmall`] if `N` is not large enough.
pub fn encode_frame_vec<const N: usize>(
    loads: &RotorLoads,
) -> Result<heapless::Vec<u8, N>, FrameError> {
    let mut vec = heapless::Vec::new();
    vec.resize(N, 0).map_err(|_| FrameError::BufferTooSmall)?;
    let len = encode_frame(loads, &mut vec)?;
    vec.truncate(len);
    Ok(vec)
}

/// Write a u16 as an unsigned decimal string, returning the length.
#[inline]
fn write_u16(buf: &mut [u8], value: u16) -> usize {
    if value == 0 {
        buf[0] = b'0';
        return 1;
    }

    let mut temp = [0u8; 5];
    let mut n = value;
    let mut len = 0;
    while n > 0 {
        temp[len] = b'0' + (n % 10) as u8;
        n /= 10;
        len += 1;
    }

    for i in (0..len).rev() {
        buf[len - 1 - i] = temp[i];
    }

    len
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn test_pulse_band() {
        assert_eq!(pulse_us(0.0), 1000);
        assert_eq!(pulse_us(50.0), 1500);
        assert_eq!(pulse_us(100.0), 2000);
    }

    #[test]
    fn test_pulse_fractional_load() {
        assert_eq!(pulse_us(40.04), 1400);
        assert_eq!(pulse_us(39.99), 1399);
    }

    #[test]
    fn test_pulse_clamped() {
        assert_eq!(pulse_us(-1.0), 1000);
        assert_eq!(pulse_us(101.0), 2000);
    }

    #[test]
    fn test_encode_frame() {
        let loads = RotorLoads([0.0, 50.0, 100.0, 25.0]);
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let len = encode_frame(&loads, &mut buf).unwrap();

        assert_eq!(&buf[..len], b"1:1000|2:1500|3:2000|4:1250|");
    }

    #[test]
    fn test_encode_frame_fits_declared_max() {
        let loads = RotorLoads([100.0; 4]);
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let len = encode_frame(&loads, &mut buf).unwrap();
        assert!(len <= MAX_FRAME_SIZE);
    }

    #[test]
    fn test_encode_frame_vec() {
        let loads = RotorLoads([0.0; 4]);
        let vec = encode_frame_vec::<MAX_FRAME_SIZE>(&loads).unwrap();
        assert_eq!(&vec[..], b"1:1000|2:1000|3:1000|4:1000|");
    }

    #[test]
    fn test_encode_frame_buffer_too_small() {
        let loads = RotorLoads::default();
        let mut buf = [0u8; 16];
        assert_eq!(
            encode_frame(&loads, &mut buf),
            Err(FrameError::BufferTooSmall)
        );
    }
}
