//! Message types for the command link.

use flight_core::{Axis, ControlState};

/// A request from the remote pilot client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkRequest {
    /// Set one control axis to a raw value.
    Command { axis: Axis, value: i16 },
    /// Pure liveness signal, no state change.
    Ping,
    /// Ask for the committed control state.
    StateQuery,
}

/// A reply sent back to the remote pilot client.
///
/// The link runs in lockstep: every request gets exactly one reply.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkReply {
    /// Whether the request was accepted and committed.
    Ack(bool),
    /// Snapshot of the committed control state.
    State(ControlState),
}

/// The wire letter for an axis.
#[inline]
#[must_use]
pub fn axis_letter(axis: Axis) -> u8 {
    match axis {
        Axis::Throttle => b'T',
        Axis::Rudder => b'R',
        Axis::Elevator => b'E',
        Axis::Aileron => b'A',
    }
}

/// The axis for a wire letter, if valid.
#[inline]
#[must_use]
pub fn axis_from_letter(letter: u8) -> Option<Axis> {
    match letter {
        b'T' => Some(Axis::Throttle),
        b'R' => Some(Axis::Rudder),
        b'E' => Some(Axis::Elevator),
        b'A' => Some(Axis::Aileron),
        _ => None,
    }
}
