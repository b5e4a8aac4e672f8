//! Mixer: pilot axis commands to per-rotor loads.
//!
//! The mixer is a pure function of `(ControlState, FrameMode)`. Controls
//! are applied in layers with a fixed priority:
//!
//! 1. throttle (seeds all four rotors)
//! 2. elevator
//! 3. rudder
//! 4. aileron
//!
//! Each attitude axis couples into a per-frame-mode set of rotors per sign,
//! looked up from a data table. A candidate that would push any rotor
//! outside `0..=100` is rejected in full; committed state is never touched
//! here.

use crate::types::{Axis, AxisRangeError, ControlState, FrameMode, Rotor, RotorVector};

/// Why a candidate command was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MixError {
    /// The raw axis value is outside the axis's legal range.
    AxisOutOfRange,
    /// The resulting rotor vector would leave `0..=100`.
    RotorOutOfRange,
}

impl From<AxisRangeError> for MixError {
    fn from(_: AxisRangeError) -> Self {
        MixError::AxisOutOfRange
    }
}

/// Rotor sets one axis couples into, per sign of the deflection.
struct AxisCoupling {
    positive: &'static [Rotor],
    negative: &'static [Rotor],
}

/// Per-frame-mode coupling of the three attitude axes.
///
/// Adding a frame mode is a data addition here, not new branch logic.
struct CouplingTable {
    elevator: AxisCoupling,
    rudder: AxisCoupling,
    aileron: AxisCoupling,
}

/// Plus mode: axes couple to single rotors or opposing lateral pairs.
///
/// Elevator is asymmetric: positive raises the rear rotor only, negative
/// raises the front rotor only. Rudder raises one diagonal pair per sign,
/// aileron one lateral rotor per sign.
const PLUS_COUPLING: CouplingTable = CouplingTable {
    elevator: AxisCoupling {
        positive: &[Rotor::R3],
        negative: &[Rotor::R1],
    },
    rudder: AxisCoupling {
        positive: &[Rotor::R2, Rotor::R4],
        negative: &[Rotor::R1, Rotor::R3],
    },
    aileron: AxisCoupling {
        positive: &[Rotor::R4],
        negative: &[Rotor::R2],
    },
};

/// X mode: every axis couples to a rotor pair per sign.
///
/// The pair assignments are disjoint across axes (front/rear for elevator,
/// the two diagonals for rudder, left/right for aileron), so a pure-axis
/// input never moves all four rotors together.
const X_COUPLING: CouplingTable = CouplingTable {
    elevator: AxisCoupling {
        positive: &[Rotor::R3, Rotor::R4],
        negative: &[Rotor::R1, Rotor::R2],
    },
    rudder: AxisCoupling {
        positive: &[Rotor::R2, Rotor::R4],
        negative: &[Rotor::R1, Rotor::R3],
    },
    aileron: AxisCoupling {
        positive: &[Rotor::R1, Rotor::R4],
        negative: &[Rotor::R2, Rotor::R3],
    },
};

const fn coupling(mode: FrameMode) -> &'static CouplingTable {
    match mode {
        FrameMode::X => &X_COUPLING,
        FrameMode::Plus => &PLUS_COUPLING,
    }
}

/// Add one axis's deflection onto the candidate loads.
///
/// A value of exactly zero is axis-neutral and applies no delta.
fn apply_axis(loads: &mut [i16; 4], coupling: &AxisCoupling, value: i16) {
    if value == 0 {
        return;
    }
    let rotors = if value > 0 {
        coupling.positive
    } else {
        coupling.negative
    };
    for rotor in rotors {
        loads[rotor.index()] += value.abs();
    }
}

/// Mix a control state into a rotor vector.
///
/// Pure and deterministic; no state is read or written besides the
/// arguments.
///
/// # Errors
///
/// Returns [`MixError::RotorOutOfRange`] if any resulting rotor load falls
/// outside `0..=100`. Boundary axis inputs (`-100`/`100`) are legal but can
/// still be rejected here.
pub fn mix(state: &ControlState, mode: FrameMode) -> Result<RotorVector, MixError> {
    let mut loads = [state.throttle as i16; 4];
    let table = coupling(mode);

    apply_axis(&mut loads, &table.elevator, state.elevator as i16);
    apply_axis(&mut loads, &table.rudder, state.rudder as i16);
    apply_axis(&mut loads, &table.aileron, state.aileron as i16);

    RotorVector::from_loads(loads).ok_or(MixError::RotorOutOfRange)
}

/// Evaluate a candidate `(axis, value)` command against `state`.
///
/// Overlays the value onto a copy of the state, validates the axis range,
/// and mixes. On success returns the candidate pair for the caller to
/// commit atomically; on rejection the caller's state remains authoritative.
///
/// # Errors
///
/// [`MixError::AxisOutOfRange`] for an illegal raw value,
/// [`MixError::RotorOutOfRange`] if the mixed vector would saturate.
pub fn mix_command(
    state: &ControlState,
    mode: FrameMode,
    axis: Axis,
    value: i16,
) -> Result<(ControlState, RotorVector), MixError> {
    let candidate = state.with_axis(axis, value)?;
    let rotors = mix(&candidate, mode)?;
    Ok((candidate, rotors))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(throttle: u8, rudder: i8, elevator: i8, aileron: i8) -> ControlState {
        ControlState {
            throttle,
            rudder,
            elevator,
            aileron,
        }
    }

    #[test]
    fn test_throttle_only_is_symmetric() {
        // Plus mode, throttle 50, everything else neutral -> {50,50,50,50}
        let vector = mix(&state(50, 0, 0, 0), FrameMode::Plus).unwrap();
        assert_eq!(vector.loads(), [50, 50, 50, 50]);

        let vector = mix(&state(50, 0, 0, 0), FrameMode::X).unwrap();
        assert_eq!(vector.loads(), [50, 50, 50, 50]);
    }

    #[test]
    fn test_plus_elevator_raises_rear() {
        // From throttle 50, elevator +30 -> rear rotor 80, others stay 50
        let vector = mix(&state(50, 0, 30, 0), FrameMode::Plus).unwrap();
        assert_eq!(vector.load(Rotor::R3), 80);
        assert_eq!(vector.load(Rotor::R1), 50);
        assert_eq!(vector.load(Rotor::R2), 50);
        assert_eq!(vector.load(Rotor::R4), 50);
    }

    #[test]
    fn test_plus_negative_elevator_raises_front() {
        let vector = mix(&state(50, 0, -30, 0), FrameMode::Plus).unwrap();
        assert_eq!(vector.load(Rotor::R1), 80);
        assert_eq!(vector.load(Rotor::R3), 50);
    }

    #[test]
    fn test_plus_rudder_raises_diagonal_pair() {
        let vector = mix(&state(40, 20, 0, 0), FrameMode::Plus).unwrap();
        assert_eq!(vector.loads(), [40, 60, 40, 60]);

        let vector = mix(&state(40, -20, 0, 0), FrameMode::Plus).unwrap();
        assert_eq!(vector.loads(), [60, 40, 60, 40]);
    }

    #[test]
    fn test_plus_aileron_raises_single_lateral() {
        let vector = mix(&state(40, 0, 0, 25), FrameMode::Plus).unwrap();
        assert_eq!(vector.loads(), [40, 40, 40, 65]);

        let vector = mix(&state(40, 0, 0, -25), FrameMode::Plus).unwrap();
        assert_eq!(vector.loads(), [40, 65, 40, 40]);
    }

    #[test]
    fn test_x_mode_pairs() {
        // Elevator couples front/rear pairs
        let vector = mix(&state(40, 0, 30, 0), FrameMode::X).unwrap();
        assert_eq!(vector.loads(), [40, 40, 70, 70]);
        let vector = mix(&state(40, 0, -30, 0), FrameMode::X).unwrap();
        assert_eq!(vector.loads(), [70, 70, 40, 40]);

        // Rudder couples the diagonals
        let vector = mix(&state(40, 30, 0, 0), FrameMode::X).unwrap();
        assert_eq!(vector.loads(), [40, 70, 40, 70]);
        let vector = mix(&state(40, -30, 0, 0), FrameMode::X).unwrap();
        assert_eq!(vector.loads(), [70, 40, 70, 40]);

        // Aileron couples the sides
        let vector = mix(&state(40, 0, 0, 30), FrameMode::X).unwrap();
        assert_eq!(vector.loads(), [70, 40, 40, 70]);
        let vector = mix(&state(40, 0, 0, -30), FrameMode::X).unwrap();
        assert_eq!(vector.loads(), [40, 70, 70, 40]);
    }

    #[test]
    fn test_x_mode_pure_axis_moves_two_rotors() {
        for (elevator, rudder, aileron) in [(30, 0, 0), (0, 30, 0), (0, 0, 30)] {
            let vector = mix(&state(40, rudder, elevator, aileron), FrameMode::X).unwrap();
            let moved = vector.loads().iter().filter(|&&l| l != 40).count();
            assert_eq!(moved, 2);
        }
    }

    #[test]
    fn test_saturating_candidate_is_rejected() {
        // Throttle 90, elevator +50 in Plus mode -> rear candidate 140
        let result = mix_command(&state(90, 0, 0, 0), FrameMode::Plus, Axis::Elevator, 50);
        assert_eq!(result, Err(MixError::RotorOutOfRange));
    }

    #[test]
    fn test_boundary_input_legal_but_result_checked() {
        // Elevator -100 at zero throttle is fine: front rotor lands on 100
        let (_, vector) =
            mix_command(&state(0, 0, 0, 0), FrameMode::Plus, Axis::Elevator, -100).unwrap();
        assert_eq!(vector.load(Rotor::R1), 100);

        // The same boundary input saturates once the throttle is up
        let result = mix_command(&state(10, 0, 0, 0), FrameMode::Plus, Axis::Elevator, -100);
        assert_eq!(result, Err(MixError::RotorOutOfRange));
    }

    #[test]
    fn test_axis_range_checked_before_mixing() {
        let result = mix_command(&state(0, 0, 0, 0), FrameMode::Plus, Axis::Throttle, 150);
        assert_eq!(result, Err(MixError::AxisOutOfRange));
    }

    #[test]
    fn test_mix_is_deterministic() {
        let s = state(55, -10, 20, 5);
        assert_eq!(mix(&s, FrameMode::X), mix(&s, FrameMode::X));
        assert_eq!(mix(&s, FrameMode::Plus), mix(&s, FrameMode::Plus));
    }
}
