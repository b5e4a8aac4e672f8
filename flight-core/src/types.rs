//! Core flight data types: Axis, Rotor, FrameMode, ControlState, RotorVector.

/// Pilot control axis.
///
/// The four axes a command can address. Each axis owns its legal input
/// range: throttle is `0..=100` (percent of maximum thrust), the three
/// attitude axes are `-100..=100` (signed deflection).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    Throttle,
    Rudder,
    Elevator,
    Aileron,
}

impl Axis {
    /// All axes, in mixing priority order.
    pub const ALL: [Axis; 4] = [Axis::Throttle, Axis::Elevator, Axis::Rudder, Axis::Aileron];

    /// Check whether `value` is inside this axis's legal range.
    ///
    /// Wire values arrive as `i16` so that out-of-range commands can be
    /// carried to this check and rejected, rather than truncated.
    #[inline]
    #[must_use]
    pub const fn accepts(self, value: i16) -> bool {
        match self {
            Axis::Throttle => value >= 0 && value <= 100,
            Axis::Rudder | Axis::Elevator | Axis::Aileron => value >= -100 && value <= 100,
        }
    }
}

/// Physical rotor position.
///
/// Rotors keep the numeric identity of the airframe wiring (ESC channels
/// 1-4). What each rotor means aerodynamically depends on [`FrameMode`]:
/// in Plus mode R1 is the front rotor, R2 right, R3 rear, R4 left; in X
/// mode R1 is front-left, R2 front-right, R3 rear-right, R4 rear-left.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotor {
    R1,
    R2,
    R3,
    R4,
}

impl Rotor {
    /// All rotors in channel order.
    pub const ALL: [Rotor; 4] = [Rotor::R1, Rotor::R2, Rotor::R3, Rotor::R4];

    /// Array index for this rotor.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// One-based ESC output channel for this rotor.
    #[inline]
    #[must_use]
    pub const fn channel(self) -> u8 {
        self as u8 + 1
    }
}

/// Airframe rotor arrangement.
///
/// Selects which rotors each control axis couples into. Fixed at startup;
/// not switchable in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameMode {
    /// Rotors on the diagonals, two leading.
    X,
    /// Rotors on the cardinal arms.
    Plus,
}

/// Error for an axis value outside its legal range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisRangeError;

/// The pilot's last accepted command per axis.
///
/// Only mutated through the mixer's commit path; a snapshot of this struct
/// is what the state-query interface reports back to the remote client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlState {
    /// Collective thrust, `0..=100`.
    pub throttle: u8,
    /// Yaw deflection, `-100..=100`.
    pub rudder: i8,
    /// Pitch deflection, `-100..=100`.
    pub elevator: i8,
    /// Roll deflection, `-100..=100`.
    pub aileron: i8,
}

impl ControlState {
    /// All-axes-neutral state (startup default).
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            throttle: 0,
            rudder: 0,
            elevator: 0,
            aileron: 0,
        }
    }

    /// Current value of one axis, widened for mixing arithmetic.
    #[inline]
    #[must_use]
    pub const fn axis(&self, axis: Axis) -> i16 {
        match axis {
            Axis::Throttle => self.throttle as i16,
            Axis::Rudder => self.rudder as i16,
            Axis::Elevator => self.elevator as i16,
            Axis::Aileron => self.aileron as i16,
        }
    }

    /// Build a candidate state with `value` overlaid onto `axis`.
    ///
    /// This is the only way an axis value enters a `ControlState`, so the
    /// range check here is the single source of axis validation.
    ///
    /// # Errors
    ///
    /// Returns [`AxisRangeError`] if `value` is outside the axis's legal
    /// range; `self` is untouched.
    pub fn with_axis(&self, axis: Axis, value: i16) -> Result<Self, AxisRangeError> {
        if !axis.accepts(value) {
            return Err(AxisRangeError);
        }
        let mut candidate = *self;
        match axis {
            Axis::Throttle => candidate.throttle = value as u8,
            Axis::Rudder => candidate.rudder = value as i8,
            Axis::Elevator => candidate.elevator = value as i8,
            Axis::Aileron => candidate.aileron = value as i8,
        }
        Ok(candidate)
    }
}

/// Committed per-rotor loads, each guaranteed inside `0..=100`.
///
/// This is the only value ever handed (after bias rendering) to the
/// actuator sink. Construction is checked; there is no way to hold an
/// out-of-range load in this type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RotorVector([u8; 4]);

impl RotorVector {
    /// All-stopped vector (startup default).
    pub const ZERO: Self = Self([0; 4]);

    /// Vector with every rotor at the same load (failsafe hover shape).
    #[must_use]
    pub const fn uniform(load: u8) -> Self {
        Self([load; 4])
    }

    /// Validate candidate loads into a vector.
    ///
    /// Returns `None` if any load falls outside `0..=100`; rejection is a
    /// property of the resulting vector, not of the raw axis inputs.
    #[must_use]
    pub fn from_loads(loads: [i16; 4]) -> Option<Self> {
        let mut out = [0u8; 4];
        for (slot, &load) in out.iter_mut().zip(loads.iter()) {
            if !(0..=100).contains(&load) {
                return None;
            }
            *slot = load as u8;
        }
        Some(Self(out))
    }

    /// Load of a single rotor.
    #[inline]
    #[must_use]
    pub const fn load(&self, rotor: Rotor) -> u8 {
        self.0[rotor.index()]
    }

    /// All four loads in channel order.
    #[inline]
    #[must_use]
    pub const fn loads(&self) -> [u8; 4] {
        self.0
    }

    /// Render the final actuator loads: committed load plus bias, clamped
    /// back to `0..=100` per rotor.
    #[must_use]
    pub fn render(&self, bias: &StabilizationBias) -> RotorLoads {
        let mut out = [0.0f32; 4];
        for rotor in Rotor::ALL {
            let load = self.0[rotor.index()] as f32 + bias.get(rotor);
            out[rotor.index()] = load.clamp(0.0, 100.0);
        }
        RotorLoads(out)
    }
}

/// Cumulative attitude-correction bias, one accumulator per rotor.
///
/// Signed and unbounded in the type; in practice the nudge amount keeps it
/// small. Persists across cycles and is reset only by explicit policy.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StabilizationBias([f32; 4]);

impl StabilizationBias {
    /// No correction.
    pub const ZERO: Self = Self([0.0; 4]);

    /// Bias of a single rotor.
    #[inline]
    #[must_use]
    pub const fn get(&self, rotor: Rotor) -> f32 {
        self.0[rotor.index()]
    }

    /// Shift one rotor's bias by `delta`.
    #[inline]
    pub fn nudge(&mut self, rotor: Rotor, delta: f32) {
        self.0[rotor.index()] += delta;
    }

    /// Clear all accumulators back to zero.
    #[inline]
    pub fn reset(&mut self) {
        self.0 = [0.0; 4];
    }
}

/// Final per-rotor loads handed to the actuator sink, clamped to `[0,100]`.
///
/// Kept as floats so that fractional bias corrections are not lost before
/// the sink's hardware-specific encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RotorLoads(pub [f32; 4]);

impl RotorLoads {
    /// Load of a single rotor.
    #[inline]
    #[must_use]
    pub const fn load(&self, rotor: Rotor) -> f32 {
        self.0[rotor.index()]
    }
}
