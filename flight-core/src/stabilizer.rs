//! Threshold-gated attitude stabilization.
//!
//! Consumes the smoothed horizontal acceleration error and nudges the
//! per-rotor [`StabilizationBias`] by a fixed amount whenever a reading
//! exceeds the accuracy threshold. The bias is an incremental trim, not a
//! PID controller: each cycle moves it by at most one `amount` per axis.
//!
//! Stabilization only runs above a throttle cutoff. This protects the
//! vehicle from winding up corrections for an initial tilt while it still
//! sits on a not-quite-level surface.

use crate::types::{FrameMode, Rotor, StabilizationBias};

/// Sign convention for the Plus-mode roll branch.
///
/// The Plus-frame airframe this logic was developed on shipped with a roll
/// condition whose sign disagrees with the pitch branch and with X mode.
/// Whether that was a deliberate compensation for that airframe or a bug
/// was never resolved, so the convention is selectable rather than fixed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlusSignConvention {
    /// The roll sign as observed on the original Plus airframe:
    /// `ax < -accuracy` is treated as "right side high".
    #[default]
    AsBuilt,
    /// Sign-consistent with X mode: `ax > accuracy` is "right side high".
    Mirrored,
}

/// Stabilization tuning.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StabilizationConfig {
    /// Throttle percentage the stabilizer kicks in above. Airframe-specific.
    pub cutoff: u8,
    /// Smoothed-reading magnitude that counts as "level enough".
    pub accuracy: f32,
    /// Bias shift applied per nudge.
    pub amount: f32,
    /// Plus-mode roll sign convention.
    pub plus_convention: PlusSignConvention,
}

impl Default for StabilizationConfig {
    fn default() -> Self {
        Self {
            cutoff: 25,
            accuracy: 100.0,
            amount: 0.01,
            plus_convention: PlusSignConvention::default(),
        }
    }
}

/// The stabilization controller.
///
/// Stateless besides its configuration; the bias accumulators live in the
/// flight controller and are passed in by mutable reference.
#[derive(Clone, Copy, Debug)]
pub struct Stabilizer {
    mode: FrameMode,
    config: StabilizationConfig,
}

impl Stabilizer {
    /// Create a stabilizer for the given frame mode.
    #[must_use]
    pub fn new(mode: FrameMode, config: StabilizationConfig) -> Self {
        Self { mode, config }
    }

    /// Access the tuning values.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &StabilizationConfig {
        &self.config
    }

    /// Run one stabilization step over the smoothed horizontal readings.
    ///
    /// Returns `true` if any bias accumulator changed, so the caller knows
    /// whether the rotor output needs re-rendering. Below the throttle
    /// cutoff nothing changes: the bias is held, not reset, and the cycle
    /// is a no-op.
    pub fn adjust(
        &self,
        throttle: u8,
        ax: f32,
        ay: f32,
        bias: &mut StabilizationBias,
    ) -> bool {
        if throttle <= self.config.cutoff {
            return false;
        }
        match self.mode {
            FrameMode::X => self.adjust_x(ax, ay, bias),
            FrameMode::Plus => self.adjust_plus(ax, ay, bias),
        }
    }

    /// X mode: pull the two rotors on the high side down.
    fn adjust_x(&self, ax: f32, ay: f32, bias: &mut StabilizationBias) -> bool {
        let accuracy = self.config.accuracy;
        let amount = self.config.amount;
        let mut changed = false;

        if ax > accuracy || ax < -accuracy {
            changed = true;
            if ax > accuracy {
                // Right side high
                bias.nudge(Rotor::R2, -amount);
                bias.nudge(Rotor::R3, -amount);
            } else {
                // Left side high
                bias.nudge(Rotor::R1, -amount);
                bias.nudge(Rotor::R4, -amount);
            }
        }
        if ay > accuracy || ay < -accuracy {
            changed = true;
            if ay > accuracy {
                // Front high
                bias.nudge(Rotor::R1, -amount);
                bias.nudge(Rotor::R2, -amount);
            } else {
                // Rear high
                bias.nudge(Rotor::R3, -amount);
                bias.nudge(Rotor::R4, -amount);
            }
        }
        changed
    }

    /// Plus mode: drain the high rotor's bias while it is positive,
    /// otherwise raise the other three.
    fn adjust_plus(&self, ax: f32, ay: f32, bias: &mut StabilizationBias) -> bool {
        let accuracy = self.config.accuracy;
        let amount = self.config.amount;
        let mut changed = false;

        if ax > accuracy || ax < -accuracy {
            changed = true;
            let right_high = match self.config.plus_convention {
                PlusSignConvention::AsBuilt => ax < -accuracy,
                PlusSignConvention::Mirrored => ax > accuracy,
            };
            if right_high {
                drain_or_raise(bias, Rotor::R2, [Rotor::R1, Rotor::R3, Rotor::R4], amount);
            } else {
                drain_or_raise(bias, Rotor::R4, [Rotor::R1, Rotor::R2, Rotor::R3], amount);
            }
        }
        if ay > accuracy || ay < -accuracy {
            changed = true;
            // Both conventions agree on the pitch sign
            let rear_high = ay < -accuracy;
            if rear_high {
                drain_or_raise(bias, Rotor::R3, [Rotor::R1, Rotor::R2, Rotor::R4], amount);
            } else {
                drain_or_raise(bias, Rotor::R1, [Rotor::R2, Rotor::R3, Rotor::R4], amount);
            }
        }
        changed
    }
}

/// Lower `high` while its bias is still positive; once it is spent, raise
/// the other three rotors instead.
fn drain_or_raise(bias: &mut StabilizationBias, high: Rotor, others: [Rotor; 3], amount: f32) {
    if bias.get(high) > 0.0 {
        bias.nudge(high, -amount);
    } else {
        for rotor in others {
            bias.nudge(rotor, amount);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x_stabilizer() -> Stabilizer {
        Stabilizer::new(
            FrameMode::X,
            StabilizationConfig {
                cutoff: 25,
                accuracy: 100.0,
                amount: 0.5,
                plus_convention: PlusSignConvention::AsBuilt,
            },
        )
    }

    fn plus_stabilizer(convention: PlusSignConvention) -> Stabilizer {
        Stabilizer::new(
            FrameMode::Plus,
            StabilizationConfig {
                cutoff: 25,
                accuracy: 100.0,
                amount: 0.5,
                plus_convention: convention,
            },
        )
    }

    #[test]
    fn test_inactive_at_or_below_cutoff() {
        let stabilizer = x_stabilizer();
        let mut bias = StabilizationBias::ZERO;

        assert!(!stabilizer.adjust(25, 500.0, 500.0, &mut bias));
        assert!(!stabilizer.adjust(0, 500.0, 500.0, &mut bias));
        assert_eq!(bias, StabilizationBias::ZERO);
    }

    #[test]
    fn test_level_vehicle_is_a_no_op() {
        let stabilizer = x_stabilizer();
        let mut bias = StabilizationBias::ZERO;

        assert!(!stabilizer.adjust(50, 99.0, -99.0, &mut bias));
        assert_eq!(bias, StabilizationBias::ZERO);
    }

    #[test]
    fn test_x_mode_pulls_high_side_down() {
        let stabilizer = x_stabilizer();
        let mut bias = StabilizationBias::ZERO;

        // Right side high
        assert!(stabilizer.adjust(50, 150.0, 0.0, &mut bias));
        assert_eq!(bias.get(Rotor::R2), -0.5);
        assert_eq!(bias.get(Rotor::R3), -0.5);
        assert_eq!(bias.get(Rotor::R1), 0.0);

        // Left side high
        assert!(stabilizer.adjust(50, -150.0, 0.0, &mut bias));
        assert_eq!(bias.get(Rotor::R1), -0.5);
        assert_eq!(bias.get(Rotor::R4), -0.5);

        // Front high
        assert!(stabilizer.adjust(50, 0.0, 150.0, &mut bias));
        assert_eq!(bias.get(Rotor::R1), -1.0);
        assert_eq!(bias.get(Rotor::R2), -1.0);

        // Rear high
        assert!(stabilizer.adjust(50, 0.0, -150.0, &mut bias));
        assert_eq!(bias.get(Rotor::R3), -1.0);
        assert_eq!(bias.get(Rotor::R4), -1.0);
    }

    #[test]
    fn test_x_mode_corrects_both_axes_in_one_cycle() {
        let stabilizer = x_stabilizer();
        let mut bias = StabilizationBias::ZERO;

        assert!(stabilizer.adjust(50, 150.0, 150.0, &mut bias));
        // R2 sits on the right AND the front: nudged by both axes
        assert_eq!(bias.get(Rotor::R2), -1.0);
        assert_eq!(bias.get(Rotor::R1), -0.5);
        assert_eq!(bias.get(Rotor::R3), -0.5);
        assert_eq!(bias.get(Rotor::R4), 0.0);
    }

    #[test]
    fn test_plus_as_built_roll_sign() {
        let stabilizer = plus_stabilizer(PlusSignConvention::AsBuilt);
        let mut bias = StabilizationBias::ZERO;

        // As-built: a negative reading selects the "right high" branch;
        // R2 has no positive bias to drain, so the other three rise.
        assert!(stabilizer.adjust(50, -150.0, 0.0, &mut bias));
        assert_eq!(bias.get(Rotor::R1), 0.5);
        assert_eq!(bias.get(Rotor::R2), 0.0);
        assert_eq!(bias.get(Rotor::R3), 0.5);
        assert_eq!(bias.get(Rotor::R4), 0.5);
    }

    #[test]
    fn test_plus_mirrored_roll_sign() {
        let stabilizer = plus_stabilizer(PlusSignConvention::Mirrored);
        let mut bias = StabilizationBias::ZERO;

        // Mirrored: the positive reading selects "right high"
        assert!(stabilizer.adjust(50, 150.0, 0.0, &mut bias));
        assert_eq!(bias.get(Rotor::R1), 0.5);
        assert_eq!(bias.get(Rotor::R2), 0.0);
        assert_eq!(bias.get(Rotor::R3), 0.5);
        assert_eq!(bias.get(Rotor::R4), 0.5);
    }

    #[test]
    fn test_plus_drains_positive_bias_before_raising_others() {
        let stabilizer = plus_stabilizer(PlusSignConvention::Mirrored);
        let mut bias = StabilizationBias::ZERO;
        bias.nudge(Rotor::R2, 1.0);

        assert!(stabilizer.adjust(50, 150.0, 0.0, &mut bias));
        assert_eq!(bias.get(Rotor::R2), 0.5);
        assert_eq!(bias.get(Rotor::R1), 0.0);

        assert!(stabilizer.adjust(50, 150.0, 0.0, &mut bias));
        assert_eq!(bias.get(Rotor::R2), 0.0);

        // Drained; now the other three rise
        assert!(stabilizer.adjust(50, 150.0, 0.0, &mut bias));
        assert_eq!(bias.get(Rotor::R2), 0.0);
        assert_eq!(bias.get(Rotor::R1), 0.5);
        assert_eq!(bias.get(Rotor::R3), 0.5);
        assert_eq!(bias.get(Rotor::R4), 0.5);
    }

    #[test]
    fn test_plus_pitch_sign_shared_by_conventions() {
        for convention in [PlusSignConvention::AsBuilt, PlusSignConvention::Mirrored] {
            let stabilizer = plus_stabilizer(convention);
            let mut bias = StabilizationBias::ZERO;

            // Front high: drain R1 (empty) -> raise R2, R3, R4
            assert!(stabilizer.adjust(50, 0.0, 150.0, &mut bias));
            assert_eq!(bias.get(Rotor::R1), 0.0);
            assert_eq!(bias.get(Rotor::R2), 0.5);
            assert_eq!(bias.get(Rotor::R3), 0.5);
            assert_eq!(bias.get(Rotor::R4), 0.5);
        }
    }
}
