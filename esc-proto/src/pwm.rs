//! PCA9685 duty-cycle math for direct PWM ESC output.
//!
//! The PCA9685 runs at 50 Hz, so one 20 ms servo period spans the full
//! 4096-count cycle and 1 ms is 204.8 counts. A load of 0 sits at the
//! 1 ms pulse (203.8 counts, rounded down by the cast) and each load
//! percent adds 2.04 counts, reaching the 2 ms pulse at 100.

/// PWM update rate the duty math assumes.
pub const PWM_FREQUENCY_HZ: u16 = 50;

/// Counts per PWM cycle on the PCA9685.
pub const COUNTS_PER_CYCLE: u16 = 4096;

/// Off-count for a zero load (1 ms pulse).
pub const DUTY_MIN: u16 = 203;

/// Off-count for a full load (2 ms pulse).
pub const DUTY_MAX: u16 = 407;

/// PCA9685 off-count for a `[0,100]` rotor load.
#[inline]
#[must_use]
pub fn duty_cycle(load: f32) -> u16 {
    let duty = (203.8 + 2.04 * load) as u16;
    duty.clamp(DUTY_MIN, DUTY_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duty_endpoints() {
        assert_eq!(duty_cycle(0.0), DUTY_MIN);
        assert_eq!(duty_cycle(100.0), DUTY_MAX);
    }

    #[test]
    fn test_duty_midpoint() {
        // 203.8 + 102 = 305.8
        assert_eq!(duty_cycle(50.0), 305);
    }

    #[test]
    fn test_duty_monotonic() {
        let mut last = 0;
        for load in 0..=100 {
            let duty = duty_cycle(load as f32);
            assert!(duty >= last);
            last = duty;
        }
    }

    #[test]
    fn test_duty_clamped_outside_band() {
        assert_eq!(duty_cycle(-5.0), DUTY_MIN);
        assert_eq!(duty_cycle(150.0), DUTY_MAX);
    }
}
