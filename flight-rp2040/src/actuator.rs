//! Rotor actuator backends.
//!
//! Two interchangeable [`ActuatorSink`] implementations, selected by
//! feature:
//!
//! - [`Pca9685Output`] (`esc-pca9685`): drives the ESC signal lines
//!   directly from a PCA9685 PWM chip on the shared I2C bus
//! - [`UartEscOutput`] (`esc-uart`): forwards pulse widths as text frames
//!   to a bridge MCU that owns the ESC signal lines
//!
//! Both are deployed behind [`TimedSink`], which bounds every write so
//! the control loop's other event arms keep getting polled.

use embassy_time::{with_timeout, Duration};
use flight_core::{ActuatorError, ActuatorSink, RotorLoads};

#[cfg(feature = "esc-pca9685")]
pub use pca9685::Pca9685Output;

#[cfg(feature = "esc-uart")]
pub use uart::UartEscOutput;

/// Deadline wrapper around an [`ActuatorSink`].
///
/// The core task awaits actuator writes inline, and the PCA9685 backend
/// shares its I2C bus with the inertial sensor. An unbounded write on a
/// wedged bus would therefore keep the watchdog deadline arm from ever
/// being polled. A write that overruns the deadline reports
/// [`ActuatorError::Io`]; the controller marks the output stale and
/// rewrites it on the next cycle.
pub struct TimedSink<S> {
    inner: S,
    timeout: Duration,
}

impl<S> TimedSink<S> {
    /// Wrap a sink, bounding each write to `timeout`.
    #[must_use]
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

impl<S: ActuatorSink> ActuatorSink for TimedSink<S> {
    async fn write(&mut self, loads: &RotorLoads) -> Result<(), ActuatorError> {
        match with_timeout(self.timeout, self.inner.write(loads)).await {
            Ok(result) => result,
            Err(_) => Err(ActuatorError::Io),
        }
    }

    fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }
}

#[cfg(feature = "esc-pca9685")]
mod pca9685 {
    use embassy_time::Timer;
    use flight_core::{ActuatorError, ActuatorSink, Rotor, RotorLoads};
    use embedded_hal_async::i2c::I2c;
    use esc_proto::{duty_cycle, PWM_FREQUENCY_HZ};

    /// Default I2C address (all address pins low).
    pub const PCA9685_ADDRESS: u8 = 0x40;

    // Register map (subset)
    const REG_MODE1: u8 = 0x00;
    const REG_LED0_ON_L: u8 = 0x06;
    const REG_PRE_SCALE: u8 = 0xFE;

    // MODE1 bits
    const MODE1_SLEEP: u8 = 0x10;
    const MODE1_AUTO_INCREMENT: u8 = 0x20;
    const MODE1_RESTART: u8 = 0x80;

    /// Internal oscillator frequency.
    const OSC_HZ: u32 = 25_000_000;

    /// PCA9685-backed rotor output.
    pub struct Pca9685Output<I2C> {
        i2c: I2C,
        address: u8,
        ready: bool,
    }

    impl<I2C: I2c> Pca9685Output<I2C> {
        /// Create an output at the default address. No bus traffic yet.
        #[must_use]
        pub fn new(i2c: I2C) -> Self {
            Self {
                i2c,
                address: PCA9685_ADDRESS,
                ready: false,
            }
        }

        /// Configure the chip for 50 Hz servo output.
        ///
        /// The prescaler can only be written in sleep mode, so the
        /// sequence is sleep, program, wake, restart.
        ///
        /// # Errors
        ///
        /// [`ActuatorError::Io`] on any transfer failure; the output
        /// stays not-ready and writes keep failing until a later init
        /// succeeds.
        pub async fn init(&mut self) -> Result<(), ActuatorError> {
            let prescale = (OSC_HZ / (4096 * PWM_FREQUENCY_HZ as u32) - 1) as u8;

            self.write_reg(REG_MODE1, MODE1_SLEEP).await?;
            self.write_reg(REG_PRE_SCALE, prescale).await?;
            self.write_reg(REG_MODE1, MODE1_AUTO_INCREMENT).await?;
            // Oscillator startup time per datasheet
            Timer::after_micros(500).await;
            self.write_reg(REG_MODE1, MODE1_AUTO_INCREMENT | MODE1_RESTART)
                .await?;

            self.ready = true;
            Ok(())
        }

        async fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), ActuatorError> {
            self.i2c
                .write(self.address, &[reg, value])
                .await
                .map_err(|_| ActuatorError::Io)
        }
    }

    impl<I2C: I2c> ActuatorSink for Pca9685Output<I2C> {
        async fn write(&mut self, loads: &RotorLoads) -> Result<(), ActuatorError> {
            if !self.ready {
                return Err(ActuatorError::NotReady);
            }

            for rotor in Rotor::ALL {
                let off = duty_cycle(loads.load(rotor));
                // LEDn_ON = 0, LEDn_OFF = duty; registers auto-increment
                let base = REG_LED0_ON_L + 4 * rotor.index() as u8;
                let buf = [base, 0x00, 0x00, (off & 0xFF) as u8, (off >> 8) as u8];
                self.i2c
                    .write(self.address, &buf)
                    .await
                    .map_err(|_| ActuatorError::Io)?;
            }
            Ok(())
        }

        fn is_ready(&self) -> bool {
            self.ready
        }
    }
}

#[cfg(feature = "esc-uart")]
mod uart {
    use embassy_rp::uart::{Async, UartTx};
    use flight_core::{ActuatorError, ActuatorSink, RotorLoads};
    use esc_proto::{encode_frame, MAX_FRAME_SIZE};

    /// Serial-bridge rotor output.
    pub struct UartEscOutput<'d> {
        tx: UartTx<'d, Async>,
    }

    impl<'d> UartEscOutput<'d> {
        /// Create an output over the given UART transmitter.
        #[must_use]
        pub fn new(tx: UartTx<'d, Async>) -> Self {
            Self { tx }
        }
    }

    impl ActuatorSink for UartEscOutput<'_> {
        async fn write(&mut self, loads: &RotorLoads) -> Result<(), ActuatorError> {
            let mut buf = [0u8; MAX_FRAME_SIZE];
            let len = encode_frame(loads, &mut buf).map_err(|_| ActuatorError::Io)?;
            self.tx
                .write(&buf[..len])
                .await
                .map_err(|_| ActuatorError::Io)
        }

        fn is_ready(&self) -> bool {
            true
        }
    }
}
