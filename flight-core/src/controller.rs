//! FlightController: single owner of all mutable control state.
//!
//! Three event sources drive the controller (pilot commands, the periodic
//! inertial tick, and the watchdog deadline) and they must be serialized
//! by the caller (one task/loop), because the mixer's validate-then-commit
//! protocol is not safe under interleaved mutation. Every method here runs
//! one full evaluation to completion; that is the unit of atomicity.

use crate::actuator::{ActuatorError, ActuatorSink};
use crate::config::FlightConfig;
use crate::imu::ImuSample;
use crate::mixer::{mix_command, MixError};
use crate::smoothing::{ImuFilterBank, WindowSizeError};
use crate::stabilizer::Stabilizer;
use crate::types::{Axis, ControlState, RotorLoads, RotorVector, StabilizationBias};
use crate::watchdog::{LinkState, LinkWatchdog};

/// Error type for command application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Rejected: raw axis value outside its legal range. No state changed.
    AxisOutOfRange,
    /// Rejected: resulting rotor vector would leave `0..=100`. No state
    /// changed.
    RotorOutOfRange,
    /// The command committed, but the actuator write failed; the output is
    /// marked stale and retried on the next scheduled update.
    Actuator(ActuatorError),
}

impl CommandError {
    /// Whether the command was committed (the link layer acks committed
    /// commands even when the actuator write is pending retry).
    #[must_use]
    pub fn committed(&self) -> bool {
        matches!(self, CommandError::Actuator(_))
    }
}

impl From<MixError> for CommandError {
    fn from(err: MixError) -> Self {
        match err {
            MixError::AxisOutOfRange => CommandError::AxisOutOfRange,
            MixError::RotorOutOfRange => CommandError::RotorOutOfRange,
        }
    }
}

/// The flight-control core.
///
/// Owns `ControlState`, `RotorVector`, `StabilizationBias` and the link
/// watchdog exclusively; all mutation goes through the commit-protocol
/// methods below, never through field writes from outside.
pub struct FlightController<S> {
    config: FlightConfig,
    stabilizer: Stabilizer,
    state: ControlState,
    rotors: RotorVector,
    bias: StabilizationBias,
    filters: ImuFilterBank,
    watchdog: LinkWatchdog,
    sink: S,
    /// Last actuator write failed; rewrite on the next scheduled update.
    stale: bool,
}

impl<S: ActuatorSink> FlightController<S> {
    /// Create a controller with all-zero state and the watchdog armed.
    ///
    /// # Errors
    ///
    /// Returns [`WindowSizeError`] if a smoothing window capacity in the
    /// config is invalid.
    pub fn new(config: FlightConfig, sink: S, now_ms: u64) -> Result<Self, WindowSizeError> {
        Ok(Self {
            stabilizer: Stabilizer::new(config.frame_mode, config.stabilization),
            state: ControlState::neutral(),
            rotors: RotorVector::ZERO,
            bias: StabilizationBias::ZERO,
            filters: ImuFilterBank::new(config.accel_window, config.gyro_window)?,
            watchdog: LinkWatchdog::new(config.link_timeout_ms, now_ms),
            sink,
            stale: false,
            config,
        })
    }

    /// Apply one pilot command: validate, mix, commit, forward.
    ///
    /// Commit is all-or-nothing: on rejection the previous `ControlState`
    /// and `RotorVector` remain authoritative and nothing reaches the
    /// actuator. An accepted command doubles as a liveness signal.
    ///
    /// # Errors
    ///
    /// Range rejections reject the command; [`CommandError::Actuator`]
    /// means the command committed but the motors still hold the previous
    /// setting (see [`CommandError::committed`]).
    pub async fn apply_command(
        &mut self,
        axis: Axis,
        value: i16,
        now_ms: u64,
    ) -> Result<(), CommandError> {
        let (candidate_state, candidate_rotors) =
            mix_command(&self.state, self.config.frame_mode, axis, value)?;

        self.state = candidate_state;
        self.rotors = candidate_rotors;
        self.watchdog.feed(now_ms);

        self.flush().await.map_err(CommandError::Actuator)
    }

    /// Record an explicit liveness ping.
    pub fn note_liveness(&mut self, now_ms: u64) {
        self.watchdog.feed(now_ms);
    }

    /// Feed one raw inertial sample through smoothing and stabilization.
    ///
    /// Returns whether the bias changed. The actuator is only written when
    /// a nudge occurred or a previous write is pending retry; a level
    /// vehicle costs nothing per cycle.
    ///
    /// A failed sensor read is handled by simply not calling this; the
    /// filters and bias then hold their last values.
    ///
    /// # Errors
    ///
    /// Propagates the actuator write failure; the output stays marked
    /// stale for the next cycle.
    pub async fn ingest_sample(&mut self, sample: &ImuSample) -> Result<bool, ActuatorError> {
        let smoothed = self.filters.update(sample);
        // Z accel and the gyro channels are smoothed but not yet consumed
        let nudged = self.stabilizer.adjust(
            self.state.throttle,
            smoothed.accel[0],
            smoothed.accel[1],
            &mut self.bias,
        );

        if nudged || self.stale {
            self.flush().await?;
        }
        Ok(nudged)
    }

    /// Service the watchdog deadline.
    ///
    /// If the deadline has passed with no liveness signal, engages the
    /// failsafe: rudder, elevator and aileron reset to neutral, throttle
    /// held, and a symmetric throttle-only vector is pushed to the
    /// actuator so the vehicle hovers until the link returns. Returns
    /// whether the failsafe engaged on this call.
    ///
    /// # Errors
    ///
    /// Propagates the actuator write failure (retried on the next tick).
    pub async fn handle_link_deadline(&mut self, now_ms: u64) -> Result<bool, ActuatorError> {
        if !self.watchdog.expire(now_ms) {
            return Ok(false);
        }

        self.state.rudder = 0;
        self.state.elevator = 0;
        self.state.aileron = 0;
        self.rotors = RotorVector::uniform(self.state.throttle);
        if self.config.clear_bias_on_failsafe {
            self.bias.reset();
        }

        self.flush().await?;
        Ok(true)
    }

    /// Snapshot of the committed control state (for remote display).
    #[inline]
    #[must_use]
    pub fn control_state(&self) -> ControlState {
        self.state
    }

    /// The committed rotor vector (before bias rendering).
    #[inline]
    #[must_use]
    pub fn rotor_vector(&self) -> RotorVector {
        self.rotors
    }

    /// Current stabilization bias accumulators.
    #[inline]
    #[must_use]
    pub fn bias(&self) -> StabilizationBias {
        self.bias
    }

    /// Current link liveness state.
    #[inline]
    #[must_use]
    pub fn link_state(&self) -> LinkState {
        self.watchdog.state()
    }

    /// The pending watchdog deadline, `None` while the link is lost.
    #[inline]
    #[must_use]
    pub fn watchdog_deadline_ms(&self) -> Option<u64> {
        self.watchdog.deadline_ms()
    }

    /// Whether the last actuator write failed and a rewrite is pending.
    #[inline]
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Get a mutable reference to the actuator sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Decompose the controller, returning the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Render the final loads and write them to the sink.
    ///
    /// The bias is applied only above the stabilization cutoff; below it
    /// the committed vector goes out unmodified (the accumulators are
    /// held, not cleared).
    async fn flush(&mut self) -> Result<(), ActuatorError> {
        let loads = self.rendered();
        match self.sink.write(&loads).await {
            Ok(()) => {
                self.stale = false;
                Ok(())
            }
            Err(err) => {
                self.stale = true;
                Err(err)
            }
        }
    }

    fn rendered(&self) -> RotorLoads {
        if self.state.throttle > self.config.stabilization.cutoff {
            self.rotors.render(&self.bias)
        } else {
            self.rotors.render(&StabilizationBias::ZERO)
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::types::{FrameMode, Rotor};
    use core::future::Future;
    use core::pin::Pin;
    use core::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};
    use std::rc::Rc;
    use std::sync::Mutex;
    use std::vec::Vec;

    // Mock actuator sink recording every write, with scriptable failures
    struct MockSink {
        written: Rc<Mutex<Vec<RotorLoads>>>,
        fail_next: Rc<Mutex<bool>>,
    }

    impl MockSink {
        fn new() -> (Self, Rc<Mutex<Vec<RotorLoads>>>, Rc<Mutex<bool>>) {
            let written = Rc::new(Mutex::new(Vec::new()));
            let fail_next = Rc::new(Mutex::new(false));
            (
                Self {
                    written: written.clone(),
                    fail_next: fail_next.clone(),
                },
                written,
                fail_next,
            )
        }
    }

    impl ActuatorSink for MockSink {
        fn write(&mut self, loads: &RotorLoads) -> impl Future<Output = Result<(), ActuatorError>> {
            let mut fail = self.fail_next.lock().unwrap();
            let result = if *fail {
                *fail = false;
                Err(ActuatorError::Io)
            } else {
                self.written.lock().unwrap().push(*loads);
                Ok(())
            };
            core::future::ready(result)
        }

        fn is_ready(&self) -> bool {
            true
        }
    }

    // Helper to run a future to completion (simple blocking executor)
    fn block_on<F: Future>(mut f: F) -> F::Output {
        fn noop_raw_waker() -> RawWaker {
            fn noop(_: *const ()) {}
            fn clone(_: *const ()) -> RawWaker {
                noop_raw_waker()
            }
            static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
            RawWaker::new(core::ptr::null(), &VTABLE)
        }

        let waker = unsafe { Waker::from_raw(noop_raw_waker()) };
        let mut cx = Context::from_waker(&waker);

        // SAFETY: We don't move f after pinning
        let mut f = unsafe { Pin::new_unchecked(&mut f) };

        loop {
            match f.as_mut().poll(&mut cx) {
                Poll::Ready(result) => return result,
                Poll::Pending => {
                    panic!("Mock future returned Pending unexpectedly");
                }
            }
        }
    }

    fn plus_config() -> FlightConfig {
        FlightConfig {
            frame_mode: FrameMode::Plus,
            ..FlightConfig::default()
        }
    }

    fn controller(config: FlightConfig) -> (FlightController<MockSink>, Rc<Mutex<Vec<RotorLoads>>>, Rc<Mutex<bool>>) {
        let (sink, written, fail_next) = MockSink::new();
        (
            FlightController::new(config, sink, 0).unwrap(),
            written,
            fail_next,
        )
    }

    fn level_sample() -> ImuSample {
        ImuSample::default()
    }

    #[test]
    fn test_command_commits_and_forwards() {
        let (mut ctrl, written, _) = controller(plus_config());

        block_on(ctrl.apply_command(Axis::Throttle, 50, 0)).unwrap();
        assert_eq!(ctrl.control_state().throttle, 50);
        assert_eq!(ctrl.rotor_vector().loads(), [50, 50, 50, 50]);

        let written = written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].0, [50.0, 50.0, 50.0, 50.0]);
    }

    #[test]
    fn test_rejected_command_leaves_state_untouched() {
        let (mut ctrl, written, _) = controller(plus_config());
        block_on(ctrl.apply_command(Axis::Throttle, 90, 0)).unwrap();

        // Elevator +50 would push the rear rotor to 140
        let result = block_on(ctrl.apply_command(Axis::Elevator, 50, 10));
        assert_eq!(result, Err(CommandError::RotorOutOfRange));
        assert_eq!(ctrl.control_state().elevator, 0);
        assert_eq!(ctrl.rotor_vector().loads(), [90, 90, 90, 90]);

        // Nothing extra reached the actuator
        assert_eq!(written.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_command_idempotent() {
        let (mut ctrl, _, _) = controller(plus_config());
        block_on(ctrl.apply_command(Axis::Throttle, 50, 0)).unwrap();

        block_on(ctrl.apply_command(Axis::Elevator, 30, 1)).unwrap();
        let first = ctrl.rotor_vector();
        // Re-applying the same command still commits, to the same vector
        block_on(ctrl.apply_command(Axis::Elevator, 30, 2)).unwrap();
        assert_eq!(ctrl.rotor_vector(), first);
        assert_eq!(first.load(Rotor::R3), 80);
    }

    #[test]
    fn test_failsafe_neutralizes_attitude_axes() {
        let (mut ctrl, written, _) = controller(plus_config());
        block_on(ctrl.apply_command(Axis::Throttle, 40, 0)).unwrap();
        block_on(ctrl.apply_command(Axis::Rudder, 20, 100)).unwrap();

        // No liveness for a full timeout after the last command
        let engaged = block_on(ctrl.handle_link_deadline(100 + 5000)).unwrap();
        assert!(engaged);
        assert_eq!(ctrl.link_state(), LinkState::Lost);

        let state = ctrl.control_state();
        assert_eq!(state.throttle, 40);
        assert_eq!(state.rudder, 0);
        assert_eq!(state.elevator, 0);
        assert_eq!(state.aileron, 0);
        assert_eq!(ctrl.rotor_vector().loads(), [40, 40, 40, 40]);

        let written = written.lock().unwrap();
        assert_eq!(written.last().unwrap().0, [40.0, 40.0, 40.0, 40.0]);
    }

    #[test]
    fn test_deadline_before_expiry_is_a_no_op() {
        let (mut ctrl, written, _) = controller(plus_config());
        block_on(ctrl.apply_command(Axis::Throttle, 40, 0)).unwrap();

        let engaged = block_on(ctrl.handle_link_deadline(4999)).unwrap();
        assert!(!engaged);
        assert_eq!(ctrl.link_state(), LinkState::Alive);
        assert_eq!(written.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_accepted_command_feeds_watchdog() {
        let (mut ctrl, _, _) = controller(plus_config());
        block_on(ctrl.apply_command(Axis::Throttle, 40, 3000)).unwrap();

        // Initial deadline (t=5000) passes without firing
        assert!(!block_on(ctrl.handle_link_deadline(5000)).unwrap());
        assert!(block_on(ctrl.handle_link_deadline(8000)).unwrap());
    }

    #[test]
    fn test_rejected_command_does_not_feed_watchdog() {
        let (mut ctrl, _, _) = controller(plus_config());
        let _ = block_on(ctrl.apply_command(Axis::Throttle, 500, 3000));

        assert!(block_on(ctrl.handle_link_deadline(5000)).unwrap());
    }

    #[test]
    fn test_ping_recovers_lost_link() {
        let (mut ctrl, _, _) = controller(plus_config());
        assert!(block_on(ctrl.handle_link_deadline(5000)).unwrap());
        assert_eq!(ctrl.link_state(), LinkState::Lost);

        ctrl.note_liveness(6000);
        assert_eq!(ctrl.link_state(), LinkState::Alive);
        assert_eq!(ctrl.watchdog_deadline_ms(), Some(11_000));
    }

    #[test]
    fn test_stabilization_rerenders_with_bias() {
        let config = FlightConfig {
            frame_mode: FrameMode::X,
            accel_window: 1,
            gyro_window: 1,
            ..FlightConfig::default()
        };
        let (mut ctrl, written, _) = controller(config);
        block_on(ctrl.apply_command(Axis::Throttle, 50, 0)).unwrap();

        // Right side high beyond the accuracy threshold
        let nudged = block_on(ctrl.ingest_sample(&ImuSample {
            accel: [150, 0, 0],
            gyro: [0, 0, 0],
        }))
        .unwrap();
        assert!(nudged);

        let written = written.lock().unwrap();
        let last = written.last().unwrap();
        assert_eq!(last.load(Rotor::R1), 50.0);
        assert_eq!(last.load(Rotor::R2), 50.0 - 0.01);
        assert_eq!(last.load(Rotor::R3), 50.0 - 0.01);
    }

    #[test]
    fn test_level_cycle_skips_actuator_write() {
        let (mut ctrl, written, _) = controller(plus_config());
        block_on(ctrl.apply_command(Axis::Throttle, 50, 0)).unwrap();

        let nudged = block_on(ctrl.ingest_sample(&level_sample())).unwrap();
        assert!(!nudged);
        assert_eq!(written.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_bias_held_but_not_applied_below_cutoff() {
        let config = FlightConfig {
            frame_mode: FrameMode::X,
            accel_window: 1,
            gyro_window: 1,
            ..FlightConfig::default()
        };
        let (mut ctrl, written, _) = controller(config);
        block_on(ctrl.apply_command(Axis::Throttle, 50, 0)).unwrap();
        block_on(ctrl.ingest_sample(&ImuSample {
            accel: [150, 0, 0],
            gyro: [0, 0, 0],
        }))
        .unwrap();
        let bias_before = ctrl.bias();

        // Throttle down to the cutoff: bias no longer rendered, still held
        block_on(ctrl.apply_command(Axis::Throttle, 25, 10)).unwrap();
        assert_eq!(ctrl.bias(), bias_before);
        let written = written.lock().unwrap();
        assert_eq!(written.last().unwrap().0, [25.0, 25.0, 25.0, 25.0]);
    }

    #[test]
    fn test_actuator_failure_marks_stale_and_retries() {
        let (mut ctrl, written, fail_next) = controller(plus_config());
        *fail_next.lock().unwrap() = true;

        let result = block_on(ctrl.apply_command(Axis::Throttle, 50, 0));
        assert_eq!(result, Err(CommandError::Actuator(ActuatorError::Io)));
        // The command itself committed
        assert!(result.unwrap_err().committed());
        assert_eq!(ctrl.control_state().throttle, 50);
        assert!(ctrl.is_stale());
        assert_eq!(written.lock().unwrap().len(), 0);

        // Next sensor cycle rewrites even though nothing nudged
        block_on(ctrl.ingest_sample(&level_sample())).unwrap();
        assert!(!ctrl.is_stale());
        let written = written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].0, [50.0, 50.0, 50.0, 50.0]);
    }

    #[test]
    fn test_failsafe_engages_despite_actuator_write_failure() {
        let (mut ctrl, written, fail_next) = controller(plus_config());
        block_on(ctrl.apply_command(Axis::Throttle, 40, 0)).unwrap();
        block_on(ctrl.apply_command(Axis::Rudder, 20, 10)).unwrap();

        // Deadline passes while the sink is wedged (a bounded write
        // surfaces that as Io rather than blocking the loop)
        *fail_next.lock().unwrap() = true;
        let result = block_on(ctrl.handle_link_deadline(10 + 5000));
        assert_eq!(result, Err(ActuatorError::Io));

        // The failsafe state committed regardless of the write
        assert_eq!(ctrl.link_state(), LinkState::Lost);
        assert_eq!(ctrl.control_state().rudder, 0);
        assert_eq!(ctrl.rotor_vector().loads(), [40, 40, 40, 40]);
        assert!(ctrl.is_stale());

        // Next sensor cycle pushes the hover vector out
        block_on(ctrl.ingest_sample(&level_sample())).unwrap();
        assert!(!ctrl.is_stale());
        let written = written.lock().unwrap();
        assert_eq!(written.last().unwrap().0, [40.0, 40.0, 40.0, 40.0]);
    }
}
