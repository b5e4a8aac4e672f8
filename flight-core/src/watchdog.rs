//! Connection liveness watchdog.
//!
//! Timer-driven failsafe state machine. The remote client must produce a
//! liveness signal (an explicit ping, or any accepted command) at an
//! interval strictly below the configured timeout; otherwise the link is
//! declared lost and the controller drops the vehicle into a
//! horizontally-neutral hover.
//!
//! The watchdog itself holds no timer; it owns a single deadline
//! timestamp and the caller drives it with its clock. Re-feeding replaces
//! the deadline in one assignment, which is the atomic cancel-and-
//! reschedule: there is never a second pending deadline to race against.
//! Timestamps are plain milliseconds so the state machine runs unchanged
//! on host tests and under `embassy_time`.

/// Link liveness state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Liveness signals are arriving within the deadline.
    Alive,
    /// The deadline passed with no liveness signal; failsafe engaged.
    Lost,
}

/// Deadline state machine for the command link.
#[derive(Clone, Copy, Debug)]
pub struct LinkWatchdog {
    timeout_ms: u64,
    last_feed_ms: u64,
    deadline_ms: u64,
    state: LinkState,
}

impl LinkWatchdog {
    /// Create a watchdog in `Alive` with its first deadline armed.
    #[must_use]
    pub fn new(timeout_ms: u64, now_ms: u64) -> Self {
        Self {
            timeout_ms,
            last_feed_ms: now_ms,
            deadline_ms: now_ms + timeout_ms,
            state: LinkState::Alive,
        }
    }

    /// Record a liveness signal.
    ///
    /// Replaces the pending deadline with `now + timeout` and returns the
    /// watchdog to `Alive` (re-arming after a loss is how the system
    /// recovers).
    pub fn feed(&mut self, now_ms: u64) {
        self.last_feed_ms = now_ms;
        self.deadline_ms = now_ms + self.timeout_ms;
        self.state = LinkState::Alive;
    }

    /// The pending deadline, if one is armed.
    ///
    /// `None` while `Lost`: an expired watchdog has no further internal
    /// transition, so there is nothing to wait for until the next feed.
    #[must_use]
    pub fn deadline_ms(&self) -> Option<u64> {
        match self.state {
            LinkState::Alive => Some(self.deadline_ms),
            LinkState::Lost => None,
        }
    }

    /// Check the deadline against the caller's clock.
    ///
    /// Returns `true` exactly once per loss: on the call that observes the
    /// deadline passed while `Alive`. Subsequent calls return `false` until
    /// the watchdog is fed again.
    pub fn expire(&mut self, now_ms: u64) -> bool {
        if self.state == LinkState::Alive && now_ms >= self.deadline_ms {
            self.state = LinkState::Lost;
            return true;
        }
        false
    }

    /// Current liveness state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Timestamp of the most recent liveness signal.
    #[inline]
    #[must_use]
    pub fn last_feed_ms(&self) -> u64 {
        self.last_feed_ms
    }

    /// Configured timeout.
    #[inline]
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_alive_with_deadline_armed() {
        let watchdog = LinkWatchdog::new(5000, 1000);
        assert_eq!(watchdog.state(), LinkState::Alive);
        assert_eq!(watchdog.deadline_ms(), Some(6000));
    }

    #[test]
    fn test_feed_replaces_deadline() {
        let mut watchdog = LinkWatchdog::new(5000, 0);
        watchdog.feed(3000);
        assert_eq!(watchdog.deadline_ms(), Some(8000));
        assert_eq!(watchdog.last_feed_ms(), 3000);

        // The old deadline no longer exists: nothing fires at t=5000
        assert!(!watchdog.expire(5000));
        assert_eq!(watchdog.state(), LinkState::Alive);
    }

    #[test]
    fn test_expires_once() {
        let mut watchdog = LinkWatchdog::new(5000, 0);
        assert!(!watchdog.expire(4999));
        assert!(watchdog.expire(5000));
        assert_eq!(watchdog.state(), LinkState::Lost);
        assert_eq!(watchdog.deadline_ms(), None);

        // Lost has no further internal transition
        assert!(!watchdog.expire(20_000));
    }

    #[test]
    fn test_feed_recovers_from_lost() {
        let mut watchdog = LinkWatchdog::new(5000, 0);
        assert!(watchdog.expire(5000));

        watchdog.feed(7000);
        assert_eq!(watchdog.state(), LinkState::Alive);
        assert_eq!(watchdog.deadline_ms(), Some(12_000));
        assert!(watchdog.expire(12_000));
    }
}
