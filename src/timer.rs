//! Retransmission timer.
//!
//! Go-Back-N keeps a single timer for the oldest unacknowledged packet.  The
//! timeout is fixed for the whole run; there is no RTT estimation or
//! back-off.
//!
//! The timer is a plain timestamp compared against the clock on each loop
//! iteration, not a scheduled alarm.  Every method takes `now` explicitly so
//! the state machines built on top of it can be driven with synthetic time.

use std::time::{Duration, Instant};

/// A single fixed-timeout retransmission timer.
#[derive(Debug, Clone)]
pub struct RetransmitTimer {
    timeout: Duration,
    started: Option<Instant>,
}

impl RetransmitTimer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            started: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Start (or restart) the timer at `now`.
    pub fn arm(&mut self, now: Instant) {
        self.started = Some(now);
    }

    pub fn disarm(&mut self) {
        self.started = None;
    }

    pub fn is_armed(&self) -> bool {
        self.started.is_some()
    }

    /// Instant at which the timer fires, or `None` while disarmed.
    pub fn deadline(&self) -> Option<Instant> {
        self.started.map(|t| t + self.timeout)
    }

    /// `true` when armed and at least `timeout` has elapsed since arming.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.started
            .is_some_and(|t| now.saturating_duration_since(t) >= self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Duration = Duration::from_millis(200);

    #[test]
    fn starts_disarmed() {
        let timer = RetransmitTimer::new(T);
        assert!(!timer.is_armed());
        assert!(!timer.is_expired(Instant::now() + T * 10));
        assert_eq!(timer.deadline(), None);
    }

    #[test]
    fn expires_exactly_at_timeout() {
        let t0 = Instant::now();
        let mut timer = RetransmitTimer::new(T);
        timer.arm(t0);
        assert!(!timer.is_expired(t0 + T - Duration::from_millis(1)));
        assert!(timer.is_expired(t0 + T));
        assert_eq!(timer.deadline(), Some(t0 + T));
    }

    #[test]
    fn rearm_pushes_deadline() {
        let t0 = Instant::now();
        let mut timer = RetransmitTimer::new(T);
        timer.arm(t0);
        timer.arm(t0 + Duration::from_millis(150));
        assert!(!timer.is_expired(t0 + T));
        assert!(timer.is_expired(t0 + Duration::from_millis(350)));
    }

    #[test]
    fn disarm_stops_expiry() {
        let t0 = Instant::now();
        let mut timer = RetransmitTimer::new(T);
        timer.arm(t0);
        timer.disarm();
        assert!(!timer.is_expired(t0 + T * 2));
    }
}
