//! Tunable protocol parameters.
//!
//! One [`RdtConfig`] is shared by both endpoints; each side ignores the fields
//! that do not concern it (the receiver has no window or retransmission
//! timer, the sender no idle limit).

use std::time::Duration;

use thiserror::Error;

/// Default Go-Back-N window, in packets.
pub const DEFAULT_WINDOW_SIZE: usize = 10;
/// Default retransmission timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(200);
/// Default bounded wait for one inbound datagram.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);
/// Default number of FIN attempts before giving up on teardown.
pub const DEFAULT_FIN_RETRIES: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct RdtConfig {
    /// Maximum packets outstanding at once (sender).
    pub window_size: usize,
    /// Retransmission timeout for the oldest outstanding packet (sender).
    pub timeout: Duration,
    /// Upper bound on a single wait for an inbound datagram.  Must be
    /// strictly smaller than `timeout` so timeouts are noticed promptly.
    pub poll_interval: Duration,
    /// FIN transmissions attempted before the sender closes anyway.
    pub fin_retries: u32,
    /// Probability in `[0, 1]` that an outbound packet is dropped.
    pub loss_prob: f64,
    /// Seed for the loss simulator; `None` uses OS entropy.
    pub seed: Option<u64>,
    /// Receiver gives up after this long without any datagram.  `None`
    /// waits indefinitely.
    pub idle_timeout: Option<Duration>,
}

impl Default for RdtConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            fin_retries: DEFAULT_FIN_RETRIES,
            loss_prob: 0.0,
            seed: None,
            idle_timeout: None,
        }
    }
}

impl RdtConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.loss_prob) {
            return Err(ConfigError::LossProbability(self.loss_prob));
        }
        if self.window_size == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.poll_interval.is_zero() || self.poll_interval >= self.timeout {
            return Err(ConfigError::PollInterval {
                poll: self.poll_interval,
                timeout: self.timeout,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("loss probability {0} is outside [0, 1]")]
    LossProbability(f64),
    #[error("window size must be at least 1")]
    ZeroWindow,
    #[error("retransmission timeout must be non-zero")]
    ZeroTimeout,
    #[error("poll interval {poll:?} must be non-zero and below the timeout {timeout:?}")]
    PollInterval { poll: Duration, timeout: Duration },
}
