//! Go-Back-N send-side state machine.
//!
//! [`GbnSender`] owns the pre-encoded DATA packets of one transfer and the
//! sliding window over them.  Sequence numbers are chunk indices (0-based),
//! not byte offsets.
//!
//! # Protocol contract
//!
//! - At most `window_size` packets may be in flight at once.
//! - ACKs are **cumulative**: ACK `k` confirms every packet `≤ k`.
//! - A single timer covers the oldest unacked packet.  On timeout the caller
//!   retransmits **all** packets in `[base, next_seq)` (go back N).
//!
//! This module only manages state; all socket I/O is the caller's
//! responsibility.  Every transition takes the current [`Instant`] so tests
//! can drive the machine with synthetic time.

use std::ops::Range;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::packet::Packet;
use crate::timer::RetransmitTimer;

/// The input has more chunks than 32-bit sequence numbers can name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0} chunks do not fit in the 32-bit sequence space")]
pub struct SequenceSpaceExhausted(pub usize);

/// Result of feeding an ACK to [`GbnSender::on_ack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// The window slid forward by `newly_acked` packets.
    Advanced { newly_acked: u32 },
    /// `ack < base`: already covered by an earlier cumulative ACK.
    Stale,
    /// `ack ≥ next_seq`: acknowledges a packet that was never sent.
    Bogus,
}

/// Go-Back-N send-side state for one transfer.
///
/// # Sequence-number layout
///
/// ```text
///    base            next_seq                total
///      │                  │                      │
///  ────┼──────────────────┼──────────────────────┼──▶ seq space
///      │ <── in flight ──▶│ <── not yet sent ───▶│
/// ```
///
/// Invariant: `base ≤ next_seq ≤ total` and `next_seq − base ≤ window_size`.
#[derive(Debug)]
pub struct GbnSender {
    /// Oldest unacknowledged sequence number (left window edge).
    base: u32,
    /// Next sequence number never sent before.
    next_seq: u32,
    window_size: u32,
    /// Encoded DATA packets, indexed by sequence number.
    frames: Vec<Vec<u8>>,
    timer: RetransmitTimer,
}

impl GbnSender {
    /// Build the window over `chunks`, one DATA packet per chunk.
    ///
    /// `window_size` must be at least 1; each chunk at most
    /// [`crate::packet::MAX_DATA_SIZE`] bytes.
    pub fn new(
        chunks: Vec<Vec<u8>>,
        window_size: usize,
        timeout: Duration,
    ) -> Result<Self, SequenceSpaceExhausted> {
        debug_assert!(window_size >= 1, "window_size must be at least 1");
        let count = chunks.len();
        u32::try_from(count).map_err(|_| SequenceSpaceExhausted(count))?;

        let frames = chunks
            .into_iter()
            .zip(0u32..)
            .map(|(chunk, seq)| Packet::data(seq, chunk).encode())
            .collect();

        Ok(Self {
            base: 0,
            next_seq: 0,
            window_size: u32::try_from(window_size.max(1)).unwrap_or(u32::MAX),
            frames,
            timer: RetransmitTimer::new(timeout),
        })
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn next_seq(&self) -> u32 {
        self.next_seq
    }

    pub fn window_size(&self) -> u32 {
        self.window_size
    }

    /// Number of DATA packets in the transfer.
    pub fn total(&self) -> u32 {
        // Checked against u32 in `new`.
        self.frames.len() as u32
    }

    /// Packets sent but not yet acknowledged.
    pub fn in_flight(&self) -> u32 {
        self.next_seq - self.base
    }

    /// `true` once every DATA packet has been acknowledged.
    pub fn is_complete(&self) -> bool {
        self.base == self.total()
    }

    pub fn timer(&self) -> &RetransmitTimer {
        &self.timer
    }

    /// Encoded bytes of DATA packet `seq`.
    pub fn frame(&self, seq: u32) -> &[u8] {
        &self.frames[seq as usize]
    }

    /// Open the window as far as it allows and return the sequence numbers
    /// that must now be transmitted for the first time, in order.
    ///
    /// Arms the timer if the window was empty before this call.
    pub fn fill(&mut self, now: Instant) -> Range<u32> {
        let limit = self
            .base
            .saturating_add(self.window_size)
            .min(self.total());
        let start = self.next_seq;
        if start >= limit {
            return start..start;
        }
        if self.base == self.next_seq {
            self.timer.arm(now);
        }
        self.next_seq = limit;
        start..limit
    }

    /// Process a cumulative ACK for `ack`.
    ///
    /// On advance the timer restarts for the new oldest packet, or is
    /// disarmed when nothing is left in flight.
    pub fn on_ack(&mut self, ack: u32, now: Instant) -> AckOutcome {
        if ack < self.base {
            return AckOutcome::Stale;
        }
        if ack >= self.next_seq {
            return AckOutcome::Bogus;
        }

        let newly_acked = ack + 1 - self.base;
        self.base = ack + 1;
        if self.base == self.next_seq {
            self.timer.disarm();
        } else {
            self.timer.arm(now);
        }
        AckOutcome::Advanced { newly_acked }
    }

    /// Check the timer.  When it has expired, re-arm it and return the full
    /// outstanding range `[base, next_seq)` for retransmission.
    pub fn on_timeout(&mut self, now: Instant) -> Option<Range<u32>> {
        if !self.timer.is_expired(now) {
            return None;
        }
        self.timer.arm(now);
        Some(self.base..self.next_seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::flags;

    const T: Duration = Duration::from_millis(200);

    fn chunks(n: usize) -> Vec<Vec<u8>> {
        (0..n).map(|i| vec![i as u8; 4]).collect()
    }

    #[test]
    fn initial_state() {
        let s = GbnSender::new(chunks(3), 10, T).unwrap();
        assert_eq!(s.base(), 0);
        assert_eq!(s.next_seq(), 0);
        assert_eq!(s.total(), 3);
        assert!(!s.is_complete());
        assert!(!s.timer().is_armed());
    }

    #[test]
    fn empty_input_is_complete_immediately() {
        let mut s = GbnSender::new(Vec::new(), 10, T).unwrap();
        assert!(s.is_complete());
        assert!(s.fill(Instant::now()).is_empty());
        assert!(!s.timer().is_armed());
    }

    #[test]
    fn frames_are_data_packets_numbered_by_index() {
        let s = GbnSender::new(chunks(3), 10, T).unwrap();
        for seq in 0..3 {
            let pkt = Packet::decode(s.frame(seq)).unwrap();
            assert_eq!(pkt.seq, seq);
            assert_eq!(pkt.flags, flags::DATA);
            assert_eq!(pkt.payload, vec![seq as u8; 4]);
        }
    }

    #[test]
    fn fill_stops_at_window_edge_and_arms_timer() {
        let mut s = GbnSender::new(chunks(10), 4, T).unwrap();
        let now = Instant::now();
        assert_eq!(s.fill(now), 0..4);
        assert_eq!(s.in_flight(), 4);
        assert_eq!(s.timer().deadline(), Some(now + T));

        // Full window: nothing more to send.
        assert!(s.fill(now).is_empty());
    }

    #[test]
    fn fill_stops_at_end_of_input() {
        let mut s = GbnSender::new(chunks(3), 10, T).unwrap();
        assert_eq!(s.fill(Instant::now()), 0..3);
        assert_eq!(s.next_seq(), 3);
    }

    #[test]
    fn fill_into_nonempty_window_keeps_timer() {
        let t0 = Instant::now();
        let mut s = GbnSender::new(chunks(10), 4, T).unwrap();
        s.fill(t0);
        s.on_ack(0, t0 + Duration::from_millis(50));
        assert_eq!(s.fill(t0 + Duration::from_millis(60)), 4..5);
        // Timer was restarted by the ACK, not by the fill.
        assert_eq!(s.timer().deadline(), Some(t0 + Duration::from_millis(250)));
    }

    #[test]
    fn cumulative_ack_slides_multiple() {
        let now = Instant::now();
        let mut s = GbnSender::new(chunks(5), 5, T).unwrap();
        s.fill(now);
        assert_eq!(s.on_ack(2, now), AckOutcome::Advanced { newly_acked: 3 });
        assert_eq!(s.base(), 3);
        assert!(s.timer().is_armed());
    }

    #[test]
    fn final_ack_disarms_timer() {
        let now = Instant::now();
        let mut s = GbnSender::new(chunks(2), 5, T).unwrap();
        s.fill(now);
        assert_eq!(s.on_ack(1, now), AckOutcome::Advanced { newly_acked: 2 });
        assert!(s.is_complete());
        assert!(!s.timer().is_armed());
    }

    #[test]
    fn stale_ack_is_ignored() {
        let now = Instant::now();
        let mut s = GbnSender::new(chunks(5), 5, T).unwrap();
        s.fill(now);
        s.on_ack(2, now);
        assert_eq!(s.on_ack(1, now), AckOutcome::Stale);
        assert_eq!(s.base(), 3);
    }

    #[test]
    fn ack_for_unsent_packet_is_bogus() {
        let now = Instant::now();
        let mut s = GbnSender::new(chunks(10), 3, T).unwrap();
        s.fill(now);
        assert_eq!(s.on_ack(5, now), AckOutcome::Bogus);
        assert_eq!(s.base(), 0);
        assert_eq!(s.next_seq(), 3);
    }

    #[test]
    fn timeout_returns_whole_outstanding_window() {
        let t0 = Instant::now();
        let mut s = GbnSender::new(chunks(10), 4, T).unwrap();
        s.fill(t0);
        s.on_ack(0, t0);

        assert_eq!(s.on_timeout(t0 + Duration::from_millis(199)), None);
        let late = t0 + T;
        assert_eq!(s.on_timeout(late), Some(1..4));
        // Re-armed from the retransmission instant.
        assert_eq!(s.timer().deadline(), Some(late + T));
    }

    #[test]
    fn no_timeout_while_idle() {
        let t0 = Instant::now();
        let mut s = GbnSender::new(chunks(1), 4, T).unwrap();
        s.fill(t0);
        s.on_ack(0, t0);
        assert_eq!(s.on_timeout(t0 + T * 5), None);
    }

    #[test]
    fn window_bound_holds_through_random_acks() {
        let t0 = Instant::now();
        let mut s = GbnSender::new(chunks(50), 7, T).unwrap();
        let mut ack = 0u32;
        while !s.is_complete() {
            s.fill(t0);
            assert!(s.next_seq() - s.base() <= s.window_size());
            assert!(s.next_seq() <= s.total());
            ack = (ack + 3).min(s.next_seq() - 1);
            s.on_ack(ack, t0);
        }
    }

    #[test]
    fn window_of_one_is_stop_and_wait() {
        let now = Instant::now();
        let mut s = GbnSender::new(chunks(3), 1, T).unwrap();
        assert_eq!(s.fill(now), 0..1);
        assert!(s.fill(now).is_empty());
        s.on_ack(0, now);
        assert_eq!(s.fill(now), 1..2);
    }
}
