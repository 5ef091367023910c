//! Go-Back-N receive-side state machine.
//!
//! [`GbnReceiver`] implements the receiver side of Go-Back-N:
//!
//! - Only the **next expected** packet (seq == `expected_seq`) is accepted.
//! - Duplicates and out-of-order packets are discarded without buffering.
//! - Every accepted packet is acknowledged with its own sequence number; every
//!   rejected one is answered by repeating the last cumulative ACK, if any.
//!
//! This module only manages state; payload bytes and socket I/O are the
//! caller's responsibility.

/// What the caller must do with an inbound DATA packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataVerdict {
    /// In order: append the payload to the output, then send ACK(`ack`).
    Deliver { ack: u32 },
    /// Already delivered: discard; re-send ACK(`reack`) if present.
    Duplicate { reack: Option<u32> },
    /// Ahead of a gap: discard; re-send ACK(`reack`) if present.
    OutOfOrder { reack: Option<u32> },
}

/// Go-Back-N receive-side state for one transfer.
///
/// Invariant: the output holds exactly the payloads of packets
/// `0, 1, …, expected_seq − 1`, in order, each once.  `last_acked` is
/// `expected_seq − 1` once anything has been delivered and never decreases.
#[derive(Debug, Default)]
pub struct GbnReceiver {
    expected_seq: u32,
    last_acked: Option<u32>,
}

impl GbnReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next sequence number that will be accepted.
    pub fn expected_seq(&self) -> u32 {
        self.expected_seq
    }

    /// Last cumulative ACK sent, `None` until the first delivery.
    pub fn last_acked(&self) -> Option<u32> {
        self.last_acked
    }

    /// Classify DATA packet `seq` and advance on in-order arrival.
    pub fn on_data(&mut self, seq: u32) -> DataVerdict {
        if seq == self.expected_seq {
            self.last_acked = Some(seq);
            self.expected_seq = self.expected_seq.wrapping_add(1);
            DataVerdict::Deliver { ack: seq }
        } else if seq < self.expected_seq {
            DataVerdict::Duplicate {
                reack: self.last_acked,
            }
        } else {
            // GBN does not buffer ahead of a gap.
            DataVerdict::OutOfOrder {
                reack: self.last_acked,
            }
        }
    }

    /// ACK to repeat after an undecodable packet.
    pub fn on_corrupt(&self) -> Option<u32> {
        self.last_acked
    }
}
