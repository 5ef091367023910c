//! Wire-format definitions for protocol packets.
//!
//! Every datagram exchanged between sender and receiver is a [`Packet`].  This
//! module is responsible for:
//! - Defining the on-wire binary layout (sequence, flag tag, checksum, payload).
//! - Serialising a [`Packet`] into a byte buffer ready for transmission.
//! - Deserialising a raw byte slice back into a [`Packet`], returning errors
//!   for truncated or corrupted input.
//!
//! No I/O happens here.
//!
//! # Wire format
//!
//! All multi-byte integers are **big-endian**.
//!
//! ```text
//!  0               1               2               3
//!  0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        Sequence Number                        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     Flags     |           Checksum            |  Payload ...  |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Total header size: [`HEADER_LEN`] = 7 bytes.
//! seq(4) + flags(1) + checksum(2)
//!
//! There is no length field: the payload is whatever follows the header in
//! the datagram.

use thiserror::Error;

/// Packet kind tags for the `flags` header field.
///
/// Despite the field name these are mutually exclusive values, not bits.
pub mod flags {
    /// Carries one chunk of the transferred byte stream.
    pub const DATA: u8 = 0;
    /// Cumulative acknowledgement of every DATA packet up to `seq`.
    pub const ACK: u8 = 1;
    /// Sender has no more data; requests teardown.
    pub const FIN: u8 = 2;
    /// Receiver's reply to FIN.
    pub const FIN_ACK: u8 = 3;

    /// Human-readable name for logging; unknown tags render as `"UNKNOWN"`.
    pub fn name(flag: u8) -> &'static str {
        match flag {
            DATA => "DATA",
            ACK => "ACK",
            FIN => "FIN",
            FIN_ACK => "FIN-ACK",
            _ => "UNKNOWN",
        }
    }
}

/// Byte length of the fixed-size header on the wire.
pub const HEADER_LEN: usize = 7;

/// Datagram budget: 1500-byte Ethernet MTU minus IPv4 (20) and UDP (8) headers.
pub const MAX_DATAGRAM: usize = 1472;

/// Largest payload a single DATA packet may carry.
pub const MAX_DATA_SIZE: usize = MAX_DATAGRAM - HEADER_LEN;

// Byte offsets of each field within the serialised header.
const OFF_SEQ: usize = 0;
const OFF_FLAGS: usize = 4;
const OFF_CHECKSUM: usize = 5;

/// A complete protocol datagram: header fields + payload bytes.
///
/// The checksum is not stored; it is computed by [`Packet::encode`] and
/// verified by [`Packet::decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// DATA: chunk index.  ACK: cumulative sequence acknowledged.
    /// FIN / FIN-ACK: unused, sent as 0.
    pub seq: u32,
    /// One of the [`flags`] tags.  Unknown values survive decoding untouched.
    pub flags: u8,
    pub payload: Vec<u8>,
}

impl Packet {
    /// DATA packet carrying chunk number `seq`.
    pub fn data(seq: u32, payload: Vec<u8>) -> Self {
        Self {
            seq,
            flags: flags::DATA,
            payload,
        }
    }

    /// Cumulative ACK for `seq`.
    pub fn ack(seq: u32) -> Self {
        Self {
            seq,
            flags: flags::ACK,
            payload: Vec::new(),
        }
    }

    pub fn fin() -> Self {
        Self {
            seq: 0,
            flags: flags::FIN,
            payload: Vec::new(),
        }
    }

    pub fn fin_ack() -> Self {
        Self {
            seq: 0,
            flags: flags::FIN_ACK,
            payload: Vec::new(),
        }
    }

    /// Serialise this packet into a newly allocated byte vector.
    ///
    /// The payload must not exceed [`MAX_DATA_SIZE`]; callers are expected to
    /// chunk their input accordingly.
    pub fn encode(&self) -> Vec<u8> {
        debug_assert!(
            self.payload.len() <= MAX_DATA_SIZE,
            "payload of {} bytes exceeds MAX_DATA_SIZE ({MAX_DATA_SIZE})",
            self.payload.len()
        );

        let mut buf = vec![0u8; HEADER_LEN + self.payload.len()];
        buf[OFF_SEQ..OFF_SEQ + 4].copy_from_slice(&self.seq.to_be_bytes());
        buf[OFF_FLAGS] = self.flags;
        // Checksum field stays zero while computing the checksum.
        buf[HEADER_LEN..].copy_from_slice(&self.payload);

        let csum = internet_checksum(&buf);
        buf[OFF_CHECKSUM..OFF_CHECKSUM + 2].copy_from_slice(&csum.to_be_bytes());
        buf
    }

    /// Parse a [`Packet`] from a raw datagram.
    ///
    /// Returns [`Err`] if:
    /// - `buf` is shorter than [`HEADER_LEN`], or
    /// - the checksum does not verify.
    ///
    /// The `flags` value is not validated.
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < HEADER_LEN {
            return Err(PacketError::Malformed { len: buf.len() });
        }

        let seq = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let flags = buf[OFF_FLAGS];
        let expected = u16::from_be_bytes([buf[OFF_CHECKSUM], buf[OFF_CHECKSUM + 1]]);

        // Verify checksum: zero the stored field, recompute, compare.
        let mut scratch = buf.to_vec();
        scratch[OFF_CHECKSUM..OFF_CHECKSUM + 2].fill(0);
        let computed = internet_checksum(&scratch);
        if computed != expected {
            return Err(PacketError::ChecksumMismatch { expected, computed });
        }

        Ok(Packet {
            seq,
            flags,
            payload: buf[HEADER_LEN..].to_vec(),
        })
    }
}

/// Errors that can arise when parsing a raw datagram.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    /// Buffer shorter than the fixed header size.
    #[error("malformed packet: {len} bytes is shorter than the {HEADER_LEN}-byte header")]
    Malformed { len: usize },
    /// Header or payload was altered in transit.
    #[error("checksum mismatch: header says {expected:#06x}, computed {computed:#06x}")]
    ChecksumMismatch { expected: u16, computed: u16 },
}

/// Compute the Internet checksum (RFC 1071) over `data`.
///
/// Sum consecutive 16-bit big-endian words, fold the carry, return the
/// one's-complement.  The caller must zero any checksum field within `data`
/// before calling this function.
///
/// Being a one's-complement sum it cannot see every corruption: swapping two
/// aligned 16-bit words, or a `0x0000` word turning into `0xffff`, leaves the
/// sum unchanged.  A single flipped bit is always detected.
pub fn internet_checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut words = data.chunks_exact(2);

    for word in &mut words {
        sum += u32::from(u16::from_be_bytes([word[0], word[1]]));
        sum = (sum & 0xffff) + (sum >> 16);
    }
    // Odd trailing byte: pad with a zero byte on the right.
    if let [last] = words.remainder() {
        sum += u32::from(*last) << 8;
    }

    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }

    !(sum as u16)
}
