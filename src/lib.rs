//! `rdt-over-udp`: reliable, in-order file transfer over UDP using
//! Go-Back-N ARQ.
//!
//! # Architecture
//!
//! ```text
//!  ┌────────────┐   DATA / FIN    ┌──────────────┐
//!  │ RdtSender  │────────────────▶│ RdtReceiver  │──▶ output sink
//!  │ GbnSender  │                 │ GbnReceiver  │
//!  └─────┬──────┘◀────────────────└──────┬───────┘
//!        │          ACK / FIN-ACK         │
//!  ┌─────▼──────┐                  ┌──────▼──────┐
//!  │ LossSim.   │                  │ LossSim.    │  (outbound only)
//!  └─────┬──────┘                  └──────┬──────┘
//!        │        raw UDP datagrams       │
//!  ┌─────▼────────────────────────────────▼──────┐
//!  │                  Socket                     │
//!  └─────────────────────────────────────────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`packet`]        : wire format and Internet checksum
//! - [`simulator`]     : probabilistic outbound packet loss
//! - [`timer`]         : fixed-timeout retransmission timer
//! - [`gbn_sender`]    : send window state machine
//! - [`gbn_receiver`]  : in-order delivery state machine
//! - [`sender`]        : sending endpoint (window loop + FIN handshake)
//! - [`receiver`]      : receiving endpoint (delivery loop + FIN-ACK)
//! - [`socket`]        : async UDP socket abstraction
//! - [`config`]        : tunable parameters
//! - [`error`]         : run-level errors
//! - [`baseline`]      : plain TCP transfer for throughput comparison
//!
//! # Liveness
//!
//! Safety (in-order, gap-free, duplicate-free output) holds under any loss.
//! Progress does not: with loss high enough that no window ever gets through
//! within the timeout, the sender keeps retransmitting and never finishes.

pub mod baseline;
pub mod config;
pub mod error;
pub mod gbn_receiver;
pub mod gbn_sender;
pub mod packet;
pub mod receiver;
pub mod sender;
pub mod simulator;
pub mod socket;
pub mod timer;

pub use config::RdtConfig;
pub use error::TransferError;
pub use receiver::{RdtReceiver, ReceiverReport};
pub use sender::{RdtSender, SenderReport, Teardown};
