//! Run-level error type.
//!
//! Per-packet problems (corrupt or truncated datagrams, stale ACKs, simulated
//! drops, an unanswered FIN) never end a transfer and never appear here.
//! [`TransferError`] covers the conditions that do.

use std::time::Duration;

use crate::config::ConfigError;
use crate::gbn_sender::SequenceSpaceExhausted;
use crate::socket::SocketError;

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Socket(#[from] SocketError),

    #[error("writing delivered data failed: {0}")]
    Sink(#[source] std::io::Error),

    #[error(transparent)]
    TooManyChunks(#[from] SequenceSpaceExhausted),

    #[error("no datagram received for {0:?}")]
    Idle(Duration),
}
