//! Sending endpoint.
//!
//! [`RdtSender`] drives a [`GbnSender`] over a [`Socket`], one packet at a
//! time, in a single task:
//!
//! ```text
//!  loop until every DATA packet is ACKed:
//!    1. fill the window          → transmit new packets
//!    2. wait ≤ poll_interval     → process one inbound ACK (if any)
//!    3. timer expired?           → retransmit [base, next_seq)
//!  then: FIN / FIN-ACK handshake, best effort
//! ```
//!
//! The bounded wait in step 2 is what interleaves sending and ACK processing;
//! an empty wait is a no-op, never a timeout signal.  Every outbound packet
//! passes through the endpoint's [`LossSimulator`].

use std::fmt;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tokio::time::{timeout, timeout_at};

use crate::config::RdtConfig;
use crate::error::TransferError;
use crate::gbn_sender::{AckOutcome, GbnSender};
use crate::packet::{flags, Packet, MAX_DATA_SIZE};
use crate::simulator::{Delivery, LossSimulator};
use crate::socket::Socket;

/// Split a byte stream into DATA-sized chunks.  Only the last chunk may be
/// shorter than [`MAX_DATA_SIZE`]; empty input yields no chunks.
pub fn split_chunks(data: &[u8]) -> Vec<Vec<u8>> {
    data.chunks(MAX_DATA_SIZE).map(<[u8]>::to_vec).collect()
}

/// Counters collected over one transfer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SenderStats {
    /// Every transmission attempt, including retransmissions and FINs.
    pub packets_sent: u64,
    pub retransmissions: u64,
    /// Distinct DATA packets in the transfer.
    pub unique_packets: u64,
    /// Valid ACK packets received, stale ones included.
    pub acks_received: u64,
    /// Inbound datagrams that failed to decode.
    pub corrupt: u64,
    pub simulated_drops: u64,
}

/// How the closing handshake ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teardown {
    /// The receiver answered a FIN with FIN-ACK.
    Acknowledged,
    /// Every FIN attempt went unanswered.  The data was still fully
    /// acknowledged, so the transfer counts as complete.
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct SenderReport {
    pub stats: SenderStats,
    pub teardown: Teardown,
    /// Payload bytes transferred.
    pub bytes: u64,
    pub elapsed: Duration,
}

impl SenderReport {
    /// Payload throughput in Mbit/s; 0 for an instantaneous run.
    pub fn throughput_mbps(&self) -> f64 {
        mbps(self.bytes, self.elapsed)
    }
}

pub(crate) fn mbps(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        (bytes as f64 * 8.0) / (secs * 1_000_000.0)
    } else {
        0.0
    }
}

impl fmt::Display for SenderReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[SENDER] Transmission stats:")?;
        writeln!(f, "  Total packets sent:        {}", self.stats.packets_sent)?;
        writeln!(f, "  Total retransmissions:     {}", self.stats.retransmissions)?;
        writeln!(f, "  Unique data packets:       {}", self.stats.unique_packets)?;
        writeln!(f, "  ACKs received:             {}", self.stats.acks_received)?;
        writeln!(f, "  Corrupt packets:           {}", self.stats.corrupt)?;
        writeln!(f, "  Simulated drops:           {}", self.stats.simulated_drops)?;
        writeln!(f, "  Teardown:                  {:?}", self.teardown)?;
        writeln!(f, "  Bytes:                     {}", self.bytes)?;
        writeln!(f, "  Elapsed time (s):          {:.6}", self.elapsed.as_secs_f64())?;
        write!(f, "  Throughput:                {:.3} Mbit/s", self.throughput_mbps())
    }
}

/// The sending side of one transfer.
#[derive(Debug)]
pub struct RdtSender {
    socket: Socket,
    peer: SocketAddr,
    config: RdtConfig,
    loss: LossSimulator,
    stats: SenderStats,
}

impl RdtSender {
    /// Bind an ephemeral local port and prepare to send to `peer`.
    pub async fn connect(peer: SocketAddr, config: RdtConfig) -> Result<Self, TransferError> {
        config.validate()?;
        let socket = Socket::bind_for(peer).await?;
        Self::with_socket(socket, peer, config)
    }

    /// Use an already-bound socket.
    pub fn with_socket(
        socket: Socket,
        peer: SocketAddr,
        config: RdtConfig,
    ) -> Result<Self, TransferError> {
        config.validate()?;
        let loss = LossSimulator::new(config.loss_prob, config.seed);
        Ok(Self {
            socket,
            peer,
            config,
            loss,
            stats: SenderStats::default(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.socket.local_addr
    }

    /// Transfer `data` reliably, then close.
    pub async fn send(self, data: &[u8]) -> Result<SenderReport, TransferError> {
        self.send_chunks(split_chunks(data)).await
    }

    /// Transfer pre-chunked data reliably, then close.
    ///
    /// Each chunk must be at most [`MAX_DATA_SIZE`] bytes.
    pub async fn send_chunks(mut self, chunks: Vec<Vec<u8>>) -> Result<SenderReport, TransferError> {
        let started = Instant::now();
        let bytes: u64 = chunks.iter().map(|c| c.len() as u64).sum();
        let mut window = GbnSender::new(chunks, self.config.window_size, self.config.timeout)?;
        self.stats.unique_packets = u64::from(window.total());

        log::info!(
            "[sender] {} data packets ({bytes} bytes) to {}, window={}, timeout={:?}",
            window.total(),
            self.peer,
            window.window_size(),
            self.config.timeout
        );

        while !window.is_complete() {
            for seq in window.fill(Instant::now()) {
                self.transmit(window.frame(seq)).await?;
                log::debug!("[sender] → DATA seq={seq}");
            }

            if let Some(datagram) = self.poll_inbound().await? {
                self.on_datagram(&mut window, &datagram);
            }

            if let Some(range) = window.on_timeout(Instant::now()) {
                log::debug!(
                    "[sender] timeout, resending base={} next_seq={}",
                    range.start,
                    range.end
                );
                for seq in range {
                    self.transmit(window.frame(seq)).await?;
                    self.stats.retransmissions += 1;
                    log::debug!("[sender] → DATA seq={seq} (retransmit)");
                }
            }
        }

        log::info!("[sender] all data acknowledged, sending FIN");
        let teardown = self.teardown().await?;

        Ok(SenderReport {
            stats: self.stats,
            teardown,
            bytes,
            elapsed: started.elapsed(),
        })
    }

    /// Apply one inbound datagram to the window.  Anything but a valid ACK
    /// leaves the window untouched.
    fn on_datagram(&mut self, window: &mut GbnSender, datagram: &[u8]) {
        let pkt = match Packet::decode(datagram) {
            Ok(pkt) => pkt,
            Err(e) => {
                self.stats.corrupt += 1;
                log::debug!("[sender] ignoring bad packet: {e}");
                return;
            }
        };
        if pkt.flags != flags::ACK {
            log::debug!("[sender] ignoring unexpected {}", flags::name(pkt.flags));
            return;
        }

        self.stats.acks_received += 1;
        match window.on_ack(pkt.seq, Instant::now()) {
            AckOutcome::Advanced { newly_acked } => {
                log::debug!(
                    "[sender] ← ACK seq={} (slid {newly_acked}, base={})",
                    pkt.seq,
                    window.base()
                );
            }
            AckOutcome::Stale => log::debug!("[sender] ← stale ACK seq={}", pkt.seq),
            AckOutcome::Bogus => log::debug!("[sender] ← ACK seq={} for unsent data", pkt.seq),
        }
    }

    /// Send FIN until a FIN-ACK comes back or the retry budget runs out.
    async fn teardown(&mut self) -> Result<Teardown, TransferError> {
        let fin = Packet::fin().encode();

        for attempt in 1..=self.config.fin_retries {
            self.transmit(&fin).await?;
            log::debug!("[sender] → FIN (attempt {attempt})");

            // Late ACKs may still be queued; drain them for one poll interval.
            let deadline = tokio::time::Instant::now() + self.config.poll_interval;
            while let Ok(received) = timeout_at(deadline, self.socket.recv_from()).await {
                // Some platforms surface ICMP port-unreachable here once the
                // receiver has gone; that is just another unanswered FIN.
                let datagram = match received {
                    Ok((datagram, _)) => datagram,
                    Err(e) => {
                        log::debug!("[sender] receive error during teardown: {e}");
                        continue;
                    }
                };
                match Packet::decode(&datagram) {
                    Ok(pkt) if pkt.flags == flags::FIN_ACK => {
                        log::info!("[sender] ← FIN-ACK, closing");
                        return Ok(Teardown::Acknowledged);
                    }
                    Ok(pkt) => log::debug!("[sender] ignoring {} during teardown", flags::name(pkt.flags)),
                    Err(e) => {
                        self.stats.corrupt += 1;
                        log::debug!("[sender] ignoring bad packet during teardown: {e}");
                    }
                }
            }
        }

        log::warn!(
            "[sender] no FIN-ACK after {} attempts; closing anyway",
            self.config.fin_retries
        );
        Ok(Teardown::TimedOut)
    }

    /// Wait up to one poll interval for a datagram.
    async fn poll_inbound(&self) -> Result<Option<Vec<u8>>, TransferError> {
        match timeout(self.config.poll_interval, self.socket.recv_from()).await {
            Ok(received) => Ok(Some(received?.0)),
            Err(_elapsed) => Ok(None),
        }
    }

    async fn transmit(&mut self, datagram: &[u8]) -> Result<(), TransferError> {
        self.stats.packets_sent += 1;
        if self.loss.send_to(&self.socket, datagram, self.peer).await? == Delivery::Dropped {
            self.stats.simulated_drops += 1;
            log::warn!("[sender] *** simulated drop ***");
        }
        Ok(())
    }
}
