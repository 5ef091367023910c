//! Receiving endpoint.
//!
//! [`RdtReceiver`] reads one datagram at a time, feeds DATA packets to a
//! [`GbnReceiver`], appends in-order payloads to the output sink and answers
//! with (re-)ACKs.  A FIN is answered with a single FIN-ACK and ends the run;
//! the receiver does not wait to learn whether the FIN-ACK arrived.
//!
//! The sender address is learned from the first valid packet and every reply
//! goes to it, through the endpoint's [`LossSimulator`].  Datagrams from other
//! sources are still processed but never answered directly.

use std::fmt;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::config::RdtConfig;
use crate::error::TransferError;
use crate::gbn_receiver::{DataVerdict, GbnReceiver};
use crate::packet::{flags, Packet};
use crate::sender::mbps;
use crate::simulator::{Delivery, LossSimulator};
use crate::socket::Socket;

/// Counters collected over one transfer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReceiverStats {
    /// Every datagram read, whatever its content.
    pub packets_received: u64,
    /// DATA packets appended to the output.
    pub delivered: u64,
    pub bytes_delivered: u64,
    pub corrupt: u64,
    /// DATA packets at or below the last delivered sequence.
    pub duplicates: u64,
    /// DATA packets beyond the next expected sequence.
    pub out_of_order: u64,
    /// ACK transmissions attempted, re-ACKs included.
    pub acks_sent: u64,
    pub simulated_drops: u64,
}

#[derive(Debug, Clone)]
pub struct ReceiverReport {
    pub stats: ReceiverStats,
    /// Source of the first valid packet, where every reply was sent; `None`
    /// if none ever arrived.
    pub sender: Option<SocketAddr>,
    pub elapsed: Duration,
}

impl ReceiverReport {
    /// Delivered payload throughput in Mbit/s.
    pub fn throughput_mbps(&self) -> f64 {
        mbps(self.stats.bytes_delivered, self.elapsed)
    }
}

impl fmt::Display for ReceiverReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[RECV] Receiver stats:")?;
        writeln!(f, "  Total packets received:   {}", self.stats.packets_received)?;
        writeln!(f, "  Delivered in-order:       {}", self.stats.delivered)?;
        writeln!(f, "  Bytes delivered:          {}", self.stats.bytes_delivered)?;
        writeln!(f, "  Corrupt packets:          {}", self.stats.corrupt)?;
        writeln!(f, "  Duplicate packets:        {}", self.stats.duplicates)?;
        writeln!(f, "  Out-of-order packets:     {}", self.stats.out_of_order)?;
        writeln!(f, "  ACKs sent:                {}", self.stats.acks_sent)?;
        writeln!(f, "  Simulated drops:          {}", self.stats.simulated_drops)?;
        writeln!(f, "  Elapsed time (s):         {:.6}", self.elapsed.as_secs_f64())?;
        write!(f, "  Throughput:               {:.3} Mbit/s", self.throughput_mbps())
    }
}

/// The receiving side of one transfer.
#[derive(Debug)]
pub struct RdtReceiver {
    socket: Socket,
    config: RdtConfig,
    loss: LossSimulator,
    stats: ReceiverStats,
}

impl RdtReceiver {
    /// Bind the listening address.
    pub async fn bind(addr: SocketAddr, config: RdtConfig) -> Result<Self, TransferError> {
        config.validate()?;
        let socket = Socket::bind(addr).await?;
        Self::with_socket(socket, config)
    }

    /// Use an already-bound socket.
    pub fn with_socket(socket: Socket, config: RdtConfig) -> Result<Self, TransferError> {
        config.validate()?;
        let loss = LossSimulator::new(config.loss_prob, config.seed);
        Ok(Self {
            socket,
            config,
            loss,
            stats: ReceiverStats::default(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.socket.local_addr
    }

    /// Receive one transfer into `sink`, returning once a FIN is answered.
    pub async fn receive<W>(mut self, sink: &mut W) -> Result<ReceiverReport, TransferError>
    where
        W: AsyncWrite + Unpin,
    {
        log::info!("[receiver] listening on {}", self.socket.local_addr);

        let started = Instant::now();
        let mut state = GbnReceiver::new();
        let mut sender: Option<SocketAddr> = None;
        let mut last_heard = Instant::now();

        loop {
            let (datagram, from) = match timeout(self.config.poll_interval, self.socket.recv_from()).await {
                Ok(received) => received?,
                Err(_elapsed) => {
                    if let Some(limit) = self.config.idle_timeout {
                        if last_heard.elapsed() >= limit {
                            return Err(TransferError::Idle(limit));
                        }
                    }
                    continue;
                }
            };
            last_heard = Instant::now();
            self.stats.packets_received += 1;

            let pkt = match Packet::decode(&datagram) {
                Ok(pkt) => pkt,
                Err(e) => {
                    self.stats.corrupt += 1;
                    log::debug!("[receiver] corrupt packet from {from}: {e}");
                    if let (Some(ack), Some(peer)) = (state.on_corrupt(), sender) {
                        self.send_ack(ack, peer).await?;
                    }
                    continue;
                }
            };
            let peer = *sender.get_or_insert(from);
            if from != peer {
                log::debug!("[receiver] {} from {from}, replying to {peer}", flags::name(pkt.flags));
            }

            match pkt.flags {
                flags::DATA => self.on_data(&mut state, pkt, peer, sink).await?,
                flags::FIN => {
                    log::info!("[receiver] ← FIN, sending FIN-ACK and closing");
                    self.transmit(&Packet::fin_ack().encode(), peer).await?;
                    break;
                }
                other => log::debug!("[receiver] ignoring {} (flag={other})", flags::name(other)),
            }
        }

        sink.flush().await.map_err(TransferError::Sink)?;

        Ok(ReceiverReport {
            stats: self.stats,
            sender,
            elapsed: started.elapsed(),
        })
    }

    async fn on_data<W>(
        &mut self,
        state: &mut GbnReceiver,
        pkt: Packet,
        peer: SocketAddr,
        sink: &mut W,
    ) -> Result<(), TransferError>
    where
        W: AsyncWrite + Unpin,
    {
        match state.on_data(pkt.seq) {
            DataVerdict::Deliver { ack } => {
                sink.write_all(&pkt.payload).await.map_err(TransferError::Sink)?;
                self.stats.delivered += 1;
                self.stats.bytes_delivered += pkt.payload.len() as u64;
                log::debug!("[receiver] ← DATA seq={} len={} delivered", pkt.seq, pkt.payload.len());
                self.send_ack(ack, peer).await?;
            }
            DataVerdict::Duplicate { reack } => {
                self.stats.duplicates += 1;
                log::debug!(
                    "[receiver] duplicate seq={}, expected={}",
                    pkt.seq,
                    state.expected_seq()
                );
                if let Some(ack) = reack {
                    self.send_ack(ack, peer).await?;
                }
            }
            DataVerdict::OutOfOrder { reack } => {
                self.stats.out_of_order += 1;
                log::debug!(
                    "[receiver] out-of-order seq={}, expected={}; discarded",
                    pkt.seq,
                    state.expected_seq()
                );
                if let Some(ack) = reack {
                    self.send_ack(ack, peer).await?;
                }
            }
        }
        Ok(())
    }

    async fn send_ack(&mut self, ack: u32, peer: SocketAddr) -> Result<(), TransferError> {
        self.stats.acks_sent += 1;
        log::debug!("[receiver] → ACK seq={ack}");
        self.transmit(&Packet::ack(ack).encode(), peer).await
    }

    async fn transmit(&mut self, datagram: &[u8], peer: SocketAddr) -> Result<(), TransferError> {
        if self.loss.send_to(&self.socket, datagram, peer).await? == Delivery::Dropped {
            self.stats.simulated_drops += 1;
            log::warn!("[receiver] *** simulated drop ***");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn idle_receiver_gives_up() {
        let cfg = RdtConfig {
            idle_timeout: Some(Duration::from_millis(50)),
            ..Default::default()
        };
        let receiver = RdtReceiver::bind("127.0.0.1:0".parse().unwrap(), cfg)
            .await
            .unwrap();
        let mut out = Vec::new();
        let err = receiver.receive(&mut out).await.unwrap_err();
        assert!(matches!(err, TransferError::Idle(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn report_display_lists_counters() {
        let report = ReceiverReport {
            stats: ReceiverStats {
                packets_received: 5,
                duplicates: 2,
                ..Default::default()
            },
            sender: None,
            elapsed: Duration::from_millis(10),
        };
        let text = report.to_string();
        assert!(text.contains("Total packets received:   5"));
        assert!(text.contains("Duplicate packets:        2"));
    }
}
