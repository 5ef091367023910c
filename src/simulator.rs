//! Simulated packet loss on the outbound path.
//!
//! Real networks drop packets.  To exercise the reliability mechanisms without
//! depending on actual network conditions, every outbound datagram on both
//! endpoints goes through a [`LossSimulator`], which discards it with a fixed
//! probability instead of handing it to the socket.
//!
//! The simulator never alters packet content and knows nothing about the
//! protocol; a dropped packet is indistinguishable from genuine loss and is
//! recovered by the ordinary retransmission / re-ACK paths.
//!
//! Seeding the simulator ([`LossSimulator::new`] with `Some(seed)`) makes the
//! drop pattern reproducible.

use std::net::SocketAddr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::socket::{Socket, SocketError};

/// What happened to a datagram handed to [`LossSimulator::send_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Passed to the socket.
    Sent,
    /// Discarded locally to simulate loss.
    Dropped,
}

/// Probabilistic drop decorator around "send a datagram".
#[derive(Debug)]
pub struct LossSimulator {
    loss_prob: f64,
    rng: StdRng,
    drops: u64,
}

impl LossSimulator {
    /// Create a simulator dropping each packet with probability `loss_prob`.
    ///
    /// `loss_prob` is clamped to `[0.0, 1.0]`; `seed = None` draws from OS
    /// entropy.
    pub fn new(loss_prob: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            loss_prob: loss_prob.clamp(0.0, 1.0),
            rng,
            drops: 0,
        }
    }

    /// A pass-through simulator (never drops).
    pub fn lossless() -> Self {
        Self::new(0.0, Some(0))
    }

    pub fn loss_prob(&self) -> f64 {
        self.loss_prob
    }

    /// Number of datagrams dropped so far.
    pub fn drops(&self) -> u64 {
        self.drops
    }

    /// Draw one uniform sample in `[0, 1)`; `true` when it falls below the
    /// loss probability.
    pub fn should_drop(&mut self) -> bool {
        let sample: f64 = self.rng.random();
        let drop = sample < self.loss_prob;
        if drop {
            self.drops += 1;
        }
        drop
    }

    /// Transmit `datagram` to `dest` unless this draw says to drop it.
    pub async fn send_to(
        &mut self,
        socket: &Socket,
        datagram: &[u8],
        dest: SocketAddr,
    ) -> Result<Delivery, SocketError> {
        if self.should_drop() {
            log::debug!("[loss] simulated drop of {} byte datagram to {dest}", datagram.len());
            return Ok(Delivery::Dropped);
        }
        socket.send_to(datagram, dest).await?;
        Ok(Delivery::Sent)
    }
}
