//! Entry point for `rdt`.
//!
//! Parses CLI arguments and dispatches into sender, receiver, or TCP baseline
//! mode.  All protocol work is delegated to the library; `main.rs` owns only
//! process setup (logging, argument parsing, file I/O, printing statistics).

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::AsyncWriteExt;
use tokio::net::{lookup_host, TcpListener};

use rdt_over_udp::{baseline, RdtConfig, RdtReceiver, RdtSender};

/// Reliable file transfer over UDP (Go-Back-N).
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Send a file to a listening receiver.
    Send {
        /// Receiver address (e.g. 127.0.0.1:9000).
        peer: String,
        /// File to transfer.
        input: PathBuf,
        #[command(flatten)]
        tuning: Tuning,
    },
    /// Receive one file, then exit.
    Recv {
        /// UDP port to listen on.
        port: u16,
        /// Where to write the received bytes.
        output: PathBuf,
        #[command(flatten)]
        tuning: Tuning,
    },
    /// Baseline: send a file over plain TCP.
    TcpSend {
        peer: String,
        input: PathBuf,
    },
    /// Baseline: receive one file over plain TCP.
    TcpRecv {
        port: u16,
        output: PathBuf,
    },
}

#[derive(Args)]
struct Tuning {
    /// Probability in [0, 1] that an outbound packet is dropped.
    #[arg(short, long, default_value_t = 0.0)]
    loss: f64,
    /// Go-Back-N window size, in packets.
    #[arg(long, default_value_t = rdt_over_udp::config::DEFAULT_WINDOW_SIZE)]
    window: usize,
    /// Retransmission timeout in milliseconds.
    #[arg(long, default_value_t = 200)]
    timeout_ms: u64,
    /// Bounded wait per inbound datagram in milliseconds.
    #[arg(long, default_value_t = 10)]
    poll_ms: u64,
    /// FIN attempts before closing without a FIN-ACK.
    #[arg(long, default_value_t = rdt_over_udp::config::DEFAULT_FIN_RETRIES)]
    fin_retries: u32,
    /// Seed for reproducible simulated loss.
    #[arg(long)]
    seed: Option<u64>,
    /// Receiver gives up after this many milliseconds of silence.
    #[arg(long)]
    idle_ms: Option<u64>,
}

impl From<Tuning> for RdtConfig {
    fn from(t: Tuning) -> Self {
        RdtConfig {
            window_size: t.window,
            timeout: Duration::from_millis(t.timeout_ms),
            poll_interval: Duration::from_millis(t.poll_ms),
            fin_retries: t.fin_retries,
            loss_prob: t.loss,
            seed: t.seed,
            idle_timeout: t.idle_ms.map(Duration::from_millis),
        }
    }
}

async fn resolve(peer: &str) -> Result<SocketAddr> {
    let addrs = lookup_host(peer)
        .await
        .with_context(|| format!("cannot resolve {peer}"))?;
    pick_addr(addrs).with_context(|| format!("{peer} resolved to no addresses"))
}

/// First IPv4 address if any, else the first address.  `recv` listens on
/// IPv4 only, so `localhost` must not turn into `::1`.
fn pick_addr(addrs: impl IntoIterator<Item = SocketAddr>) -> Option<SocketAddr> {
    let addrs: Vec<SocketAddr> = addrs.into_iter().collect();
    addrs
        .iter()
        .copied()
        .find(SocketAddr::is_ipv4)
        .or_else(|| addrs.first().copied())
}

/// Listen on every IPv4 interface.
fn listen_addr(port: u16) -> SocketAddr {
    (Ipv4Addr::UNSPECIFIED, port).into()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();

    match cli.mode {
        Mode::Send { peer, input, tuning } => {
            let peer = resolve(&peer).await?;
            let data = tokio::fs::read(&input)
                .await
                .with_context(|| format!("reading {}", input.display()))?;
            log::info!("Loaded {} bytes from {}", data.len(), input.display());

            let sender = RdtSender::connect(peer, tuning.into()).await?;
            let report = sender.send(&data).await?;
            println!("{report}");
        }
        Mode::Recv { port, output, tuning } => {
            let receiver = RdtReceiver::bind(listen_addr(port), tuning.into()).await?;
            let mut file = tokio::fs::File::create(&output)
                .await
                .with_context(|| format!("creating {}", output.display()))?;
            let report = receiver.receive(&mut file).await?;
            file.sync_all().await?;
            println!("{report}");
        }
        Mode::TcpSend { peer, input } => {
            let peer = resolve(&peer).await?;
            let data = tokio::fs::read(&input)
                .await
                .with_context(|| format!("reading {}", input.display()))?;
            let report = baseline::tcp_send(peer, &data).await?;
            println!("{report}");
        }
        Mode::TcpRecv { port, output } => {
            let listener = TcpListener::bind(listen_addr(port)).await?;
            log::info!("Listening on TCP port {port}");
            let mut file = tokio::fs::File::create(&output)
                .await
                .with_context(|| format!("creating {}", output.display()))?;
            let report = baseline::tcp_receive(&listener, &mut file).await?;
            file.flush().await?;
            println!("{report}");
        }
    }

    Ok(())
}
