//! Raw TCP throughput baseline.
//!
//! Moves the same bytes over a plain TCP stream so the Go-Back-N transfer has
//! something to be compared against.  Shares nothing with the protocol core
//! beyond the throughput arithmetic.

use std::fmt;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::sender::mbps;

/// Read/write granularity of the baseline.
pub const TCP_CHUNK: usize = 4096;

#[derive(Debug, Clone)]
pub struct BaselineReport {
    pub bytes: u64,
    pub elapsed: Duration,
    pub peer: SocketAddr,
}

impl BaselineReport {
    pub fn throughput_mbps(&self) -> f64 {
        mbps(self.bytes, self.elapsed)
    }
}

impl fmt::Display for BaselineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[TCP] Peer {}", self.peer)?;
        writeln!(f, "[TCP] Transferred {} bytes", self.bytes)?;
        writeln!(f, "[TCP] Elapsed time (s): {:.6}", self.elapsed.as_secs_f64())?;
        write!(f, "[TCP] Throughput: {:.3} Mbit/s", self.throughput_mbps())
    }
}

/// Connect to `peer` and stream `data` in [`TCP_CHUNK`] writes, then shut
/// down the write half.
pub async fn tcp_send(peer: SocketAddr, data: &[u8]) -> std::io::Result<BaselineReport> {
    let mut stream = TcpStream::connect(peer).await?;
    let started = Instant::now();

    for chunk in data.chunks(TCP_CHUNK) {
        stream.write_all(chunk).await?;
    }
    stream.shutdown().await?;

    let report = BaselineReport {
        bytes: data.len() as u64,
        elapsed: started.elapsed(),
        peer,
    };
    log::info!("[tcp-baseline] sent {} bytes to {peer}", report.bytes);
    Ok(report)
}

/// Accept one connection on `listener` and copy everything it sends into
/// `sink` until EOF.
pub async fn tcp_receive<W>(listener: &TcpListener, sink: &mut W) -> std::io::Result<BaselineReport>
where
    W: AsyncWrite + Unpin,
{
    let (mut stream, peer) = listener.accept().await?;
    log::info!("[tcp-baseline] connection from {peer}");
    let started = Instant::now();
    let bytes = copy_chunked(&mut stream, sink).await?;
    Ok(BaselineReport {
        bytes,
        elapsed: started.elapsed(),
        peer,
    })
}

async fn copy_chunked<R, W>(src: &mut R, dst: &mut W) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; TCP_CHUNK];
    let mut total = 0u64;
    loop {
        let n = src.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        dst.write_all(&buf[..n]).await?;
        total += n as u64;
    }
    dst.flush().await?;
    Ok(total)
}
