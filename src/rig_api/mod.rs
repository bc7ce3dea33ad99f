// sgminer-style rig API over TCP: one connection per command, plaintext request and response.
// The protocol has no framing; the rig writes its reply and closes.

pub mod parse;

use std::io;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpSocket, TcpStream};
use tokio::time::Instant;
use tracing::{instrument, trace};

use crate::config::{ReadMode, RigConfig};
use crate::error::ClientError;

/// Receive buffer used when the OS won't report SO_RCVBUF.
const DEFAULT_RECV_BUFFER: usize = 8 * 1024;

pub const CMD_GPU_COUNT: &str = "gpucount";
pub const CMD_VERSION: &str = "version";
pub const CMD_COIN: &str = "coin";

pub fn gpu_command(index: u32) -> String {
    format!("gpu|{}", index)
}

/// Per-call settings shared by every request in a sweep.
#[derive(Debug, Clone, Copy)]
pub struct RigClient {
    pub timeout: Duration,
    pub read_mode: ReadMode,
}

impl RigClient {
    pub fn new(timeout: Duration, read_mode: ReadMode) -> Self {
        Self { timeout, read_mode }
    }

    pub async fn send(&self, rig: &RigConfig, command: &str) -> Result<String, ClientError> {
        send(command, rig, self.timeout, self.read_mode).await
    }
}

/// Send `command` to `rig` and return the decoded response text.
///
/// Connecting is bounded by `timeout` (`ConnectTimeout`); the write and the read
/// each get the same bound again and surface as `Connection` with kind `TimedOut`.
/// The stream is dropped, and so closed, on every return path.
#[instrument(skip(rig, timeout, read_mode), fields(rig = %rig.endpoint()))]
pub async fn send(
    command: &str,
    rig: &RigConfig,
    timeout: Duration,
    read_mode: ReadMode,
) -> Result<String, ClientError> {
    let addr = rig.endpoint();
    let connection_error = |source: io::Error| ClientError::Connection {
        addr: addr.clone(),
        source,
    };

    let (mut stream, recv_buffer) =
        connect_within(&addr, timeout, connect(&rig.address, rig.port)).await?;

    match tokio::time::timeout(timeout, stream.write_all(command.as_bytes())).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(connection_error(e)),
        Err(_) => return Err(connection_error(timed_out("write"))),
    }

    let bytes = match read_mode {
        ReadMode::Single => read_once(&mut stream, recv_buffer, timeout).await,
        ReadMode::UntilClose => read_until_close(&mut stream, recv_buffer, timeout).await,
    }
    .map_err(connection_error)?;

    trace!(command, bytes = bytes.len(), "rig response");
    Ok(decode(&bytes))
}

/// Bound `connecting` by `timeout`: elapsing is `ConnectTimeout`, an I/O error is `Connection`.
async fn connect_within<F>(
    addr: &str,
    timeout: Duration,
    connecting: F,
) -> Result<(TcpStream, usize), ClientError>
where
    F: Future<Output = io::Result<(TcpStream, usize)>>,
{
    match tokio::time::timeout(timeout, connecting).await {
        Ok(Ok(c)) => Ok(c),
        Ok(Err(source)) => Err(ClientError::Connection {
            addr: addr.to_string(),
            source,
        }),
        Err(_) => Err(ClientError::ConnectTimeout {
            addr: addr.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

/// Resolve and connect, returning the stream and the socket's receive buffer size.
async fn connect(host: &str, port: u16) -> io::Result<(TcpStream, usize)> {
    let mut last_err = None;
    for addr in tokio::net::lookup_host((host, port)).await? {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        let recv_buffer = socket
            .recv_buffer_size()
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_RECV_BUFFER)
            .max(1);
        match socket.connect(addr).await {
            Ok(stream) => return Ok((stream, recv_buffer)),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, format!("no address for {}", host))
    }))
}

/// Exactly one read. A response longer than one segment comes back truncated.
async fn read_once(
    stream: &mut TcpStream,
    recv_buffer: usize,
    timeout: Duration,
) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; recv_buffer];
    let n = tokio::time::timeout(timeout, stream.read(&mut buf))
        .await
        .map_err(|_| timed_out("read"))??;
    buf.truncate(n);
    Ok(buf)
}

/// Read until EOF. If the deadline passes after some data arrived, keep what we have.
async fn read_until_close(
    stream: &mut TcpStream,
    recv_buffer: usize,
    timeout: Duration,
) -> io::Result<Vec<u8>> {
    let deadline = Instant::now() + timeout;
    let mut buf = vec![0u8; recv_buffer];
    let mut out = Vec::new();
    loop {
        match tokio::time::timeout_at(deadline, stream.read(&mut buf)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => out.extend_from_slice(&buf[..n]),
            Ok(Err(e)) => return Err(e),
            Err(_) if !out.is_empty() => break,
            Err(_) => return Err(timed_out("read")),
        }
    }
    Ok(out)
}

fn timed_out(phase: &str) -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, format!("{} timed out", phase))
}

/// Responses are ASCII, usually NUL-terminated.
fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\0')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_strips_trailing_nul() {
        assert_eq!(decode(b"GPUS=2|\0"), "GPUS=2|");
        assert_eq!(decode(b""), "");
    }

    #[tokio::test]
    async fn connect_that_never_completes_is_connect_timeout() {
        let started = std::time::Instant::now();
        let err = connect_within(
            "10.0.0.1:4028",
            Duration::from_millis(50),
            std::future::pending(),
        )
        .await
        .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(2));
        match err {
            ClientError::ConnectTimeout { addr, timeout_ms } => {
                assert_eq!(addr, "10.0.0.1:4028");
                assert_eq!(timeout_ms, 50);
            }
            other => panic!("expected connect timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn failed_connect_is_connection_error() {
        let refused = async {
            Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
        };
        let err = connect_within("127.0.0.1:1", Duration::from_millis(50), refused)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Connection { ref source, .. }
                if source.kind() == io::ErrorKind::ConnectionRefused
        ));
    }

    #[test]
    fn gpu_command_format() {
        assert_eq!(gpu_command(0), "gpu|0");
        assert_eq!(gpu_command(11), "gpu|11");
    }
}
