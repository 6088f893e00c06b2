//! TCP implementation of [`corus_core::channel::ByteChannel`].

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use corus_core::channel::ByteChannel;
use corus_core::error::CommunicationError;

/// A blocking TCP channel. Connects lazily: [`TcpChannel::new`] only
/// records the address, and [`ByteChannel::connect`] performs the actual
/// dial so a [`corus_core::Session`] controls exactly when the socket
/// opens.
pub struct TcpChannel {
    address: SocketAddr,
    timeout: Duration,
    stream: Option<TcpStream>,
}

impl TcpChannel {
    /// Creates a channel for `address`, with `timeout` applied to every
    /// read and write.
    #[must_use]
    pub const fn new(address: SocketAddr, timeout: Duration) -> Self {
        Self { address, timeout, stream: None }
    }

    fn stream(&mut self) -> Result<&mut TcpStream, CommunicationError> {
        self.stream.as_mut().ok_or_else(|| {
            CommunicationError::Io("channel used before connect()".to_string())
        })
    }
}

impl ByteChannel for TcpChannel {
    fn connect(&mut self) -> Result<(), CommunicationError> {
        tracing::debug!("connecting to {}", self.address);
        let stream = TcpStream::connect(self.address)
            .map_err(|e| CommunicationError::Io(e.to_string()))?;
        stream
            .set_read_timeout(Some(self.timeout))
            .map_err(|e| CommunicationError::Io(e.to_string()))?;
        stream
            .set_write_timeout(Some(self.timeout))
            .map_err(|e| CommunicationError::Io(e.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), CommunicationError> {
        if let Some(stream) = self.stream.take() {
            // shutdown errors (already-closed peer) are not actionable.
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> Result<(), CommunicationError> {
        tracing::trace!("sending {} bytes", data.len());
        self.stream()?.write_all(data).map_err(|e| CommunicationError::Io(e.to_string()))
    }

    fn recv(&mut self, n: usize) -> Result<Vec<u8>, CommunicationError> {
        let mut buf = vec![0u8; n];
        self.stream()?
            .read_exact(&mut buf)
            .map_err(|e| CommunicationError::Io(e.to_string()))?;
        tracing::trace!("received {} bytes", n);
        Ok(buf)
    }

    fn recv_until(&mut self, start: u8, end: u8) -> Result<Vec<u8>, CommunicationError> {
        let stream = self.stream()?;
        let mut out = Vec::new();
        let mut started = false;
        let mut byte = [0u8; 1];
        loop {
            stream.read_exact(&mut byte).map_err(|e| CommunicationError::Io(e.to_string()))?;
            let b = byte[0];
            if !started {
                if b == start {
                    started = true;
                    out.push(b);
                }
                continue;
            }
            out.push(b);
            if b == end {
                return Ok(out);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    #[test]
    fn connect_and_round_trip_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 5];
            stream.read_exact(&mut buf).unwrap();
            stream.write_all(&buf).unwrap();
        });

        let mut channel = TcpChannel::new(addr, Duration::from_secs(5));
        channel.connect().unwrap();
        channel.send(b"hello").unwrap();
        let echoed = channel.recv(5).unwrap();
        assert_eq!(echoed, b"hello");
        channel.disconnect().unwrap();

        server.join().unwrap();
    }

    #[test]
    fn recv_before_connect_is_an_error() {
        let mut channel = TcpChannel::new("127.0.0.1:1".parse().unwrap(), Duration::from_secs(1));
        assert!(channel.recv(1).is_err());
    }
}
