//! Byte channel abstraction the session drives.
//!
//! The session owns exactly one channel for its whole lifetime and never
//! shares it; every method blocks until it completes or the channel's
//! configured timeout elapses. `corus-client` provides the production
//! TCP implementation; tests provide an in-memory one.

use crate::error::CommunicationError;

/// A blocking byte-stream transport, bound by a per-call timeout.
///
/// Implementations are not required to be `Send`/`Sync`; a session is used
/// from a single thread at a time.
pub trait ByteChannel {
    /// Establishes the underlying connection.
    fn connect(&mut self) -> Result<(), CommunicationError>;

    /// Tears down the underlying connection. Idempotent.
    fn disconnect(&mut self) -> Result<(), CommunicationError>;

    /// Writes `data` in full.
    fn send(&mut self, data: &[u8]) -> Result<(), CommunicationError>;

    /// Reads exactly `n` bytes, blocking until they arrive or the timeout
    /// elapses.
    fn recv(&mut self, n: usize) -> Result<Vec<u8>, CommunicationError>;

    /// Reads bytes one at a time until a byte equal to `start` has been
    /// seen, then continues accumulating (including `start`) until a byte
    /// equal to `end` is read. Used for the sign-on identification line,
    /// which is framed by `/` and `\n` rather than by a length prefix.
    fn recv_until(&mut self, start: u8, end: u8) -> Result<Vec<u8>, CommunicationError>;
}

#[cfg(test)]
pub(crate) mod tests_support {
    use std::collections::VecDeque;
    use std::time::Duration;

    use super::ByteChannel;
    use crate::error::CommunicationError;

    /// A scripted, in-memory channel for unit tests: queues of bytes the
    /// "device" sends back, and a record of what was sent to it.
    #[derive(Debug, Default)]
    pub struct MockChannel {
        pub inbound: VecDeque<u8>,
        pub outbound: Vec<u8>,
        pub sent_messages: Vec<Vec<u8>>,
    }

    impl MockChannel {
        pub fn with_inbound(bytes: &[u8]) -> Self {
            Self { inbound: bytes.iter().copied().collect(), ..Self::default() }
        }

        pub fn push_inbound(&mut self, bytes: &[u8]) {
            self.inbound.extend(bytes.iter().copied());
        }
    }

    impl ByteChannel for MockChannel {
        fn connect(&mut self) -> Result<(), CommunicationError> {
            Ok(())
        }

        fn disconnect(&mut self) -> Result<(), CommunicationError> {
            Ok(())
        }

        fn send(&mut self, data: &[u8]) -> Result<(), CommunicationError> {
            self.outbound.extend_from_slice(data);
            self.sent_messages.push(data.to_vec());
            Ok(())
        }

        fn recv(&mut self, n: usize) -> Result<Vec<u8>, CommunicationError> {
            if self.inbound.len() < n {
                return Err(CommunicationError::Timeout { elapsed: Duration::from_secs(0) });
            }
            Ok((0..n).map(|_| self.inbound.pop_front().expect("checked above")).collect())
        }

        fn recv_until(&mut self, start: u8, end: u8) -> Result<Vec<u8>, CommunicationError> {
            let mut out = Vec::new();
            let mut started = false;
            loop {
                let Some(b) = self.inbound.pop_front() else {
                    return Err(CommunicationError::Timeout { elapsed: Duration::from_secs(0) });
                };
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
}
