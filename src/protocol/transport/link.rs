/*!
Log-and-continue wrapper around a [`Transport`].

Runtime send and receive failures never stop a protocol run. A failed send is
logged and forgotten; a failed blocking receive is logged and yields the
previously received datagram again, so callers may act on stale data.
*/

use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, error};

use crate::core::message::MessageKind;
use crate::protocol::shared::traits::Transport;

/// Transport plus the last datagram it delivered
#[derive(Debug)]
pub struct Link<T> {
    transport: T,
    last: Bytes,
}

impl<T: Transport> Link<T> {
    /// Wrap a transport
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            last: Bytes::new(),
        }
    }

    /// Send a datagram, logging any failure.
    pub fn send(&mut self, port: u16, payload: &[u8], kind: MessageKind) {
        match self.transport.send_to(port, payload) {
            Ok(()) => debug!("Sent {} ({} bytes) to port {}", kind, payload.len(), port),
            Err(e) => error!("Sending {} to port {} failed: {}", kind, port, e),
        }
    }

    /// Block for a datagram. On failure the previous datagram is returned.
    pub fn receive(&mut self, kind: MessageKind) -> Bytes {
        match self.transport.receive() {
            Ok(datagram) => {
                debug!("Received {} ({} bytes)", kind, datagram.len());
                self.last = datagram.clone();
                datagram
            }
            Err(e) => {
                error!("Receiving {} failed: {}", kind, e);
                self.last.clone()
            }
        }
    }

    /// Wait at most `timeout` for a datagram. Failures are logged and read as silence.
    pub fn receive_timeout(&mut self, timeout: Duration, kind: MessageKind) -> Option<Bytes> {
        match self.transport.receive_timeout(timeout) {
            Ok(Some(datagram)) => {
                debug!("Received {} ({} bytes)", kind, datagram.len());
                self.last = datagram.clone();
                Some(datagram)
            }
            Ok(None) => None,
            Err(e) => {
                error!("Receiving {} failed: {}", kind, e);
                None
            }
        }
    }

    /// Port of the underlying transport
    pub fn local_port(&self) -> u16 {
        self.transport.local_port()
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Unwrap the underlying transport
    pub fn into_inner(self) -> T {
        self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{Error, Result};
    use std::collections::VecDeque;
    use std::io;

    /// Replays a script of receive outcomes and refuses every send
    struct Flaky {
        script: VecDeque<Result<Bytes>>,
        send_attempts: usize,
    }

    impl Transport for Flaky {
        fn send_to(&mut self, _port: u16, _payload: &[u8]) -> Result<()> {
            self.send_attempts += 1;
            Err(Error::Io(io::Error::new(io::ErrorKind::ConnectionRefused, "refused")))
        }

        fn receive(&mut self) -> Result<Bytes> {
            self.script
                .pop_front()
                .unwrap_or_else(|| Err(Error::Io(io::ErrorKind::BrokenPipe.into())))
        }

        fn receive_timeout(&mut self, _timeout: Duration) -> Result<Option<Bytes>> {
            self.receive().map(Some)
        }

        fn local_port(&self) -> u16 {
            7
        }
    }

    fn flaky(script: Vec<Result<Bytes>>) -> Link<Flaky> {
        Link::new(Flaky {
            script: script.into(),
            send_attempts: 0,
        })
    }

    #[test]
    fn test_failed_receive_returns_stale_datagram() {
        let mut link = flaky(vec![
            Ok(Bytes::from_static(b"11")),
            Err(Error::Io(io::ErrorKind::ConnectionReset.into())),
        ]);

        assert_eq!(&link.receive(MessageKind::PublicValue)[..], b"11");
        assert_eq!(&link.receive(MessageKind::PublicValue)[..], b"11");
    }

    #[test]
    fn test_failed_first_receive_is_empty() {
        let mut link = flaky(vec![]);
        assert!(link.receive(MessageKind::Prompt).is_empty());
    }

    #[test]
    fn test_failed_send_is_swallowed() {
        let mut link = flaky(vec![]);
        link.send(5000, b"10", MessageKind::PublicValue);
        link.send(5000, b"10", MessageKind::PublicValue);
        assert_eq!(link.transport().send_attempts, 2);
    }

    #[test]
    fn test_failed_timed_receive_is_silence() {
        let mut link = flaky(vec![Err(Error::Io(io::ErrorKind::ConnectionReset.into()))]);
        assert!(link.receive_timeout(Duration::from_millis(1), MessageKind::Chat).is_none());
        assert_eq!(link.local_port(), 7);
    }
}
