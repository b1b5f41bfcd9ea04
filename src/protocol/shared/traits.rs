/*!
Seams between the protocol and the outside world.

The orchestrators only see datagrams through [`Transport`] and the human at
the keyboard through [`Operator`], so both can be replaced in tests.
*/

use std::time::Duration;

use bytes::Bytes;

use crate::core::error::Result;

/// Unreliable datagram transport addressed by port on a fixed host
pub trait Transport {
    /// Send one datagram to `port`
    fn send_to(&mut self, port: u16, payload: &[u8]) -> Result<()>;

    /// Block until a datagram arrives
    fn receive(&mut self) -> Result<Bytes>;

    /// Wait at most `timeout` for a datagram
    fn receive_timeout(&mut self, timeout: Duration) -> Result<Option<Bytes>>;

    /// Port this transport is reachable on
    fn local_port(&self) -> u16;
}

/// Result of polling the operator for a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorInput {
    /// A complete line (without the trailing newline)
    Line(String),
    /// Nothing typed yet
    Pending,
    /// Input closed; no more lines will come
    Closed,
}

/// The person driving a party process
pub trait Operator {
    /// Block for the next line; `None` once input is closed
    fn read_line(&mut self) -> Result<Option<String>>;

    /// Wait at most `timeout` for a line
    fn poll_line(&mut self, timeout: Duration) -> Result<OperatorInput>;

    /// Show text to the operator
    fn display(&mut self, text: &str);
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send_to(&mut self, port: u16, payload: &[u8]) -> Result<()> {
        (**self).send_to(port, payload)
    }

    fn receive(&mut self) -> Result<Bytes> {
        (**self).receive()
    }

    fn receive_timeout(&mut self, timeout: Duration) -> Result<Option<Bytes>> {
        (**self).receive_timeout(timeout)
    }

    fn local_port(&self) -> u16 {
        (**self).local_port()
    }
}
