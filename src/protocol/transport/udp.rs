/*!
UDP transport.

Each role binds one socket and addresses its peers by port on the same host.
Datagrams are read into a fixed buffer of [`MAX_DATAGRAM_SIZE`] bytes; the
payload is exactly what was received, zero bytes included.
*/

use std::io;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::core::constants::MAX_DATAGRAM_SIZE;
use crate::core::error::Result;
use crate::protocol::shared::traits::Transport;
use crate::setup_err;

/// Blocking UDP socket bound to one port
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    host: IpAddr,
    local_addr: SocketAddr,
}

impl UdpTransport {
    /// Bind to `addr`. Failure is a setup error.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = match UdpSocket::bind(addr) {
            Ok(socket) => socket,
            Err(e) => return setup_err!("bind {} failed: {}", addr, e),
        };
        let local_addr = socket.local_addr()?;

        debug!("Bound UDP socket on {}", local_addr);
        Ok(Self {
            socket,
            host: addr.ip(),
            local_addr,
        })
    }

    /// Local address of the socket
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn read_datagram(&self) -> io::Result<Bytes> {
        let mut buffer = BytesMut::zeroed(MAX_DATAGRAM_SIZE);
        let (len, from) = self.socket.recv_from(&mut buffer)?;
        buffer.truncate(len);

        debug!("Received {} bytes from {}", len, from);
        Ok(buffer.freeze())
    }
}

impl Transport for UdpTransport {
    fn send_to(&mut self, port: u16, payload: &[u8]) -> Result<()> {
        let target = SocketAddr::new(self.host, port);
        let sent = self.socket.send_to(payload, target)?;

        debug!("Sent {} bytes to {}", sent, target);
        Ok(())
    }

    fn receive(&mut self) -> Result<Bytes> {
        self.socket.set_read_timeout(None)?;
        Ok(self.read_datagram()?)
    }

    fn receive_timeout(&mut self, timeout: Duration) -> Result<Option<Bytes>> {
        // a zero read timeout is rejected by the OS layer
        let timeout = timeout.max(Duration::from_millis(1));
        self.socket.set_read_timeout(Some(timeout))?;

        match self.read_datagram() {
            Ok(datagram) => Ok(Some(datagram)),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn local_port(&self) -> u16 {
        self.local_addr.port()
    }
}
