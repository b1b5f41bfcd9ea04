/*!
In-process transport.

A [`MemoryNetwork`] holds one inbox per port. Transports created from the
same network can reach each other across threads, which lets a whole protocol
run (center and both parties) execute inside one test without sockets.
*/

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::core::error::{Error, Result};
use crate::protocol::shared::traits::Transport;

#[derive(Debug, Default)]
struct Inboxes {
    queues: HashMap<u16, VecDeque<Bytes>>,
}

/// Shared switchboard of per-port inboxes
#[derive(Debug, Clone, Default)]
pub struct MemoryNetwork {
    inner: Arc<(Mutex<Inboxes>, Condvar)>,
}

impl MemoryNetwork {
    /// Create an empty network
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a transport on `port`
    pub fn bind(&self, port: u16) -> MemoryTransport {
        let (lock, _) = &*self.inner;
        if let Ok(mut inboxes) = lock.lock() {
            inboxes.queues.entry(port).or_default();
        }
        MemoryTransport {
            network: self.clone(),
            port,
        }
    }

    /// Deliver a datagram to `port` (dropped if nothing is bound there)
    pub fn deliver(&self, port: u16, payload: Bytes) -> Result<()> {
        let (lock, signal) = &*self.inner;
        let mut inboxes = lock
            .lock()
            .map_err(|_| Error::Internal("memory network poisoned".into()))?;
        if let Some(queue) = inboxes.queues.get_mut(&port) {
            queue.push_back(payload);
            signal.notify_all();
        }
        Ok(())
    }

    /// Datagrams waiting for `port`
    pub fn pending(&self, port: u16) -> usize {
        let (lock, _) = &*self.inner;
        lock.lock()
            .map(|inboxes| inboxes.queues.get(&port).map_or(0, VecDeque::len))
            .unwrap_or(0)
    }

    fn take(&self, port: u16, deadline: Option<Instant>) -> Result<Option<Bytes>> {
        let (lock, signal) = &*self.inner;
        let mut inboxes = lock
            .lock()
            .map_err(|_| Error::Internal("memory network poisoned".into()))?;

        loop {
            if let Some(datagram) = inboxes.queues.get_mut(&port).and_then(VecDeque::pop_front) {
                return Ok(Some(datagram));
            }

            inboxes = match deadline {
                None => signal
                    .wait(inboxes)
                    .map_err(|_| Error::Internal("memory network poisoned".into()))?,
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(None);
                    }
                    signal
                        .wait_timeout(inboxes, deadline - now)
                        .map_err(|_| Error::Internal("memory network poisoned".into()))?
                        .0
                }
            };
        }
    }
}

/// Transport bound to one port of a [`MemoryNetwork`]
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    network: MemoryNetwork,
    port: u16,
}

impl MemoryTransport {
    /// The network this transport belongs to
    pub fn network(&self) -> &MemoryNetwork {
        &self.network
    }
}

impl Transport for MemoryTransport {
    fn send_to(&mut self, port: u16, payload: &[u8]) -> Result<()> {
        self.network.deliver(port, Bytes::copy_from_slice(payload))
    }

    fn receive(&mut self) -> Result<Bytes> {
        self.network
            .take(self.port, None)?
            .ok_or_else(|| Error::Internal("blocking receive returned nothing".into()))
    }

    fn receive_timeout(&mut self, timeout: Duration) -> Result<Option<Bytes>> {
        self.network.take(self.port, Some(Instant::now() + timeout))
    }

    fn local_port(&self) -> u16 {
        self.port
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_delivery_in_order() {
        let network = MemoryNetwork::new();
        let mut a = network.bind(1);
        let mut b = network.bind(2);

        a.send_to(2, b"first").unwrap();
        a.send_to(2, b"second").unwrap();
        assert_eq!(network.pending(2), 2);

        assert_eq!(&b.receive().unwrap()[..], b"first");
        assert_eq!(&b.receive().unwrap()[..], b"second");
        assert_eq!(network.pending(2), 0);
    }

    #[test]
    fn test_unbound_port_drops() {
        let network = MemoryNetwork::new();
        let mut a = network.bind(1);
        a.send_to(9, b"lost").unwrap();
        assert_eq!(network.pending(9), 0);
    }

    #[test]
    fn test_receive_timeout_waits_full_duration() {
        let network = MemoryNetwork::new();
        let mut a = network.bind(1);

        let started = Instant::now();
        assert!(a.receive_timeout(Duration::from_millis(20)).unwrap().is_none());
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_blocking_receive_across_threads() {
        let network = MemoryNetwork::new();
        let mut receiver = network.bind(2);
        let mut sender = network.bind(1);

        let handle = thread::spawn(move || receiver.receive().unwrap());
        thread::sleep(Duration::from_millis(10));
        sender.send_to(2, b"wake").unwrap();

        assert_eq!(&handle.join().unwrap()[..], b"wake");
    }
}
