//! Datagram transports and the error policy wrapped around them.

pub mod link;
pub mod memory;
pub mod udp;

pub use link::Link;
pub use memory::{MemoryNetwork, MemoryTransport};
pub use udp::UdpTransport;
