//! Protocol implementation for the KDC.
//!
//! This module contains the two orchestrators (center and party) together
//! with the transports and operator consoles they run on.

// Key distribution center
pub mod center;

// Party implementation
pub mod party;

// Shared implementation
pub mod shared;

// Datagram transports
pub mod transport;

// Operator consoles
pub mod console;

// Re-export for convenience
pub use center::{CenterOutcome, KeyDistributionCenter, PartySlot};
pub use console::{ScriptedOperator, StdinOperator};
pub use party::{MessagingStats, PairKeySource, Party};
pub use transport::{Link, MemoryNetwork, MemoryTransport, UdpTransport};
