//! Key distribution center.
//!
//! The center runs one Diffie-Hellman exchange with each party, collects
//! their pair keys and hands party A everything both parties need to share
//! a session key.

// Center orchestrator
pub mod kdc;

pub use kdc::{CenterOutcome, KeyDistributionCenter, PartySlot};
