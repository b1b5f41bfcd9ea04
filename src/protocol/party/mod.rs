//! Party side of the KDC protocol.
//!
//! A party agrees a session key with the center, submits its pair key and
//! ends up holding the shared key, either directly from the center (the
//! initiator) or relayed through the initiator (the responder). After that
//! the two parties chat over the shared key.

// Establishment state machine
pub mod endpoint;

// Messaging loop
pub mod messaging;

pub use endpoint::{PairKeySource, Party};
pub use messaging::MessagingStats;
