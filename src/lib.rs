/*!
# KDC Protocol

A key distribution center protocol: a trusted center runs a Diffie-Hellman
exchange with each of two parties, then uses a small Feistel block cipher to
carry a freshly minted shared key from one party to the other.

## Overview

This library provides:

- A simplified DES block cipher over 8-bit units with a 10-bit key
- Diffie-Hellman over small integer parameters (float or exact exponentiation)
- Session key derivation and XOR combination of the two session keys
- Explicit state machines for the center and for both parties
- UDP and in-memory transports behind a single `Transport` trait
- A messaging loop between the parties once they share a key

The cipher exists to be reproducible, not secure: 8-bit blocks, a 10-bit key
and two rounds offer no real protection.
*/

// Core protocol components
pub mod core;

// Protocol implementation
pub mod protocol;

// Re-export commonly used types for convenience
pub use crate::core::config::{CenterConfig, PartyConfig, PartyEndpoint};
pub use crate::core::constants::{DEFAULT_HOST, MAX_DATAGRAM_SIZE, ports};
pub use crate::core::crypto::{
    BlockCipher, DhParameters, ExponentiationMode, KeyExchange, RawSecret, SessionKey,
    SharedSessionKey, SubkeyPair,
};
pub use crate::core::error::{Error, ParseError, Result};
pub use crate::core::message::MessageKind;
pub use crate::core::session::{CenterPhase, PartyPhase, PartyRole};

// Re-export protocol components
pub use crate::protocol::center::{CenterOutcome, KeyDistributionCenter, PartySlot};
pub use crate::protocol::party::{MessagingStats, PairKeySource, Party};
pub use crate::protocol::console::{ScriptedOperator, StdinOperator};
pub use crate::protocol::transport::{Link, MemoryNetwork, MemoryTransport, UdpTransport};

// Re-export shared traits
pub use crate::protocol::shared::traits::{Operator, OperatorInput, Transport};
