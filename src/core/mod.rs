//! Core components for the KDC protocol.
//!
//! This module contains the fundamental building blocks of the protocol,
//! including the block cipher, the key exchange, payload formats, phase
//! state machines, configuration and error handling.

// Export cryptographic functionality
pub mod crypto;

// Export payload handling
pub mod message;

// Export protocol phases
pub mod session;

// Configuration files
pub mod config;

// Protocol constants
pub mod constants;

// Error handling
pub mod error;

// Re-exports for convenience
pub use self::config::{CenterConfig, PartyConfig, PartyEndpoint};
pub use self::error::{Error, ParseError, Result};
pub use self::message::MessageKind;
pub use self::session::{CenterPhase, PartyPhase, PartyRole};
