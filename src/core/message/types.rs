/*!
Message kinds exchanged in a protocol run.

Nothing on the wire says which kind a datagram is; correctness depends on
both ends following the same step order. The kinds exist for logging.
*/

use std::fmt;

/// What a datagram carries at a given step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Decimal Diffie-Hellman public value (plaintext)
    PublicValue,
    /// Instructions from the center, encrypted under the session key
    Prompt,
    /// Pair key chosen by a party, encrypted under the session key
    PairKey,
    /// Shared key, encrypted under a party's pair key
    SharedKey,
    /// Timestamp, encrypted under party B's pair key
    Timestamp,
    /// Chat message, encrypted under the shared key
    Chat,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::PublicValue => write!(f, "PublicValue"),
            MessageKind::Prompt => write!(f, "Prompt"),
            MessageKind::PairKey => write!(f, "PairKey"),
            MessageKind::SharedKey => write!(f, "SharedKey"),
            MessageKind::Timestamp => write!(f, "Timestamp"),
            MessageKind::Chat => write!(f, "Chat"),
        }
    }
}

/// Prompt the center sends to party A
pub fn initiator_prompt(initiator: &str, responder: &str) -> String {
    format!(
        "Hello {},provide secret key you wish to pair with {} to start communication with him (3-digit hex):",
        initiator, responder
    )
}

/// Prompt the center sends to party B
pub fn responder_prompt(responder: &str, initiator: &str) -> String {
    format!(
        "Hello {}, {} wants to communicate. Please input the secret key you wish to use (3-digit hex):",
        responder, initiator
    )
}
