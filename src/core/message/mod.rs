/*!
Message handling for the KDC protocol.

Payload encodings and the (unframed) message kinds of a protocol run.
*/

pub mod types;
pub mod format;

// Re-export commonly used items
pub use types::{MessageKind, initiator_prompt, responder_prompt};
pub use format::{encode_decimal, parse_decimal, parse_hex_key, format_hex_key};
