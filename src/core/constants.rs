/*!
Constants for the KDC protocol.

Ports, buffer limits, default keys and timeouts shared by the center and
the parties.
*/

use std::time::Duration;

/// Loopback host every role binds to and sends to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Maximum datagram size read from the transport
pub const MAX_DATAGRAM_SIZE: usize = 1024;

/// Well-known ports per role
pub mod ports {
    /// Key distribution center
    pub const CENTER: u16 = 5000;

    /// Party A (the initiator)
    pub const PARTY_A: u16 = 5001;

    /// Party B (the responder)
    pub const PARTY_B: u16 = 5002;
}

/// Key material defaults
pub mod keys {
    /// Block cipher master key when none is given (0b1011010111)
    pub const DEFAULT_CIPHER_KEY: u16 = 0x2D7;

    /// Mask selecting the ten bits a session key keeps
    pub const SESSION_KEY_MASK: u16 = 0x3FF;

    /// Largest private pair key a party may submit (three hex digits)
    pub const MAX_PAIR_KEY: u16 = 0xFFF;

    /// Center's Diffie-Hellman private exponent
    pub const CENTER_PRIVATE_EXPONENT: i64 = 9;

    /// Party's Diffie-Hellman private exponent
    pub const PARTY_PRIVATE_EXPONENT: i64 = 3;
}

/// Default party names
pub mod names {
    /// Party A
    pub const PARTY_A: &str = "Thor";

    /// Party B
    pub const PARTY_B: &str = "Iron Man";
}

/// Timing defaults
pub mod timing {
    use super::Duration;

    /// Idle window of the messaging loop before "no activity" is logged
    pub const IDLE_TIMEOUT: Duration = Duration::new(60, 500_000);

    /// Granularity at which the messaging loop alternates between sources
    pub const POLL_SLICE: Duration = Duration::from_millis(50);

    /// Age after which a relayed timestamp is reported as stale
    pub const MAX_TIMESTAMP_AGE: Duration = Duration::from_secs(120);
}
