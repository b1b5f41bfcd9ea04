/*!
Session key derivation.

A raw Diffie-Hellman secret is truncated to its ten least significant bits,
which are then inverted. The result keys a [`BlockCipher`].
*/

use std::fmt;

use crate::core::constants::keys::SESSION_KEY_MASK;
use crate::core::crypto::cipher::BlockCipher;
use crate::core::crypto::key_exchange::RawSecret;

/// 10-bit key shared between the center and one party
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey(u16);

impl SessionKey {
    /// Derive a session key from a raw secret.
    ///
    /// Total over all inputs; negative secrets are masked in two's complement.
    pub fn derive(raw: RawSecret) -> Self {
        let mask = i64::from(SESSION_KEY_MASK);
        Self(((raw & mask) ^ mask) as u16)
    }

    /// The key value (always below 1024)
    pub fn value(self) -> u16 {
        self.0
    }

    /// Cipher keyed with this session key
    pub fn cipher(self) -> BlockCipher {
        BlockCipher::new(self.0)
    }

    /// Combine two pairwise keys into the key the parties will share.
    pub fn combine(self, other: SessionKey) -> SharedSessionKey {
        SharedSessionKey(self.0 ^ other.0)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key minted by the center for the two parties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SharedSessionKey(u16);

impl SharedSessionKey {
    /// Wrap a key received from the wire
    pub fn from_value(value: u16) -> Self {
        Self(value)
    }

    /// The key value
    pub fn value(self) -> u16 {
        self.0
    }

    /// Cipher keyed with this shared key
    pub fn cipher(self) -> BlockCipher {
        BlockCipher::new(self.0)
    }
}

impl fmt::Display for SharedSessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `(raw & 0x3FF) ^ 0x3FF` as a plain integer
pub fn derive(raw: RawSecret) -> u16 {
    SessionKey::derive(raw).value()
}
