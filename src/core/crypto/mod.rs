/*!
Cryptographic components for the KDC protocol.

The block cipher used for every encrypted payload, the Diffie-Hellman round
between the center and each party, and the mapping from raw secrets to
session keys.
*/

// Simplified DES
pub mod cipher;

// Diffie-Hellman
pub mod key_exchange;

// Raw secret -> session key
pub mod derivation;

pub use cipher::{BlockCipher, SubkeyPair};
pub use derivation::{SessionKey, SharedSessionKey};
pub use key_exchange::{DhParameters, ExponentiationMode, KeyExchange, RawSecret};
