/*!
Shared cryptographic steps for the center and party implementations.

The Diffie-Hellman round is the same on both sides except for who speaks
first: a party opens with its public value, the center answers.
*/

use tracing::{debug, info};

use crate::core::{
    crypto::{BlockCipher, KeyExchange, SessionKey},
    error::Result,
    message::{MessageKind, encode_decimal, parse_decimal},
};
use crate::protocol::shared::traits::Transport;
use crate::protocol::transport::Link;

/// Send our public value to `port`, then wait for the peer's.
///
/// Used by the parties, which always speak first.
pub fn open_exchange<T: Transport>(
    link: &mut Link<T>,
    exchange: &KeyExchange,
    port: u16,
) -> Result<SessionKey> {
    let own = exchange.public_value();
    link.send(port, &encode_decimal(own), MessageKind::PublicValue);

    let reply = link.receive(MessageKind::PublicValue);
    let peer: i64 = parse_decimal(&reply, "public value")?;
    finish(exchange, own, peer)
}

/// Wait for the peer's public value, then answer with ours to `port`.
///
/// Used by the center. A malformed public value fails before anything is sent.
pub fn answer_exchange<T: Transport>(
    link: &mut Link<T>,
    exchange: &KeyExchange,
    port: u16,
) -> Result<SessionKey> {
    let request = link.receive(MessageKind::PublicValue);
    let peer: i64 = parse_decimal(&request, "public value")?;

    let own = exchange.public_value();
    link.send(port, &encode_decimal(own), MessageKind::PublicValue);
    finish(exchange, own, peer)
}

fn finish(exchange: &KeyExchange, own: i64, peer: i64) -> Result<SessionKey> {
    let raw = exchange.shared_secret(peer);
    let key = SessionKey::derive(raw);

    debug!("Exchange: own public {}, peer public {}, raw secret {}", own, peer, raw);
    info!("Session key established ({})", key);
    Ok(key)
}

/// Encrypt text for the wire
pub fn seal(cipher: &BlockCipher, text: &str) -> Vec<u8> {
    cipher.encrypt(text.as_bytes())
}

/// Decrypt a payload into text, replacing invalid UTF-8
pub fn open(cipher: &BlockCipher, payload: &[u8]) -> String {
    String::from_utf8_lossy(&cipher.decrypt(payload)).into_owned()
}
