/*!
Payload formats for the KDC protocol.

Every payload is ASCII text. Public values, the shared key and the timestamp
are decimal integers; a party's pair key is three hex digits. There is no
header or length prefix: the datagram boundary is the message boundary.
*/

use bytes::Bytes;

use crate::core::error::{ParseError, Result};
use crate::parse_err;

/// Encode an integer as its decimal ASCII representation.
pub fn encode_decimal<T: ToString>(value: T) -> Bytes {
    Bytes::from(value.to_string())
}

/// Parse a decimal integer, ignoring surrounding whitespace.
///
/// `what` names the value in the error.
pub fn parse_decimal<T: std::str::FromStr>(payload: &[u8], what: &'static str) -> Result<T> {
    let text = String::from_utf8_lossy(payload);
    match text.trim().parse::<T>() {
        Ok(value) => Ok(value),
        Err(_) => parse_err!(ParseError::NotDecimal {
            what,
            input: text.into_owned(),
        }),
    }
}

/// Parse a private pair key written as hex digits (`"1a3"`, `"0x2D7"`).
pub fn parse_hex_key(payload: &[u8]) -> Result<u16> {
    let text = String::from_utf8_lossy(payload);
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    match u16::from_str_radix(digits, 16) {
        Ok(value) if !digits.is_empty() => Ok(value),
        _ => parse_err!(ParseError::NotHex {
            input: text.into_owned(),
        }),
    }
}

/// Format a pair key the way an operator would type it.
pub fn format_hex_key(key: u16) -> String {
    format!("{:03x}", key)
}
