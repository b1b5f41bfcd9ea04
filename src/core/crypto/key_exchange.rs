/*!
Diffie-Hellman exchange over small integer parameters.

By default public values and shared secrets use real-valued exponentiation
followed by truncation to a signed 64-bit integer and a remainder that keeps
the dividend's sign. For parameters whose powers fit in an `f64` mantissa this
agrees with textbook modular exponentiation; beyond that it does not, and
existing peers depend on the exact values it produces. [`ExponentiationMode::Exact`]
switches to integer square-and-multiply.
*/

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, ParseError, Result};
use crate::parse_err;

/// Raw shared secret before session key derivation
pub type RawSecret = i64;

/// How powers are reduced modulo P
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExponentiationMode {
    /// `trunc(pow(base, exp)) % P` through `f64`
    #[default]
    Float,
    /// Exact integer modular exponentiation
    Exact,
}

impl fmt::Display for ExponentiationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExponentiationMode::Float => write!(f, "float"),
            ExponentiationMode::Exact => write!(f, "exact"),
        }
    }
}

/// Public Diffie-Hellman parameters of one party
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhParameters {
    /// Modulus (prime in intent, never checked)
    pub modulus: i64,
    /// Generator (never checked)
    pub generator: i64,
}

impl DhParameters {
    /// Create parameters. Only a zero modulus is refused.
    pub fn new(modulus: i64, generator: i64) -> Result<Self> {
        if modulus == 0 {
            return Err(Error::Config("modulus must be non-zero".into()));
        }
        Ok(Self { modulus, generator })
    }

    /// Parse the `P G` key file format: two whitespace separated integers.
    pub fn parse(text: &str) -> Result<Self> {
        let mut fields = text.split_whitespace();
        let (Some(p), Some(g)) = (fields.next(), fields.next()) else {
            return parse_err!(ParseError::KeyParameters(format!(
                "expected `P G`, got {:?}",
                text.trim()
            )));
        };

        let modulus = p.parse::<i64>().map_err(|_| {
            ParseError::KeyParameters(format!("modulus {:?} is not an integer", p))
        })?;
        let generator = g.parse::<i64>().map_err(|_| {
            ParseError::KeyParameters(format!("generator {:?} is not an integer", g))
        })?;

        Self::new(modulus, generator)
    }

    /// Read parameters from a key file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Setup(format!("failed to open key file {}: {}", path.display(), e))
        })?;
        Self::parse(&text)
    }
}

/// One side of a Diffie-Hellman exchange
#[derive(Debug, Clone)]
pub struct KeyExchange {
    params: DhParameters,
    private_exponent: i64,
    mode: ExponentiationMode,
}

impl KeyExchange {
    /// Create an exchange with the default (float) exponentiation.
    pub fn new(params: DhParameters, private_exponent: i64) -> Self {
        Self::with_mode(params, private_exponent, ExponentiationMode::default())
    }

    /// Create an exchange with an explicit exponentiation mode.
    pub fn with_mode(params: DhParameters, private_exponent: i64, mode: ExponentiationMode) -> Self {
        Self {
            params,
            private_exponent,
            mode,
        }
    }

    /// The parameters in use
    pub fn params(&self) -> DhParameters {
        self.params
    }

    /// The exponentiation mode in use
    pub fn mode(&self) -> ExponentiationMode {
        self.mode
    }

    /// `G^e mod P`, the value sent to the peer.
    pub fn public_value(&self) -> i64 {
        self.power(self.params.generator)
    }

    /// `peer^e mod P`, the raw shared secret.
    pub fn shared_secret(&self, peer_public: i64) -> RawSecret {
        self.power(peer_public)
    }

    /// Both halves of one exchange round.
    pub fn compute_exchange(&self, peer_public: i64) -> (i64, RawSecret) {
        (self.public_value(), self.shared_secret(peer_public))
    }

    fn power(&self, base: i64) -> i64 {
        match self.mode {
            ExponentiationMode::Float => float_pow_mod(base, self.private_exponent, self.params.modulus),
            ExponentiationMode::Exact => exact_pow_mod(base, self.private_exponent, self.params.modulus),
        }
    }
}

/// `trunc(pow(base, exponent)) % modulus` evaluated through `f64`.
pub fn float_pow_mod(base: i64, exponent: i64, modulus: i64) -> i64 {
    let power = (base as f64).powf(exponent as f64);
    truncate_to_i64(power).wrapping_rem(modulus)
}

/// Truncating `f64 -> i64` conversion where every unrepresentable input
/// (overflow in either direction, NaN) becomes `i64::MIN`, as the x86
/// conversion instruction does.
fn truncate_to_i64(value: f64) -> i64 {
    // 2^63 is exactly representable; anything at or above it overflows
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if value.is_nan() || value >= LIMIT || value < -LIMIT {
        i64::MIN
    } else {
        value as i64
    }
}

/// Square-and-multiply modular exponentiation with a non-negative result.
///
/// Negative exponents are treated as zero.
pub fn exact_pow_mod(base: i64, exponent: i64, modulus: i64) -> i64 {
    let m = i128::from(modulus).abs();
    if m == 1 {
        return 0;
    }

    let mut result: i128 = 1;
    let mut b = i128::from(base).rem_euclid(m);
    let mut e = exponent.max(0) as u64;
    while e > 0 {
        if e & 1 == 1 {
            result = (result * b) % m;
        }
        b = (b * b) % m;
        e >>= 1;
    }
    result as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(p: i64, g: i64) -> DhParameters {
        DhParameters::new(p, g).unwrap()
    }

    #[test]
    fn test_small_exchange_agrees() {
        let center = KeyExchange::new(params(23, 5), 9);
        let party = KeyExchange::new(params(23, 5), 3);

        assert_eq!(center.public_value(), 11);
        assert_eq!(party.public_value(), 10);

        let center_secret = center.shared_secret(party.public_value());
        let party_secret = party.shared_secret(center.public_value());
        assert_eq!(center_secret, 20);
        assert_eq!(center_secret, party_secret);
    }

    #[test]
    fn test_float_overflow_truncates_to_min() {
        // 16807^9 does not fit in i64; truncation yields i64::MIN
        assert_eq!(float_pow_mod(16807, 9, 2147483647), -2);
        assert_eq!(float_pow_mod(123456, 3, 1000003), 298866);
    }

    #[test]
    fn test_exact_mode_differs_on_overflow() {
        let exact = exact_pow_mod(16807, 9, 2147483647);
        assert!(exact >= 0);
        assert_ne!(exact, -2);

        let kex = KeyExchange::with_mode(params(23, 5), 9, ExponentiationMode::Exact);
        assert_eq!(kex.public_value(), 11);
    }

    #[test]
    fn test_compute_exchange() {
        let kex = KeyExchange::new(params(23, 5), 3);
        assert_eq!(kex.compute_exchange(11), (10, 20));
    }

    #[test]
    fn test_parse_key_file() {
        assert_eq!(DhParameters::parse("23 5\n").unwrap(), params(23, 5));
        assert_eq!(DhParameters::parse("  353\n\t3 ").unwrap(), params(353, 3));
        assert!(matches!(
            DhParameters::parse("23"),
            Err(Error::Parse(ParseError::KeyParameters(_)))
        ));
        assert!(matches!(
            DhParameters::parse("p g"),
            Err(Error::Parse(ParseError::KeyParameters(_)))
        ));
        assert!(matches!(DhParameters::parse("0 5"), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_key_file_is_setup_error() {
        let result = DhParameters::load(Path::new("/nonexistent/kdc/keys.txt"));
        assert!(matches!(result, Err(Error::Setup(_))));
    }
}
