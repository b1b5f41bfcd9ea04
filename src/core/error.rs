/*!
Error handling for the KDC protocol.

Setup errors are fatal to the process, transport errors are logged and
swallowed by [`crate::protocol::transport::Link`], and parse errors bubble up
to whoever is driving the state machine.
*/

use std::io;
use std::fmt;
use thiserror::Error;

/// Result type for the KDC protocol
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the KDC protocol
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Setup failed (socket bind, key file, configuration)
    #[error("Setup failed: {0}")]
    Setup(String),

    /// A payload could not be parsed into the expected value
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Orchestrator driven out of order
    #[error("Invalid state: expected {expected}, but was {actual}")]
    InvalidState {
        expected: String,
        actual: String,
    },

    /// Configuration rejected
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Ways a protocol payload can fail to parse
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Expected a decimal integer (public value, shared key, timestamp)
    #[error("expected a decimal integer for {what}, got {input:?}")]
    NotDecimal {
        what: &'static str,
        input: String,
    },

    /// Expected a hexadecimal private key
    #[error("expected a hex key, got {input:?}")]
    NotHex {
        input: String,
    },

    /// Key parameter file did not contain `P G`
    #[error("malformed key parameters: {0}")]
    KeyParameters(String),
}

impl ParseError {
    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::NotDecimal { .. } => "decimal",
            ParseError::NotHex { .. } => "hex",
            ParseError::KeyParameters(_) => "key-parameters",
        }
    }
}

/// Error context for adding more information to errors
#[derive(Debug)]
pub struct ErrorContext {
    /// The error that occurred
    pub error: Error,
    /// Additional context about the error
    pub context: String,
    /// File where the error occurred
    pub file: &'static str,
    /// Line where the error occurred
    pub line: u32,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (at {}:{}) - {}",
            self.error, self.file, self.line, self.context
        )
    }
}

impl std::error::Error for ErrorContext {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Add context to an error
#[macro_export]
macro_rules! with_context {
    ($error:expr, $context:expr) => {
        $crate::core::error::ErrorContext {
            error: $error,
            context: $context.to_string(),
            file: file!(),
            line: line!(),
        }
    };
}

/// Create a setup error
#[macro_export]
macro_rules! setup_err {
    ($msg:expr) => {
        Err($crate::core::error::Error::Setup($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        Err($crate::core::error::Error::Setup(format!($fmt, $($arg)*)))
    };
}

/// Create a parse error
#[macro_export]
macro_rules! parse_err {
    ($err:expr) => {
        Err($crate::core::error::Error::Parse($err))
    };
}

/// Create an invalid state error
#[macro_export]
macro_rules! invalid_state_err {
    ($expected:expr, $actual:expr) => {
        Err($crate::core::error::Error::InvalidState {
            expected: $expected.to_string(),
            actual: $actual.to_string(),
        })
    };
}

/// Convert from Error to io::Error (for compatibility)
impl From<Error> for io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Io(io_error) => io_error,
            Error::Setup(msg) => io::Error::new(io::ErrorKind::AddrNotAvailable, msg),
            Error::Parse(err) => io::Error::new(io::ErrorKind::InvalidData, err.to_string()),
            Error::InvalidState { expected, actual } => io::Error::new(
                io::ErrorKind::Other,
                format!("Invalid state: expected {}, but was {}", expected, actual),
            ),
            Error::Config(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            Error::Internal(msg) => io::Error::new(io::ErrorKind::Other, msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Setup("bind 127.0.0.1:5000".to_string());
        assert_eq!(format!("{}", err), "Setup failed: bind 127.0.0.1:5000");

        let err = Error::Parse(ParseError::NotHex { input: "zz".into() });
        assert_eq!(format!("{}", err), "Parse error: expected a hex key, got \"zz\"");

        let err = Error::InvalidState {
            expected: "DistributeSharedKey".into(),
            actual: "Done".into(),
        };
        assert!(format!("{}", err).contains("Done"));
    }

    #[test]
    fn test_error_context() {
        let err = Error::Setup("Test error".to_string());
        let ctx = with_context!(err, "Additional context");

        assert!(format!("{}", ctx).contains("Setup failed: Test error"));
        assert!(format!("{}", ctx).contains("Additional context"));
        assert!(format!("{}", ctx).contains(file!()));
    }

    #[test]
    fn test_io_error_conversion() {
        let err = Error::Parse(ParseError::NotDecimal {
            what: "public value",
            input: "abc".into(),
        });
        let io_err = io::Error::from(err);

        assert_eq!(io_err.kind(), io::ErrorKind::InvalidData);
        assert!(format!("{}", io_err).contains("abc"));
    }

    #[test]
    fn test_parse_error_kind() {
        assert_eq!(ParseError::NotHex { input: String::new() }.kind(), "hex");
        assert_eq!(ParseError::KeyParameters("x".into()).kind(), "key-parameters");
    }
}
