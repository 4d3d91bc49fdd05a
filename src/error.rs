//! Error types for the scpi-link library.

use std::convert::Infallible;

use thiserror::Error;

/// Boxed error produced by user supplied decoding hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for instrument operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Serial port error.
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The response could not be decoded into the requested type.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The device answered with bytes that are not valid text.
    #[error("invalid message: {0}")]
    InvalidMessage(#[from] std::str::Utf8Error),

    /// Operation timed out.
    #[error("operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Connection is not established.
    #[error("not connected")]
    NotConnected,

    /// The transport accepted fewer bytes than were handed to it.
    #[error("short write: {written} of {expected} bytes sent")]
    ShortWrite { expected: usize, written: usize },
}

/// Errors of the default integer decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IntDecodeError {
    /// The message is a number, but has a fractional part.
    #[error("value is not an integer")]
    NotAnInteger,

    /// The message is not a number at all.
    #[error("value is not a number")]
    NotANumber,

    /// The message is an integer that does not fit in an `i64`.
    #[error("value is not in the representable range")]
    NotInRange,
}

/// Errors of the default floating point decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DoubleDecodeError {
    /// The message is not a number.
    #[error("value is not a number")]
    NotANumber,

    /// The magnitude exceeds the largest finite SCPI value (9.9e37).
    #[error("value is not in the representable range")]
    NotInRange,
}

/// Errors of the default boolean decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BoolDecodeError {
    /// The message is not one of the accepted boolean spellings.
    #[error("value is not a boolean")]
    NotABoolean,
}

/// Errors of the raw byte decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ByteDecodeError {
    /// No bytes were received.
    #[error("no data received")]
    Empty,

    /// The response has an unexpected length.
    #[error("expected at most {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
}

/// Any failure produced while turning a response into a value.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Integer decoding failed.
    #[error(transparent)]
    Int(#[from] IntDecodeError),

    /// Floating point decoding failed.
    #[error(transparent)]
    Double(#[from] DoubleDecodeError),

    /// Boolean decoding failed.
    #[error(transparent)]
    Bool(#[from] BoolDecodeError),

    /// Byte decoding failed.
    #[error(transparent)]
    Bytes(#[from] ByteDecodeError),

    /// An installed override hook or a custom decoder failed.
    #[error("custom decoder failed: {0}")]
    Custom(BoxError),
}

impl From<Infallible> for DecodeError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

/// Result type alias for instrument operations.
pub type Result<T> = std::result::Result<T, Error>;
