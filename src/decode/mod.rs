//! Decoding of instrument responses into typed values.
//!
//! Every supported scalar type has a default decoder:
//!
//! | Type        | Decoder              | Errors                |
//! |-------------|----------------------|-----------------------|
//! | `String`    | [`StringDecoder`]    | none                  |
//! | `i64`       | [`IntDecoder`]       | [`IntDecodeError`]    |
//! | `f64`       | [`DoubleDecoder`]    | [`DoubleDecodeError`] |
//! | `bool`      | [`BoolDecoder`]      | [`BoolDecodeError`]   |
//! | `Option<T>` | [`OptionalDecoder`]  | those of `T`          |
//!
//! Any other decoder can be supplied per call by implementing
//! [`MessageDecoder`], and the default for a scalar type can be replaced
//! through a [`DecoderRegistry`].
//!
//! [`IntDecodeError`]: crate::error::IntDecodeError
//! [`DoubleDecodeError`]: crate::error::DoubleDecodeError
//! [`BoolDecodeError`]: crate::error::BoolDecodeError

pub mod boolean;
pub mod double;
pub mod integer;
pub mod optional;
pub mod raw;
pub mod registry;
pub mod string;

pub use boolean::BoolDecoder;
pub use double::{DoubleDecoder, SCPI_INFINITY, SCPI_NAN};
pub use integer::IntDecoder;
pub use optional::OptionalDecoder;
pub use raw::{ByteDecodable, ByteDecoder, RawBytesDecoder, VecDecoder};
pub use registry::{DecodeHook, DecoderRegistry, Overridable};
pub use string::StringDecoder;

use crate::error::DecodeError;

/// A decoder that turns an ASCII message into a value.
pub trait MessageDecoder {
    /// The type produced by this decoder.
    type Output;
    /// The error returned when the message cannot be decoded.
    type Error: Into<DecodeError>;

    /// Decodes the given message.
    fn decode(&self, message: &str) -> Result<Self::Output, Self::Error>;
}

/// A type with a canonical [`MessageDecoder`].
pub trait MessageDecodable: Sized {
    /// The default decoder for this type.
    type Decoder: MessageDecoder<Output = Self> + Default;

    /// Whether an empty message (or a bare line terminator) means "no value"
    /// when this type is wrapped in an `Option`.
    ///
    /// Text cannot tell an empty string apart from a missing one, so
    /// `String` turns this off.
    const EMPTY_IS_ABSENT: bool = true;

    /// Returns the default decoder.
    #[must_use]
    fn default_decoder() -> Self::Decoder {
        Self::Decoder::default()
    }

    /// Decodes a message with the default decoder.
    fn decoded(message: &str) -> Result<Self, <Self::Decoder as MessageDecoder>::Error> {
        Self::default_decoder().decode(message)
    }

    /// Decodes a message with the given decoder.
    fn decoded_with<D>(message: &str, decoder: &D) -> Result<Self, D::Error>
    where
        D: MessageDecoder<Output = Self>,
    {
        decoder.decode(message)
    }

    /// Decodes a message, honouring any override installed in `registry`.
    fn decode_in(_registry: &DecoderRegistry, message: &str) -> Result<Self, DecodeError> {
        Self::decoded(message).map_err(Into::into)
    }
}

impl<D: MessageDecoder + ?Sized> MessageDecoder for &D {
    type Output = D::Output;
    type Error = D::Error;

    fn decode(&self, message: &str) -> Result<Self::Output, Self::Error> {
        (**self).decode(message)
    }
}

/// Removes every whitespace character, not only leading and trailing ones.
pub(crate) fn strip_whitespace(message: &str) -> String {
    message.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Parses a plain decimal floating point literal.
///
/// Keywords such as `inf` or `nan` are rejected here; the decoders that
/// accept them check for them explicitly.
pub(crate) fn parse_decimal_float(text: &str) -> Option<f64> {
    let numeric = text
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !numeric || !text.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
