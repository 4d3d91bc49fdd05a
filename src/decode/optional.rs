//! Decoder for `Option<T>`.

use crate::decode::{DecoderRegistry, MessageDecodable, MessageDecoder};
use crate::error::DecodeError;

/// Messages that mean "no value".
pub const ABSENCE_TOKENS: [&str; 4] = ["", "\n", "\r", "\r\n"];

/// Returns true if the message is one of the [`ABSENCE_TOKENS`].
#[must_use]
pub fn is_absent(message: &str) -> bool {
    ABSENCE_TOKENS.contains(&message)
}

/// Wraps another decoder, mapping the absence tokens to `None`.
///
/// When the wrapped decoder produces a `String` every message, including an
/// empty one, decodes to `Some`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionalDecoder<D> {
    inner: D,
}

impl<D> OptionalDecoder<D>
where
    D: MessageDecoder,
    D::Output: MessageDecodable,
{
    /// Wraps the given decoder.
    #[must_use]
    pub const fn new(inner: D) -> Self {
        Self { inner }
    }

    /// Returns the wrapped decoder.
    #[must_use]
    pub const fn inner(&self) -> &D {
        &self.inner
    }
}

impl<D> MessageDecoder for OptionalDecoder<D>
where
    D: MessageDecoder,
    D::Output: MessageDecodable,
{
    type Output = Option<D::Output>;
    type Error = D::Error;

    fn decode(&self, message: &str) -> Result<Self::Output, Self::Error> {
        if <D::Output as MessageDecodable>::EMPTY_IS_ABSENT && is_absent(message) {
            return Ok(None);
        }
        self.inner.decode(message).map(Some)
    }
}

impl<T: MessageDecodable> MessageDecodable for Option<T> {
    type Decoder = OptionalDecoder<T::Decoder>;

    fn decode_in(registry: &DecoderRegistry, message: &str) -> Result<Self, DecodeError> {
        if T::EMPTY_IS_ABSENT && is_absent(message) {
            return Ok(None);
        }
        T::decode_in(registry, message).map(Some)
    }
}
