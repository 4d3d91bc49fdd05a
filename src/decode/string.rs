//! Default decoder for `String`.

use std::convert::Infallible;

use crate::decode::{DecoderRegistry, MessageDecodable, MessageDecoder};
use crate::error::DecodeError;

/// Returns the message unchanged.
///
/// With [`StringDecoder::strip_terminator`] enabled, a single trailing line
/// terminator (`"\n"` or `"\r\n"`) is removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StringDecoder {
    strip_terminator: bool,
}

impl StringDecoder {
    /// Creates the identity decoder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            strip_terminator: false,
        }
    }

    /// Sets whether a trailing line terminator is removed.
    #[must_use]
    pub const fn strip_terminator(mut self, strip: bool) -> Self {
        self.strip_terminator = strip;
        self
    }
}

impl MessageDecoder for StringDecoder {
    type Output = String;
    type Error = Infallible;

    fn decode(&self, message: &str) -> Result<String, Infallible> {
        if self.strip_terminator {
            if let Some(line) = message.strip_suffix('\n') {
                return Ok(line.strip_suffix('\r').unwrap_or(line).to_owned());
            }
        }
        Ok(message.to_owned())
    }
}

impl MessageDecodable for String {
    type Decoder = StringDecoder;

    const EMPTY_IS_ABSENT: bool = false;

    fn decode_in(registry: &DecoderRegistry, message: &str) -> Result<Self, DecodeError> {
        registry.dispatch(message)
    }
}
