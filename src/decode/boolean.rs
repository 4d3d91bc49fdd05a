//! Default decoder for `bool`.

use crate::decode::{
    DecoderRegistry, MessageDecodable, MessageDecoder, parse_decimal_float, strip_whitespace,
};
use crate::error::{BoolDecodeError, DecodeError};

/// Decodes booleans.
///
/// Accepts `on`/`off`, `yes`/`no` and `true`/`false` in any case, and the
/// numbers `0` and `1` written as integers or floats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoolDecoder;

impl MessageDecoder for BoolDecoder {
    type Output = bool;
    type Error = BoolDecodeError;

    fn decode(&self, message: &str) -> Result<bool, BoolDecodeError> {
        let folded = strip_whitespace(message).to_lowercase();

        match folded.as_str() {
            "off" | "no" | "false" => return Ok(false),
            "on" | "yes" | "true" => return Ok(true),
            _ => {}
        }

        if let Ok(value) = folded.parse::<i64>() {
            return match value {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(BoolDecodeError::NotABoolean),
            };
        }

        match parse_decimal_float(&folded) {
            Some(value) if value == 0.0 => Ok(false),
            Some(value) if value == 1.0 => Ok(true),
            _ => Err(BoolDecodeError::NotABoolean),
        }
    }
}

impl MessageDecodable for bool {
    type Decoder = BoolDecoder;

    fn decode_in(registry: &DecoderRegistry, message: &str) -> Result<Self, DecodeError> {
        registry.dispatch(message)
    }
}
