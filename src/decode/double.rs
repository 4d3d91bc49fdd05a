//! Default decoder for `f64`, including the SCPI sentinel values.

use crate::decode::{
    DecoderRegistry, MessageDecodable, MessageDecoder, parse_decimal_float, strip_whitespace,
};
use crate::error::{DecodeError, DoubleDecodeError};

/// SCPI encoding of positive infinity. Its negation encodes negative infinity.
pub const SCPI_INFINITY: f64 = 9.9e37;

/// SCPI encoding of not-a-number.
pub const SCPI_NAN: f64 = 9.91e37;

/// How close a value must be to a sentinel to be read as that sentinel.
const SENTINEL_TOLERANCE: f64 = SCPI_INFINITY / 1000.0;

/// Decodes floating point numbers.
///
/// After whitespace removal, the keywords `inf`, `ninf`, `-inf` and `nan`
/// are accepted in any case. Numeric values close to `±9.9e37` become
/// `±∞`, values close to `9.91e37` become NaN, and any other value whose
/// magnitude exceeds `9.9e37` is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DoubleDecoder;

impl MessageDecoder for DoubleDecoder {
    type Output = f64;
    type Error = DoubleDecodeError;

    fn decode(&self, message: &str) -> Result<f64, DoubleDecodeError> {
        let stripped = strip_whitespace(message);

        match stripped.to_lowercase().as_str() {
            "inf" => return Ok(f64::INFINITY),
            "ninf" | "-inf" => return Ok(f64::NEG_INFINITY),
            "nan" => return Ok(f64::NAN),
            _ => {}
        }

        let value = parse_decimal_float(&stripped).ok_or(DoubleDecodeError::NotANumber)?;
        normalize(value)
    }
}

impl MessageDecodable for f64 {
    type Decoder = DoubleDecoder;

    fn decode_in(registry: &DecoderRegistry, message: &str) -> Result<Self, DecodeError> {
        registry.dispatch(message)
    }
}

/// Maps SCPI sentinels to their IEEE-754 meaning and range-checks the rest.
fn normalize(value: f64) -> Result<f64, DoubleDecodeError> {
    if (value - SCPI_INFINITY).abs() < SENTINEL_TOLERANCE {
        Ok(f64::INFINITY)
    } else if (value + SCPI_INFINITY).abs() < SENTINEL_TOLERANCE {
        Ok(f64::NEG_INFINITY)
    } else if (value - SCPI_NAN).abs() < SENTINEL_TOLERANCE {
        Ok(f64::NAN)
    } else if value.abs() > SCPI_INFINITY {
        Err(DoubleDecodeError::NotInRange)
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_numbers() {
        let expected: [(&str, f64); 18] = [
            ("1.0", 1.0),
            ("1", 1.0),
            ("01", 1.0),
            ("2.75", 2.75),
            ("-2.75", -2.75),
            (" 1", 1.0),
            ("1 ", 1.0),
            ("\n\t 1\r\n", 1.0),
            ("1e3", 1e3),
            ("1e+3", 1e3),
            ("1e-3", 1e-3),
            ("-1e3", -1e3),
            ("-1e+3", -1e3),
            ("-1e-3", -1e-3),
            ("+1e3", 1e3),
            ("+1e+3", 1e3),
            ("+1e-3", 1e-3),
            ("9.8e37", 9.8e37),
        ];
        for (input, value) in expected {
            assert_eq!(DoubleDecoder.decode(input), Ok(value), "input {input:?}");
        }
    }

    #[test]
    fn test_decode_keywords() {
        for input in ["inf", "INF", "Inf", " iNf\n"] {
            assert_eq!(DoubleDecoder.decode(input), Ok(f64::INFINITY));
        }
        for input in ["ninf", "NINF", "NInf", "-inf", "-INF", "-Inf"] {
            assert_eq!(DoubleDecoder.decode(input), Ok(f64::NEG_INFINITY));
        }
        for input in ["nan", "NAN", "NaN"] {
            assert!(DoubleDecoder.decode(input).unwrap().is_nan());
        }
    }

    #[test]
    fn test_decode_sentinels() {
        assert_eq!(DoubleDecoder.decode("9.9e37"), Ok(f64::INFINITY));
        assert_eq!(DoubleDecoder.decode("+9.9E+37"), Ok(f64::INFINITY));
        assert_eq!(DoubleDecoder.decode("-9.9e37"), Ok(f64::NEG_INFINITY));
        assert!(DoubleDecoder.decode("9.91e37").unwrap().is_nan());
        assert!(DoubleDecoder.decode("9.910000E+37").unwrap().is_nan());
    }

    #[test]
    fn test_sentinel_tolerance() {
        // Within a thousandth of the sentinel.
        assert_eq!(DoubleDecoder.decode("9.905e37"), Ok(f64::INFINITY));
        assert_eq!(DoubleDecoder.decode("-9.895e37"), Ok(f64::NEG_INFINITY));
        // -9.91e37 is not a sentinel and lies beyond the finite range.
        assert_eq!(
            DoubleDecoder.decode("-9.91e37"),
            Err(DoubleDecodeError::NotInRange)
        );
    }

    #[test]
    fn test_decode_errors() {
        let expected = [
            ("", DoubleDecodeError::NotANumber),
            ("not a number", DoubleDecodeError::NotANumber),
            ("abc", DoubleDecodeError::NotANumber),
            ("3.1415-", DoubleDecodeError::NotANumber),
            ("3.14 abc", DoubleDecodeError::NotANumber),
            ("infinity", DoubleDecodeError::NotANumber),
            ("1e39", DoubleDecodeError::NotInRange),
            ("-1e39", DoubleDecodeError::NotInRange),
            ("1e400", DoubleDecodeError::NotInRange),
        ];
        for (input, error) in expected {
            assert_eq!(DoubleDecoder.decode(input), Err(error), "input {input:?}");
        }
    }
}
