//! Default decoder for `i64`.

use crate::decode::{DecoderRegistry, MessageDecodable, MessageDecoder, strip_whitespace};
use crate::error::{DecodeError, IntDecodeError};

/// Number of decimal digits in `i64::MAX`.
const I64_MAX_DIGITS: usize = 19;

/// Exponents beyond this magnitude are clamped; any such value with a
/// nonzero mantissa is out of range or fractional either way.
const EXPONENT_CLAMP: i64 = 1_000_000;

/// Radix prefixes, in the order they are tried.
const RADIX_PREFIXES: [(&str, u32); 3] = [("0b", 2), ("0o", 8), ("0x", 16)];

/// Decodes integers.
///
/// All whitespace is removed first. The stripped message is then tried as:
///
/// 1. a decimal integer (`-?[0-9]+`)
/// 2. a decimal float that is exactly integral (`1e4`, `3.14e2`)
/// 3. a binary, octal or hexadecimal literal (`0b101`, `0o17`, `0x1F`)
///
/// Floats are evaluated digit by digit, not through `f64`, so a value is
/// never rounded: a fractional part fails with
/// [`IntDecodeError::NotAnInteger`] and anything beyond the `i64` range
/// with [`IntDecodeError::NotInRange`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntDecoder;

impl MessageDecoder for IntDecoder {
    type Output = i64;
    type Error = IntDecodeError;

    fn decode(&self, message: &str) -> Result<i64, IntDecodeError> {
        let stripped = strip_whitespace(message);

        if let Ok(value) = stripped.parse::<i64>() {
            return Ok(value);
        }

        if let Some(result) = parse_exact_decimal(&stripped) {
            return result;
        }

        if let Some(value) = parse_radix(&stripped) {
            return Ok(value);
        }

        Err(IntDecodeError::NotANumber)
    }
}

impl MessageDecodable for i64 {
    type Decoder = IntDecoder;

    fn decode_in(registry: &DecoderRegistry, message: &str) -> Result<Self, DecodeError> {
        registry.dispatch(message)
    }
}

/// Splits off a leading sign.
fn split_sign(text: &str) -> (bool, &str) {
    match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    }
}

/// Evaluates `[+-]digits[.digits][(e|E)[+-]digits]` exactly.
///
/// Returns `None` when the text is not a decimal literal.
fn parse_exact_decimal(text: &str) -> Option<Result<i64, IntDecodeError>> {
    let (negative, body) = split_sign(text);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(pos) => (&body[..pos], parse_exponent(&body[pos + 1..])?),
        None => (body, 0),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let all_digits = format!("{whole}{fraction}");
    let digits = all_digits.trim_start_matches('0');
    if digits.is_empty() {
        return Some(Ok(0));
    }

    // Power of ten applied to `digits` read as an integer.
    let scale = exponent - i64::try_from(fraction.len()).unwrap_or(EXPONENT_CLAMP);
    let integer = if let Ok(zeros) = usize::try_from(scale) {
        if digits.len().saturating_add(zeros) > I64_MAX_DIGITS {
            return Some(Err(IntDecodeError::NotInRange));
        }
        format!("{digits}{}", "0".repeat(zeros))
    } else {
        let cut = usize::try_from(scale.unsigned_abs()).unwrap_or(usize::MAX);
        if cut >= digits.len() {
            return Some(Err(IntDecodeError::NotAnInteger));
        }
        let (head, tail) = digits.split_at(digits.len() - cut);
        if tail.bytes().any(|b| b != b'0') {
            return Some(Err(IntDecodeError::NotAnInteger));
        }
        if head.len() > I64_MAX_DIGITS {
            return Some(Err(IntDecodeError::NotInRange));
        }
        head.to_owned()
    };

    // At most 19 digits, so this fits in an i128.
    let magnitude = integer.parse::<i128>().ok()?;
    let value = if negative { -magnitude } else { magnitude };
    Some(i64::try_from(value).map_err(|_| IntDecodeError::NotInRange))
}

/// Parses an exponent, clamping its magnitude to [`EXPONENT_CLAMP`].
fn parse_exponent(text: &str) -> Option<i64> {
    let (negative, digits) = split_sign(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let magnitude = digits
        .parse::<i64>()
        .map_or(EXPONENT_CLAMP, |e| e.min(EXPONENT_CLAMP));
    Some(if negative { -magnitude } else { magnitude })
}

/// Parses `0b`, `0o` and `0x` literals with an optional sign.
fn parse_radix(text: &str) -> Option<i64> {
    let (negative, body) = split_sign(text);
    let sign = if negative { "-" } else { "" };

    for (prefix, radix) in RADIX_PREFIXES {
        let Some(head) = body.get(..prefix.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(prefix) {
            continue;
        }
        let digits = &body[prefix.len()..];
        // from_str_radix would otherwise accept a second sign after the prefix
        if digits.starts_with(['-', '+']) {
            return None;
        }
        return i64::from_str_radix(&format!("{sign}{digits}"), radix).ok();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_integers() {
        let decoder = IntDecoder;
        let expected: [(&str, i64); 10] = [
            ("0", 0),
            ("0000", 0),
            ("512", 512),
            ("-20", -20),
            (" 12", 12),
            ("12 ", 12),
            (" 12 ", 12),
            ("\r12\t\n ", 12),
            ("1e4", 10_000),
            ("3.14e2", 314),
        ];
        for (input, value) in expected {
            assert_eq!(decoder.decode(input), Ok(value), "input {input:?}");
        }
    }

    #[test]
    fn test_decode_inner_whitespace() {
        assert_eq!(IntDecoder.decode("1 000"), Ok(1000));
        assert_eq!(IntDecoder.decode("- 5"), Ok(-5));
    }

    #[test]
    fn test_decode_radix() {
        assert_eq!(IntDecoder.decode("0b101"), Ok(5));
        assert_eq!(IntDecoder.decode("0o17"), Ok(15));
        assert_eq!(IntDecoder.decode("0x1F"), Ok(31));
        assert_eq!(IntDecoder.decode("0X1f"), Ok(31));
        assert_eq!(IntDecoder.decode("-0x10"), Ok(-16));
        assert_eq!(IntDecoder.decode("0x-10"), Err(IntDecodeError::NotANumber));
        assert_eq!(IntDecoder.decode("0b102"), Err(IntDecodeError::NotANumber));
        assert_eq!(IntDecoder.decode("0x"), Err(IntDecodeError::NotANumber));
    }

    #[test]
    fn test_decode_extremes() {
        assert_eq!(IntDecoder.decode("9223372036854775807"), Ok(i64::MAX));
        assert_eq!(IntDecoder.decode("-9223372036854775808"), Ok(i64::MIN));
        assert_eq!(
            IntDecoder.decode("9223372036854775808"),
            Err(IntDecodeError::NotInRange)
        );
        assert_eq!(IntDecoder.decode("1e30"), Err(IntDecodeError::NotInRange));
        assert_eq!(
            IntDecoder.decode("-9223372036854775809"),
            Err(IntDecodeError::NotInRange)
        );
        assert_eq!(
            IntDecoder.decode("-9223372036854776000"),
            Err(IntDecodeError::NotInRange)
        );
        assert_eq!(
            IntDecoder.decode("-9.223372036854775808e18"),
            Ok(i64::MIN)
        );
        assert_eq!(
            IntDecoder.decode("9.223372036854775808e18"),
            Err(IntDecodeError::NotInRange)
        );
    }

    #[test]
    fn test_decode_floats_without_rounding() {
        assert_eq!(
            IntDecoder.decode("9007199254740993.0"),
            Ok(9_007_199_254_740_993)
        );
        assert_eq!(IntDecoder.decode("0.10e1"), Ok(1));
        assert_eq!(IntDecoder.decode("1200e-2"), Ok(12));
        assert_eq!(IntDecoder.decode("-0.0"), Ok(0));
        assert_eq!(IntDecoder.decode("0e999999999999"), Ok(0));
        assert_eq!(
            IntDecoder.decode("1201e-2"),
            Err(IntDecodeError::NotAnInteger)
        );
        assert_eq!(
            IntDecoder.decode("5e-99999999999"),
            Err(IntDecodeError::NotAnInteger)
        );
        assert_eq!(
            IntDecoder.decode("1e99999999999"),
            Err(IntDecodeError::NotInRange)
        );
        assert_eq!(IntDecoder.decode("1e"), Err(IntDecodeError::NotANumber));
        assert_eq!(IntDecoder.decode("."), Err(IntDecodeError::NotANumber));
    }

    #[test]
    fn test_decode_errors() {
        let long_number = "9".repeat(10_000);
        let expected = [
            (String::new(), IntDecodeError::NotANumber),
            (long_number.clone(), IntDecodeError::NotInRange),
            (format!("-{long_number}"), IntDecodeError::NotInRange),
            ("3.14".to_owned(), IntDecodeError::NotAnInteger),
            ("2e-10".to_owned(), IntDecodeError::NotAnInteger),
            ("1+1".to_owned(), IntDecodeError::NotANumber),
            ("abc".to_owned(), IntDecodeError::NotANumber),
            ("/n".to_owned(), IntDecodeError::NotANumber),
            ("inf".to_owned(), IntDecodeError::NotANumber),
        ];
        for (input, error) in expected {
            assert_eq!(IntDecoder.decode(&input), Err(error));
        }
    }
}
