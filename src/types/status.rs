//! The IEEE 488.2 status byte.

use crate::decode::{ByteDecodable, ByteDecoder};
use crate::error::ByteDecodeError;

/// Service request status byte, as returned by a serial poll.
///
/// Bit layout follows IEEE 488.2 with the SCPI additions:
/// ```text
/// bit 7  OPER  operation status summary
/// bit 6  RQS   request service / master summary status
/// bit 5  ESB   standard event status summary
/// bit 4  MAV   message available
/// bit 3  QUES  questionable status summary
/// bit 2  EAV   error/event queue not empty
/// bit 1-0      device specific
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StatusByte(u8);

impl StatusByte {
    const EAV: u8 = 1 << 2;
    const QUES: u8 = 1 << 3;
    const MAV: u8 = 1 << 4;
    const ESB: u8 = 1 << 5;
    const RQS: u8 = 1 << 6;
    const OPER: u8 = 1 << 7;

    /// Creates a status byte from its raw value.
    #[must_use]
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// Creates a status byte from a 16-bit status register.
    ///
    /// Only the low byte carries the status; the high byte is ignored.
    #[must_use]
    pub const fn from_register(register: u16) -> Self {
        Self((register & 0x00ff) as u8)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Error/event queue holds at least one entry.
    #[must_use]
    pub const fn error_available(self) -> bool {
        self.0 & Self::EAV != 0
    }

    /// Questionable status summary.
    #[must_use]
    pub const fn questionable(self) -> bool {
        self.0 & Self::QUES != 0
    }

    /// A response is waiting in the output queue.
    #[must_use]
    pub const fn message_available(self) -> bool {
        self.0 & Self::MAV != 0
    }

    /// Standard event status summary.
    #[must_use]
    pub const fn event_status(self) -> bool {
        self.0 & Self::ESB != 0
    }

    /// The device is requesting service.
    #[must_use]
    pub const fn request_service(self) -> bool {
        self.0 & Self::RQS != 0
    }

    /// Operation status summary.
    #[must_use]
    pub const fn operation(self) -> bool {
        self.0 & Self::OPER != 0
    }
}

impl From<u8> for StatusByte {
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for StatusByte {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

/// Decodes a status byte from a 1- or 2-byte little-endian register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusByteDecoder;

impl ByteDecoder for StatusByteDecoder {
    type Output = StatusByte;
    type Error = ByteDecodeError;

    fn decode(&self, data: &[u8]) -> Result<StatusByte, ByteDecodeError> {
        match data {
            [] => Err(ByteDecodeError::Empty),
            [low] | [low, _] => Ok(StatusByte(*low)),
            _ => Err(ByteDecodeError::Length {
                expected: 2,
                actual: data.len(),
            }),
        }
    }
}

impl ByteDecodable for StatusByte {
    type Decoder = StatusByteDecoder;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_bits() {
        let stb = StatusByte::new(0b0101_0000);
        assert!(stb.message_available());
        assert!(stb.request_service());
        assert!(!stb.event_status());
        assert!(!stb.error_available());
        assert!(!stb.operation());
        assert!(!stb.questionable());
        assert_eq!(stb.to_string(), "0x50");

        let stb = StatusByte::from(0b1000_1000);
        assert!(stb.questionable());
        assert!(stb.operation());
        assert!(!stb.message_available());
    }

    #[test]
    fn test_from_register() {
        let stb = StatusByte::from_register(0xab24);
        assert_eq!(stb.raw(), 0x24);
        assert!(stb.event_status());
        assert!(stb.error_available());
    }

    #[test]
    fn test_decode_bytes() {
        assert_eq!(StatusByte::decoded(&[0x10]), Ok(StatusByte::new(0x10)));
        assert_eq!(StatusByte::decoded(&[0x40, 0x00]), Ok(StatusByte::new(0x40)));
        assert_eq!(StatusByte::decoded(&[]), Err(ByteDecodeError::Empty));
        assert_eq!(
            StatusByte::decoded(&[1, 2, 3]),
            Err(ByteDecodeError::Length {
                expected: 2,
                actual: 3
            })
        );
    }
}
