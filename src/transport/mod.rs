//! Transport layer for instrument communication.
//!
//! A [`Transport`] moves bytes to and from one device. Optional
//! capabilities, such as reading the status byte or driving GPIB control
//! lines, are separate traits that a transport implements only when its
//! interface supports them:
//!
//! | Capability             | Serial | TCP/IP | Loopback |
//! |------------------------|--------|--------|----------|
//! | [`Trigger`]            | yes    | yes    | yes      |
//! | [`SerialControl`]      | yes    |        | yes      |
//! | [`StatusByteSource`]   |        |        | yes      |
//! | [`RemoteEnable`]       |        |        | yes      |

pub mod framing;
pub mod loopback;
pub mod serial;
pub mod tcp;

use std::fmt;

use bytes::Bytes;
use futures::future::BoxFuture;

use crate::error::Result;
use crate::types::RenMode;

pub use framing::TerminatorFramer;
pub use loopback::LoopbackTransport;
pub use serial::{SerialConfig, SerialTransport};
pub use tcp::{TcpConfig, TcpTransport};

/// The interface a transport talks over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// IEEE 488 bus.
    Gpib,
    /// USB test and measurement class.
    Usb,
    /// RS-232 or USB virtual serial port.
    Serial,
    /// Raw TCP/IP socket.
    TcpIp,
    /// In-memory transport without a device.
    Loopback,
}

impl TransportKind {
    /// Returns a short name for the interface.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gpib => "GPIB",
            Self::Usb => "USB",
            Self::Serial => "ASRL",
            Self::TcpIp => "TCPIP",
            Self::Loopback => "LOOPBACK",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Byte-oriented connection to a single device.
///
/// Each operation completes only when the underlying I/O has finished or
/// failed. A transport is used by one caller at a time.
pub trait Transport: Send + Sync {
    /// Returns the interface this transport talks over.
    fn kind(&self) -> TransportKind;

    /// Connects to the device.
    fn connect(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Disconnects from the device.
    fn disconnect(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Sends data to the device, returning the number of bytes written.
    fn write(&mut self, data: Bytes) -> BoxFuture<'_, Result<usize>>;

    /// Reads one response of at most `max_len` bytes.
    fn read(&mut self, max_len: usize) -> BoxFuture<'_, Result<Bytes>>;

    /// Returns true if connected.
    fn is_connected(&self) -> bool;
}

/// Transports that can serial-poll the device status byte.
pub trait StatusByteSource: Transport {
    /// Reads the 16-bit status register; the low byte is the status byte.
    fn read_status_byte(&mut self) -> BoxFuture<'_, Result<u16>>;
}

/// Transports that can send a software trigger.
pub trait Trigger: Transport {
    /// Asserts a trigger on the device.
    fn assert_trigger(&mut self) -> BoxFuture<'_, Result<()>>;
}

/// Transports over a serial line.
pub trait SerialControl: Transport {
    /// Changes the baud rate of the open port.
    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()>;

    /// Discards data buffered in both directions.
    fn clear_buffers(&mut self) -> Result<()>;
}

/// Transports that can drive the GPIB remote enable line.
pub trait RemoteEnable: Transport {
    /// Drives REN according to `mode`.
    fn set_remote_enable(&mut self, mode: RenMode) -> BoxFuture<'_, Result<()>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(TransportKind::Serial.to_string(), "ASRL");
        assert_eq!(TransportKind::TcpIp.to_string(), "TCPIP");
        assert_eq!(TransportKind::Gpib.name(), "GPIB");
    }
}
