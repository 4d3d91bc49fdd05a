//! # scpi-link
//!
//! Typed ASCII queries and timed sampling for SCPI-style measurement
//! instruments.
//!
//! This library talks to instruments over serial lines and raw TCP/IP
//! sockets and turns their text responses into Rust values.
//!
//! ## Features
//!
//! - Async/await based API using Tokio
//! - Decoders for the SCPI conventions, including the `9.9e37` infinity and
//!   `9.91e37` NaN sentinels
//! - Per-instrument decoder overrides
//! - Timed repeated queries that report late samples as `None`
//! - An in-memory loopback transport for tests
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use scpi_link::Instrument;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), scpi_link::Error> {
//!     let mut dmm = Instrument::serial("/dev/ttyUSB0");
//!     dmm.connect().await?;
//!
//!     let id = dmm.query_string("*IDN?").await?;
//!     println!("Connected to: {id}");
//!
//!     let volts: f64 = dmm.query("MEAS:VOLT:DC?").await?;
//!     println!("Voltage: {volts} V");
//!
//!     // Ten readings, one every 100ms
//!     let readings = dmm
//!         .sample::<f64>("MEAS:VOLT:DC?", 10, Duration::from_millis(100))
//!         .await?;
//!     println!("Missed {} slots", readings.iter().filter(|r| r.is_none()).count());
//!
//!     dmm.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`decode`] - Response decoders and the decoder registry
//! - [`transport`] - Transport implementations (Serial, TCP/IP, Loopback)
//! - [`instrument`] - The [`Instrument`] query engine
//! - [`sampler`] - Timed repeated queries
//! - [`types`] - Status byte and GPIB remote enable modes
//! - [`error`] - Error types

pub mod decode;
pub mod error;
pub mod instrument;
pub mod sampler;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use decode::{
    BoolDecoder, DecoderRegistry, DoubleDecoder, IntDecoder, MessageDecodable, MessageDecoder,
    OptionalDecoder, StringDecoder,
};
pub use error::{
    BoolDecodeError, ByteDecodeError, DecodeError, DoubleDecodeError, Error, IntDecodeError,
    Result,
};
pub use instrument::{Instrument, InstrumentConfig};
pub use sampler::Sampler;
pub use transport::{
    LoopbackTransport, SerialTransport, TcpTransport, Transport, TransportKind, serial::list_ports,
};
pub use types::{RenMode, StatusByte};
