//! Data types shared by instruments and transports.
//!
//! This module contains:
//! - The IEEE 488.2 status byte
//! - GPIB remote enable modes

pub mod remote;
pub mod status;

pub use remote::RenMode;
pub use status::{StatusByte, StatusByteDecoder};
