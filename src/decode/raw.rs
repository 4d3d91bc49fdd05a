//! Decoding of raw byte responses.

use std::convert::Infallible;

use bytes::Bytes;

use crate::error::DecodeError;

/// A decoder that turns raw bytes into a value.
pub trait ByteDecoder {
    /// The type produced by this decoder.
    type Output;
    /// The error returned when the bytes cannot be decoded.
    type Error: Into<DecodeError>;

    /// Decodes the given bytes.
    fn decode(&self, data: &[u8]) -> Result<Self::Output, Self::Error>;
}

/// A type with a canonical [`ByteDecoder`].
pub trait ByteDecodable: Sized {
    /// The default decoder for this type.
    type Decoder: ByteDecoder<Output = Self> + Default;

    /// Decodes bytes with the default decoder.
    fn decoded(data: &[u8]) -> Result<Self, <Self::Decoder as ByteDecoder>::Error> {
        Self::Decoder::default().decode(data)
    }
}

impl<D: ByteDecoder + ?Sized> ByteDecoder for &D {
    type Output = D::Output;
    type Error = D::Error;

    fn decode(&self, data: &[u8]) -> Result<Self::Output, Self::Error> {
        (**self).decode(data)
    }
}

/// Returns the received bytes unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawBytesDecoder;

impl ByteDecoder for RawBytesDecoder {
    type Output = Bytes;
    type Error = Infallible;

    fn decode(&self, data: &[u8]) -> Result<Bytes, Infallible> {
        Ok(Bytes::copy_from_slice(data))
    }
}

impl ByteDecodable for Bytes {
    type Decoder = RawBytesDecoder;
}

/// Returns the received bytes as a vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VecDecoder;

impl ByteDecoder for VecDecoder {
    type Output = Vec<u8>;
    type Error = Infallible;

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, Infallible> {
        Ok(data.to_vec())
    }
}

impl ByteDecodable for Vec<u8> {
    type Decoder = VecDecoder;
}
