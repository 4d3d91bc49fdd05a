//! Message framing for stream transports.
//!
//! Instruments end each response with a termination character (usually
//! `\n`). Stream transports feed received bytes into a
//! [`TerminatorFramer`], which yields one message per terminator:
//! ```text
//! ┌──────────────────────┬────────────┐
//! │  message             │ terminator │
//! │  up to max_len bytes │  1 byte    │
//! └──────────────────────┴────────────┘
//! ```
//! A message that reaches `max_len` bytes without a terminator is returned
//! as is.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Error, Result};

/// Default termination character.
pub const DEFAULT_TERMINATOR: u8 = b'\n';

/// Size of the scratch buffer used per socket read.
const READ_CHUNK: usize = 1024;

/// Splits a byte stream into terminated messages.
#[derive(Debug)]
pub struct TerminatorFramer {
    buffer: BytesMut,
    terminator: u8,
    strip: bool,
}

impl Default for TerminatorFramer {
    fn default() -> Self {
        Self::new(DEFAULT_TERMINATOR, true)
    }
}

impl TerminatorFramer {
    /// Creates a framer.
    ///
    /// With `strip` set, the terminator (and a `\r` before a `\n`
    /// terminator) is removed from each message.
    #[must_use]
    pub fn new(terminator: u8, strip: bool) -> Self {
        Self {
            buffer: BytesMut::new(),
            terminator,
            strip,
        }
    }

    /// Feeds data into the framer.
    pub fn feed(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Returns the next complete message, if any.
    ///
    /// A message is complete when a terminator is found within the first
    /// `max_len` bytes, or when `max_len` bytes have accumulated.
    pub fn next_message(&mut self, max_len: usize) -> Option<Bytes> {
        if max_len == 0 {
            return Some(Bytes::new());
        }

        let window = self.buffer.len().min(max_len);
        if let Some(pos) = self.buffer[..window]
            .iter()
            .position(|&b| b == self.terminator)
        {
            let mut message = self.buffer.split_to(pos + 1);
            if self.strip {
                message.truncate(pos);
                if self.terminator == b'\n' && message.last() == Some(&b'\r') {
                    message.truncate(pos - 1);
                }
            }
            return Some(message.freeze());
        }

        if self.buffer.len() >= max_len {
            return Some(self.buffer.split_to(max_len).freeze());
        }

        None
    }

    /// Returns the number of bytes currently buffered.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Discards all buffered bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Reads from `reader` until one message is complete.
    pub async fn read_message<R>(&mut self, reader: &mut R, max_len: usize) -> Result<Bytes>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            if let Some(message) = self.next_message(max_len) {
                tracing::trace!("framed message: {}", hex::encode(&message));
                return Ok(message);
            }

            let n = reader.read(&mut chunk).await?;
            if n == 0 {
                tracing::debug!("stream closed with {} bytes buffered", self.buffered());
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "stream closed",
                )));
            }

            tracing::trace!("received {} bytes", n);
            self.feed(&chunk[..n]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_message() {
        let mut framer = TerminatorFramer::default();
        framer.feed(b"+1.000E+00\n");
        assert_eq!(framer.next_message(1024).unwrap(), "+1.000E+00");
        assert_eq!(framer.buffered(), 0);
    }

    #[test]
    fn test_partial_message() {
        let mut framer = TerminatorFramer::default();
        framer.feed(b"3.1");
        assert!(framer.next_message(1024).is_none());
        framer.feed(b"4\r\n");
        assert_eq!(framer.next_message(1024).unwrap(), "3.14");
    }

    #[test]
    fn test_multiple_messages() {
        let mut framer = TerminatorFramer::default();
        framer.feed(b"ON\nOFF\n1");
        assert_eq!(framer.next_message(1024).unwrap(), "ON");
        assert_eq!(framer.next_message(1024).unwrap(), "OFF");
        assert!(framer.next_message(1024).is_none());
        assert_eq!(framer.buffered(), 1);
    }

    #[test]
    fn test_keep_terminator() {
        let mut framer = TerminatorFramer::new(b'\n', false);
        framer.feed(b"abc\r\n");
        assert_eq!(framer.next_message(1024).unwrap(), "abc\r\n");
    }

    #[test]
    fn test_custom_terminator() {
        let mut framer = TerminatorFramer::new(b'\r', true);
        framer.feed(b"12\r34");
        assert_eq!(framer.next_message(1024).unwrap(), "12");
    }

    #[test]
    fn test_max_len_without_terminator() {
        let mut framer = TerminatorFramer::default();
        framer.feed(b"abcdefgh");
        assert_eq!(framer.next_message(4).unwrap(), "abcd");
        assert_eq!(framer.next_message(4).unwrap(), "efgh");
        assert!(framer.next_message(4).is_none());
    }

    #[test]
    fn test_zero_max_len() {
        let mut framer = TerminatorFramer::default();
        framer.feed(b"1\n");
        assert_eq!(framer.next_message(0).unwrap(), "");
        assert_eq!(framer.buffered(), 2);
    }

    #[test]
    fn test_clear() {
        let mut framer = TerminatorFramer::default();
        framer.feed(b"stale");
        framer.clear();
        assert_eq!(framer.buffered(), 0);
    }

    #[tokio::test]
    async fn test_read_message_from_stream() {
        let mut stream: &[u8] = b"-20\nrest";
        let mut framer = TerminatorFramer::default();
        let message = framer.read_message(&mut stream, 1024).await.unwrap();
        assert_eq!(message, "-20");

        // Only "rest" remains and the stream ends before a terminator.
        let err = framer.read_message(&mut stream, 1024).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
