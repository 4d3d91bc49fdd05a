//! In-memory transport for tests and offline use.
//!
//! A [`LoopbackTransport`] answers reads from a queue of scripted replies,
//! or echoes the last command back when created with
//! [`LoopbackTransport::echo`]. Every write is recorded, and each reply can
//! carry a latency so timing behaviour can be exercised with a paused tokio
//! clock.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;

use crate::error::{Error, Result};
use crate::transport::{
    RemoteEnable, SerialControl, StatusByteSource, Transport, TransportKind, Trigger,
};
use crate::types::RenMode;

#[derive(Debug)]
enum Reply {
    Data(Bytes),
    Failure(io::ErrorKind),
}

#[derive(Debug)]
struct Scripted {
    reply: Reply,
    latency: Duration,
}

/// Scripted in-memory transport.
#[derive(Debug)]
pub struct LoopbackTransport {
    kind: TransportKind,
    connected: bool,
    echo: bool,
    replies: VecDeque<Scripted>,
    write_latency: Duration,
    writes: Vec<Bytes>,
    status: u16,
    triggers: usize,
    remote: Option<RenMode>,
    baud_rate: u32,
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackTransport {
    /// Creates a connected transport that answers from the reply queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            kind: TransportKind::Loopback,
            connected: true,
            echo: false,
            replies: VecDeque::new(),
            write_latency: Duration::ZERO,
            writes: Vec::new(),
            status: 0,
            triggers: 0,
            remote: None,
            baud_rate: crate::transport::serial::DEFAULT_BAUD_RATE,
        }
    }

    /// Creates a transport that answers each read with the last command
    /// written, minus its line terminator.
    ///
    /// Scripted replies still take precedence while any are queued.
    #[must_use]
    pub fn echo() -> Self {
        Self {
            echo: true,
            ..Self::new()
        }
    }

    /// Reports a different interface kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: TransportKind) -> Self {
        self.kind = kind;
        self
    }

    /// Queues a reply returned immediately.
    pub fn push_response(&mut self, data: impl Into<Bytes>) {
        self.push_delayed(data, Duration::ZERO);
    }

    /// Queues a reply returned after `latency`.
    pub fn push_delayed(&mut self, data: impl Into<Bytes>, latency: Duration) {
        self.replies.push_back(Scripted {
            reply: Reply::Data(data.into()),
            latency,
        });
    }

    /// Queues a read failure.
    pub fn push_failure(&mut self, kind: io::ErrorKind) {
        self.replies.push_back(Scripted {
            reply: Reply::Failure(kind),
            latency: Duration::ZERO,
        });
    }

    /// Delays every write by `latency`.
    pub fn set_write_latency(&mut self, latency: Duration) {
        self.write_latency = latency;
    }

    /// Sets the status register returned by serial polls.
    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Returns the replies still queued.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.replies.len()
    }

    /// Returns every write, in order.
    #[must_use]
    pub fn writes(&self) -> &[Bytes] {
        &self.writes
    }

    /// Returns every write decoded as text, in order.
    #[must_use]
    pub fn written(&self) -> Vec<String> {
        self.writes
            .iter()
            .map(|w| String::from_utf8_lossy(w).into_owned())
            .collect()
    }

    /// Returns how many triggers were asserted.
    #[must_use]
    pub const fn triggers(&self) -> usize {
        self.triggers
    }

    /// Returns the last REN mode applied.
    #[must_use]
    pub const fn remote_mode(&self) -> Option<RenMode> {
        self.remote
    }

    /// Returns true if the last REN mode left the line asserted.
    #[must_use]
    pub fn ren_asserted(&self) -> bool {
        self.remote.is_some_and(RenMode::asserts_line)
    }

    /// Returns true if the last REN mode locked out the front panel.
    #[must_use]
    pub fn local_lockout(&self) -> bool {
        self.remote.is_some_and(RenMode::locks_out)
    }

    /// Returns the current baud rate.
    #[must_use]
    pub const fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }

    fn echo_reply(&self) -> Option<Bytes> {
        let last = self.writes.last()?;
        let mut end = last.len();
        if last[..end].ends_with(b"\n") {
            end -= 1;
            if last[..end].ends_with(b"\r") {
                end -= 1;
            }
        }
        Some(last.slice(..end))
    }
}

impl Transport for LoopbackTransport {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    fn connect(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.connected = true;
            Ok(())
        })
    }

    fn disconnect(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.connected = false;
            Ok(())
        })
    }

    fn write(&mut self, data: Bytes) -> BoxFuture<'_, Result<usize>> {
        Box::pin(async move {
            self.ensure_connected()?;
            if !self.write_latency.is_zero() {
                tokio::time::sleep(self.write_latency).await;
            }
            tracing::trace!("loopback write: {}", hex::encode(&data));
            let len = data.len();
            self.writes.push(data);
            Ok(len)
        })
    }

    fn read(&mut self, max_len: usize) -> BoxFuture<'_, Result<Bytes>> {
        Box::pin(async move {
            self.ensure_connected()?;

            let mut message = match self.replies.pop_front() {
                Some(Scripted { reply, latency }) => {
                    if !latency.is_zero() {
                        tokio::time::sleep(latency).await;
                    }
                    match reply {
                        Reply::Data(data) => data,
                        Reply::Failure(kind) => {
                            return Err(Error::Io(io::Error::new(kind, "scripted failure")));
                        }
                    }
                }
                None if self.echo => self.echo_reply().unwrap_or_default(),
                None => {
                    return Err(Error::Io(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "no scripted reply",
                    )));
                }
            };

            message.truncate(max_len);
            tracing::trace!("loopback read: {}", hex::encode(&message));
            Ok(message)
        })
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

impl StatusByteSource for LoopbackTransport {
    fn read_status_byte(&mut self) -> BoxFuture<'_, Result<u16>> {
        Box::pin(async move {
            self.ensure_connected()?;
            Ok(self.status)
        })
    }
}

impl Trigger for LoopbackTransport {
    fn assert_trigger(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.ensure_connected()?;
            self.triggers += 1;
            Ok(())
        })
    }
}

impl SerialControl for LoopbackTransport {
    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        self.ensure_connected()?;
        self.baud_rate = baud_rate;
        Ok(())
    }

    fn clear_buffers(&mut self) -> Result<()> {
        self.ensure_connected()?;
        self.replies.clear();
        Ok(())
    }
}

impl RemoteEnable for LoopbackTransport {
    fn set_remote_enable(&mut self, mode: RenMode) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.ensure_connected()?;
            self.remote = Some(mode);
            Ok(())
        })
    }
}
