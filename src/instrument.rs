//! The [`Instrument`] query engine.
//!
//! An [`Instrument`] owns one transport and performs ASCII command/response
//! exchanges with it. Each query writes the command, performs exactly one
//! read and decodes the response. Failed queries are never retried: a
//! resent command could pair a stale response with the wrong request.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;

use crate::decode::{ByteDecodable, ByteDecoder, DecoderRegistry, MessageDecodable, MessageDecoder};
use crate::error::{Error, Result};
use crate::sampler::Sampler;
use crate::transport::{
    RemoteEnable, SerialConfig, SerialControl, SerialTransport, StatusByteSource, TcpConfig,
    TcpTransport, Transport, TransportKind, Trigger,
};
use crate::types::{RenMode, StatusByte};

/// Default terminator appended to text commands.
pub const DEFAULT_WRITE_TERMINATOR: &str = "\n";

/// Default maximum length of a single read.
pub const DEFAULT_MAX_READ_LEN: usize = 1024;

/// Default limit for a single write or read.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings for an [`Instrument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentConfig {
    /// Appended to every text command. May be empty.
    pub write_terminator: String,
    /// Maximum number of bytes accepted per read.
    ///
    /// A response longer than this is cut at exactly `max_read_len` bytes.
    /// The cut may fall inside a multi-byte UTF-8 character, in which case
    /// text reads fail with [`Error::InvalidMessage`]; raise the limit for
    /// instruments that answer with non-ASCII text.
    pub max_read_len: usize,
    /// Time allowed for each write and each read.
    pub io_timeout: Duration,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            write_terminator: DEFAULT_WRITE_TERMINATOR.to_owned(),
            max_read_len: DEFAULT_MAX_READ_LEN,
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }
}

impl InstrumentConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the command terminator.
    #[must_use]
    pub fn write_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.write_terminator = terminator.into();
        self
    }

    /// Sets the maximum read length.
    ///
    /// See [`InstrumentConfig::max_read_len`] for how long responses are cut.
    #[must_use]
    pub const fn max_read_len(mut self, len: usize) -> Self {
        self.max_read_len = len;
        self
    }

    /// Sets the I/O timeout.
    #[must_use]
    pub const fn io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }
}

/// A message based instrument on top of a [`Transport`].
#[derive(Debug)]
pub struct Instrument<T> {
    transport: T,
    config: InstrumentConfig,
    registry: DecoderRegistry,
}

impl Instrument<SerialTransport> {
    /// Creates an instrument on a serial port (not yet connected).
    ///
    /// # Arguments
    ///
    /// * `port` - Serial port path (e.g., "/dev/ttyUSB0")
    #[must_use]
    pub fn serial(port: impl Into<String>) -> Self {
        Self::with_serial_config(SerialConfig::new(port))
    }

    /// Creates an instrument with custom serial configuration.
    #[must_use]
    pub fn with_serial_config(config: SerialConfig) -> Self {
        Self::new(SerialTransport::new(config))
    }
}

impl Instrument<TcpTransport> {
    /// Creates an instrument on a raw TCP/IP socket (not yet connected).
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::with_tcp_config(TcpConfig::new(host).port(port))
    }

    /// Creates an instrument with custom TCP configuration.
    #[must_use]
    pub fn with_tcp_config(config: TcpConfig) -> Self {
        Self::new(TcpTransport::new(config))
    }
}

impl<T: Transport> Instrument<T> {
    /// Creates an instrument with the given transport and default settings.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, InstrumentConfig::default())
    }

    /// Creates an instrument with the given transport and settings.
    #[must_use]
    pub fn with_config(transport: T, config: InstrumentConfig) -> Self {
        Self {
            transport,
            config,
            registry: DecoderRegistry::new(),
        }
    }

    /// Returns the settings.
    #[must_use]
    pub const fn config(&self) -> &InstrumentConfig {
        &self.config
    }

    /// Returns the settings for modification.
    pub fn config_mut(&mut self) -> &mut InstrumentConfig {
        &mut self.config
    }

    /// Returns the decoder registry used by [`query`](Self::query) and
    /// [`read`](Self::read).
    #[must_use]
    pub const fn registry(&self) -> &DecoderRegistry {
        &self.registry
    }

    /// Returns the decoder registry for installing overrides.
    pub fn registry_mut(&mut self) -> &mut DecoderRegistry {
        &mut self.registry
    }

    /// Returns the transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the transport for direct access.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consumes the instrument, returning its transport.
    #[must_use]
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Returns the interface the instrument is attached to.
    #[must_use]
    pub fn kind(&self) -> TransportKind {
        self.transport.kind()
    }

    /// Returns true if the transport is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Opens the transport.
    pub async fn connect(&mut self) -> Result<()> {
        self.transport.connect().await
    }

    /// Closes the transport.
    pub async fn disconnect(&mut self) -> Result<()> {
        self.transport.disconnect().await
    }

    /// Sends a text command, followed by the configured terminator.
    pub async fn write(&mut self, command: &str) -> Result<()> {
        let mut data = Vec::with_capacity(command.len() + self.config.write_terminator.len());
        data.extend_from_slice(command.as_bytes());
        data.extend_from_slice(self.config.write_terminator.as_bytes());

        tracing::debug!("write {:?}", command);
        self.send(Bytes::from(data)).await
    }

    /// Sends raw bytes without a terminator.
    pub async fn write_bytes(&mut self, data: impl Into<Bytes>) -> Result<()> {
        self.send(data.into()).await
    }

    /// Reads one response and decodes it with the default decoder for `V`,
    /// or the override installed in the registry.
    pub async fn read<V: MessageDecodable>(&mut self) -> Result<V> {
        let message = self.receive().await?;
        Ok(V::decode_in(&self.registry, &message)?)
    }

    /// Reads one response and decodes it with `decoder`.
    pub async fn read_with<D: MessageDecoder>(&mut self, decoder: &D) -> Result<D::Output> {
        let message = self.receive().await?;
        decoder.decode(&message).map_err(|e| Error::Decode(e.into()))
    }

    /// Reads one response as text.
    pub async fn read_string(&mut self) -> Result<String> {
        self.read::<String>().await
    }

    /// Reads up to `max_len` raw bytes.
    pub async fn read_bytes(&mut self, max_len: usize) -> Result<Bytes> {
        let timeout = self.config.io_timeout;
        let data = with_timeout(timeout, self.transport.read(max_len)).await?;
        tracing::trace!("read {} bytes: {}", data.len(), hex::encode(&data));
        Ok(data)
    }

    /// Sends `command` and decodes the response as `V`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> scpi_link::Result<()> {
    /// use scpi_link::Instrument;
    ///
    /// let mut dmm = Instrument::tcp("192.168.1.20", 5025);
    /// dmm.connect().await?;
    /// let volts: f64 = dmm.query("MEAS:VOLT:DC?").await?;
    /// let overload: Option<bool> = dmm.query("SENS:OVLD?").await?;
    /// # let _ = (volts, overload);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn query<V: MessageDecodable>(&mut self, command: &str) -> Result<V> {
        let message = self.exchange(command).await?;
        Ok(V::decode_in(&self.registry, &message)?)
    }

    /// Sends `command` and decodes the response with `decoder`.
    pub async fn query_with<D: MessageDecoder>(
        &mut self,
        command: &str,
        decoder: &D,
    ) -> Result<D::Output> {
        let message = self.exchange(command).await?;
        decoder.decode(&message).map_err(|e| Error::Decode(e.into()))
    }

    /// Sends `command` and returns the response as text.
    pub async fn query_string(&mut self, command: &str) -> Result<String> {
        self.query::<String>(command).await
    }

    /// Sends raw bytes and reads up to `max_len` raw bytes back.
    pub async fn query_bytes(&mut self, data: impl Into<Bytes>, max_len: usize) -> Result<Bytes> {
        self.write_bytes(data).await?;
        self.read_bytes(max_len).await
    }

    /// Sends raw bytes and decodes the raw response as `V`.
    pub async fn query_bytes_as<V: ByteDecodable>(
        &mut self,
        data: impl Into<Bytes>,
        max_len: usize,
    ) -> Result<V> {
        let response = self.query_bytes(data, max_len).await?;
        V::decoded(&response).map_err(|e| Error::Decode(e.into()))
    }

    /// Sends raw bytes and decodes the raw response with `decoder`.
    pub async fn query_bytes_with<D: ByteDecoder>(
        &mut self,
        data: impl Into<Bytes>,
        max_len: usize,
        decoder: &D,
    ) -> Result<D::Output> {
        let response = self.query_bytes(data, max_len).await?;
        decoder.decode(&response).map_err(|e| Error::Decode(e.into()))
    }

    /// Queries `command` `count` times, one query per `cadence`.
    ///
    /// See [`Sampler::sample`].
    pub async fn sample<V: MessageDecodable>(
        &mut self,
        command: &str,
        count: usize,
        cadence: Duration,
    ) -> Result<Vec<Option<V>>> {
        Sampler::new(count, cadence).sample(self, command).await
    }

    /// Sends `command` once, then reads `count` responses, one per
    /// `cadence`.
    ///
    /// See [`Sampler::sample_reads`].
    pub async fn sample_reads<V: MessageDecodable>(
        &mut self,
        command: &str,
        count: usize,
        cadence: Duration,
    ) -> Result<Vec<Option<V>>> {
        Sampler::new(count, cadence)
            .sample_reads(self, command)
            .await
    }

    /// Writes `command` and reads the response text.
    pub(crate) async fn exchange(&mut self, command: &str) -> Result<String> {
        self.write(command).await?;
        self.receive().await
    }

    /// Reads one response as text.
    pub(crate) async fn receive(&mut self) -> Result<String> {
        let max_len = self.config.max_read_len;
        let data = self.read_bytes(max_len).await?;
        let message = std::str::from_utf8(&data)?.to_owned();
        tracing::debug!("response {:?}", message);
        Ok(message)
    }

    async fn send(&mut self, data: Bytes) -> Result<()> {
        let expected = data.len();
        let timeout = self.config.io_timeout;
        let written = with_timeout(timeout, self.transport.write(data)).await?;
        if written != expected {
            return Err(Error::ShortWrite { expected, written });
        }
        Ok(())
    }
}

impl<T: StatusByteSource> Instrument<T> {
    /// Serial polls the device for its status byte.
    pub async fn read_status_byte(&mut self) -> Result<StatusByte> {
        let timeout = self.config.io_timeout;
        let register = with_timeout(timeout, self.transport.read_status_byte()).await?;
        Ok(StatusByte::from_register(register))
    }
}

impl<T: Trigger> Instrument<T> {
    /// Sends a software trigger.
    pub async fn assert_trigger(&mut self) -> Result<()> {
        tracing::debug!("asserting trigger");
        let timeout = self.config.io_timeout;
        with_timeout(timeout, self.transport.assert_trigger()).await
    }
}

impl<T: SerialControl> Instrument<T> {
    /// Changes the baud rate of the serial line.
    pub fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        tracing::debug!("setting baud rate to {}", baud_rate);
        self.transport.set_baud_rate(baud_rate)
    }

    /// Discards data buffered on the serial line.
    pub fn clear_buffers(&mut self) -> Result<()> {
        self.transport.clear_buffers()
    }
}

impl<T: RemoteEnable> Instrument<T> {
    /// Drives the GPIB remote enable line.
    pub async fn set_remote_enable(&mut self, mode: RenMode) -> Result<()> {
        tracing::debug!("setting remote enable: {:?}", mode);
        let timeout = self.config.io_timeout;
        with_timeout(timeout, self.transport.set_remote_enable(mode)).await
    }
}

/// Runs `operation`, failing with [`Error::Timeout`] once `timeout` expires.
async fn with_timeout<F, R>(timeout: Duration, operation: F) -> Result<R>
where
    F: Future<Output = Result<R>>,
{
    tokio::time::timeout(timeout, operation)
        .await
        .map_err(|_| Error::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })?
}
