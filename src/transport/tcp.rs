//! TCP/IP socket transport.
//!
//! LAN instruments usually expose SCPI over a raw socket on port 5025.

use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::error::{Error, Result};
use crate::transport::framing::{DEFAULT_TERMINATOR, TerminatorFramer};
use crate::transport::{Transport, TransportKind, Trigger};

/// Default SCPI raw socket port.
pub const DEFAULT_PORT: u16 = 5025;

/// Default time allowed for establishing the connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Configuration for TCP transport.
#[derive(Debug, Clone)]
pub struct TcpConfig {
    /// Host name or IP address.
    pub host: String,
    /// Port number.
    pub port: u16,
    /// Time allowed for establishing the connection.
    pub connect_timeout: Duration,
    /// Termination character that ends each response.
    pub terminator: u8,
    /// Whether the terminator is removed from responses.
    pub strip_terminator: bool,
}

impl TcpConfig {
    /// Creates a configuration for `host` on the default port.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            terminator: DEFAULT_TERMINATOR,
            strip_terminator: true,
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the termination character.
    #[must_use]
    pub const fn terminator(mut self, terminator: u8) -> Self {
        self.terminator = terminator;
        self
    }

    /// Sets whether the terminator is removed from responses.
    #[must_use]
    pub const fn strip_terminator(mut self, strip: bool) -> Self {
        self.strip_terminator = strip;
        self
    }

    /// Returns `host:port`.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// TCP transport for instrument communication.
pub struct TcpTransport {
    config: TcpConfig,
    stream: Option<TcpStream>,
    framer: TerminatorFramer,
}

impl TcpTransport {
    /// Creates a new TCP transport with the given configuration.
    #[must_use]
    pub fn new(config: TcpConfig) -> Self {
        let framer = TerminatorFramer::new(config.terminator, config.strip_terminator);
        Self {
            config,
            stream: None,
            framer,
        }
    }

    /// Creates a transport for `host` and `port` with default settings.
    #[must_use]
    pub fn with_address(host: impl Into<String>, port: u16) -> Self {
        Self::new(TcpConfig::new(host).port(port))
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &TcpConfig {
        &self.config
    }
}

impl Transport for TcpTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::TcpIp
    }

    fn connect(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if self.stream.is_some() {
                return Ok(());
            }

            let address = self.config.address();
            tracing::info!("connecting to {}", address);

            let timeout = self.config.connect_timeout;
            let stream = tokio::time::timeout(timeout, TcpStream::connect(&address))
                .await
                .map_err(|_| Error::Timeout {
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                })??;

            if let Err(e) = stream.set_nodelay(true) {
                tracing::warn!("failed to set TCP_NODELAY: {}", e);
            }

            self.stream = Some(stream);
            self.framer.clear();

            tracing::info!("connected to {}", address);
            Ok(())
        })
    }

    fn disconnect(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if let Some(mut stream) = self.stream.take() {
                tracing::info!("disconnecting from {}", self.config.address());
                if let Err(e) = stream.shutdown().await {
                    tracing::debug!("socket shutdown failed: {}", e);
                }
            }
            self.framer.clear();
            Ok(())
        })
    }

    fn write(&mut self, data: Bytes) -> BoxFuture<'_, Result<usize>> {
        Box::pin(async move {
            let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
            tracing::trace!("sending {} bytes: {}", data.len(), hex::encode(&data));

            stream.write_all(&data).await?;
            stream.flush().await?;

            Ok(data.len())
        })
    }

    fn read(&mut self, max_len: usize) -> BoxFuture<'_, Result<Bytes>> {
        Box::pin(async move {
            let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
            self.framer.read_message(stream, max_len).await
        })
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

impl Trigger for TcpTransport {
    fn assert_trigger(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.write(Bytes::from_static(b"*TRG\n")).await?;
            Ok(())
        })
    }
}
