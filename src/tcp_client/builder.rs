use std::{
    sync::{atomic::AtomicU64, Arc},
    time::Duration,
};

use crate::{
    error::{Result, TcpClientError},
    tcp_client::TcpClient,
};

/// Bytes requested from the socket per receive call.
pub const DEFAULT_BUFFER_SIZE: usize = 2048;
/// Upper bound on the size of a single reply.
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 1024 * 1024;
/// Default bound on establishing the connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default bound on writing the request and reading the reply.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A `TcpClientBuilder` can be used to create a `TcpClient` with custom configuration.
#[derive(Clone, Debug)]
pub struct TcpClientBuilder {
    pub(crate) buffer_size: usize,
    pub(crate) max_response_size: usize,
    pub(crate) timeout: Duration,
    pub(crate) connect_timeout: Duration,
    pub(crate) shutdown_write: bool,
}

impl Default for TcpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TcpClientBuilder {
    /// Creates a new `TcpClientBuilder`.
    ///
    /// This is the same as `TcpClient::builder()`.
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            shutdown_write: false,
        }
    }

    // ========================================================================
    // Read options
    // ========================================================================

    /// Sets how many bytes are requested per receive call.
    ///
    /// Default is 2048.
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Sets the largest reply the client will accumulate.
    ///
    /// A reply that is still incomplete at this size fails with
    /// [`TcpClientError::ResponseTooLarge`]. Default is 1 MiB.
    pub fn max_response_size(mut self, size: usize) -> Self {
        self.max_response_size = size;
        self
    }

    /// Half-closes the connection after the request is written.
    ///
    /// Some servers only answer once they see end-of-stream. Default is `false`.
    pub fn shutdown_write(mut self, enabled: bool) -> Self {
        self.shutdown_write = enabled;
        self
    }

    // ========================================================================
    // Timeout options
    // ========================================================================

    /// Sets the request timeout.
    ///
    /// The timeout is applied from when the request starts being written until the
    /// reply has been read. Default is 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets a timeout for only the connect phase.
    ///
    /// Default is 10 seconds.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    // ========================================================================

    /// Returns a `TcpClient` for `host:port` that uses this `TcpClientBuilder` configuration.
    pub fn build<H: Into<String>>(self, host: H, port: u16) -> Result<TcpClient> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(TcpClientError::invalid_input("host must not be empty"));
        }
        if port == 0 {
            return Err(TcpClientError::invalid_input("port must be in 1..=65535"));
        }
        if self.buffer_size == 0 {
            return Err(TcpClientError::invalid_input("buffer size must be greater than zero"));
        }
        if self.max_response_size == 0 {
            return Err(TcpClientError::invalid_input(
                "max response size must be greater than zero",
            ));
        }
        if self.timeout.as_nanos() == 0 || self.connect_timeout.as_nanos() == 0 {
            return Err(TcpClientError::invalid_input("timeouts must be greater than zero"));
        }

        Ok(TcpClient {
            host,
            port,
            id: Arc::new(AtomicU64::new(1)),
            config: Arc::new(self),
        })
    }
}
