use std::{fmt, io, time::Duration};

use thiserror::Error;

/// A result type that wraps up the TCP client errors.
pub type Result<T, E = TcpClientError> = std::result::Result<T, E>;

/// Which part of the exchange ran out of time.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    /// Establishing the TCP connection.
    Connect,
    /// Writing the request and waiting for the reply.
    Request,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Connect => f.write_str("connect"),
            Phase::Request => f.write_str("request"),
        }
    }
}

/// Coarse classification of a [`TcpClientError`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Bad host, port, method, client settings, or an unencodable request.
    InvalidInput,
    /// The TCP connection could not be established.
    Connection,
    /// Sending or receiving failed.
    Transport,
    /// No complete reply within the configured bound.
    Timeout,
    /// The reply is not the JSON we expected.
    Protocol,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::Connection => "connection",
            ErrorKind::Transport => "transport",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Protocol => "protocol",
        };
        f.write_str(name)
    }
}

/// The error type for the TCP JSON-RPC client.
#[derive(Debug, Error)]
pub enum TcpClientError {
    /// Rejected before any I/O took place.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The request could not be serialized.
    #[error("Failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),
    /// Name resolution failed, or the peer was unreachable or refused.
    #[error("Failed to connect to {addr}: {source}")]
    Connection {
        /// `host:port` we tried to reach.
        addr: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// Socket error while sending or receiving.
    #[error("Transport error: {0}")]
    Transport(#[source] io::Error),
    /// Connect or request timeout.
    #[error("{phase} timed out after {after:?}")]
    Timeout {
        /// Phase that did not finish in time.
        phase: Phase,
        /// Configured bound.
        after: Duration,
    },
    /// The reply bytes are not valid JSON.
    #[error("Invalid JSON in response: {0}")]
    Protocol(#[source] serde_json::Error),
    /// The reply did not complete within the configured size budget.
    #[error("Response exceeds {limit} bytes")]
    ResponseTooLarge {
        /// Configured budget in bytes.
        limit: usize,
    },
    /// The reply is valid JSON but not a JSON-RPC response object.
    #[error("Invalid JSON-RPC response: {0}")]
    InvalidResponse(String),
}

impl TcpClientError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TcpClientError::InvalidInput(_) | TcpClientError::Encode(_) => ErrorKind::InvalidInput,
            TcpClientError::Connection { .. } => ErrorKind::Connection,
            TcpClientError::Transport(_) => ErrorKind::Transport,
            TcpClientError::Timeout { .. } => ErrorKind::Timeout,
            TcpClientError::Protocol(_)
            | TcpClientError::ResponseTooLarge { .. }
            | TcpClientError::InvalidResponse(_) => ErrorKind::Protocol,
        }
    }

    pub(crate) fn invalid_input<M: Into<String>>(message: M) -> Self {
        TcpClientError::InvalidInput(message.into())
    }
}
