//! A minimal JSON-RPC client over plain TCP.
//!
//! Each call opens a connection, writes one JSON request, reads one JSON reply and closes
//! the connection again. There is no length prefix on the wire: the reply ends with the
//! first complete JSON value, when the server closes, or when the size budget runs out.
//!
//! ```no_run
//! # async fn demo() -> Result<(), tcp_jsonrpc_client::TcpClientError> {
//! use std::time::Duration;
//!
//! use tcp_jsonrpc_client::{Params, TcpClient, Transport, Value};
//!
//! // One-off call with the default settings.
//! let reply = tcp_jsonrpc_client::call("127.0.0.1", 1234, "ListAllMethod", None).await?;
//! println!("{}", reply);
//!
//! // A configured client, speaking JSON-RPC 2.0 with ids.
//! let client = TcpClient::builder()
//!     .timeout(Duration::from_secs(5))
//!     .build("127.0.0.1", 1234)?;
//! let params = Params::Array(vec![Value::from("meminfo")]);
//! let response = client.request("GetProcMeminfo", Some(params)).await?;
//! println!("{}", response);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

mod error;
mod tcp_client;
mod transport;
mod types;

pub use self::{
    error::{ErrorKind, Phase, Result, TcpClientError},
    tcp_client::{
        TcpClient, TcpClientBuilder, DEFAULT_BUFFER_SIZE, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_RESPONSE_SIZE,
        DEFAULT_TIMEOUT,
    },
    transport::Transport,
    types::*,
};

/// Calls `method` on `host:port` with the default client settings and returns the reply.
pub async fn call<M: Into<String>>(host: &str, port: u16, method: M, params: Option<Params>) -> Result<Value> {
    TcpClient::new(host, port)?.call(method, params).await
}
