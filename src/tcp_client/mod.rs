mod builder;
mod framing;
#[cfg(test)]
mod tests;

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use serde::Serialize;
use tokio::{io::AsyncWriteExt, net::TcpStream, time::timeout};

pub use self::builder::{
    TcpClientBuilder, DEFAULT_BUFFER_SIZE, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_RESPONSE_SIZE, DEFAULT_TIMEOUT,
};
use crate::{
    error::{Phase, Result, TcpClientError},
    transport::Transport,
    types::{Id, Params, Request, Response, Value},
};

/// TCP JSON-RPC client.
///
/// Every call opens its own connection and closes it before returning, so a client can be
/// cloned and shared between tasks freely.
#[derive(Clone, Debug)]
pub struct TcpClient {
    host: String,
    port: u16,
    id: Arc<AtomicU64>,
    config: Arc<TcpClientBuilder>,
}

impl TcpClient {
    /// Creates a new TCP JSON-RPC client for `host:port` with the default settings.
    pub fn new<H: Into<String>>(host: H, port: u16) -> Result<Self> {
        TcpClientBuilder::new().build(host, port)
    }

    /// Creates a `TcpClientBuilder` to configure a `TcpClient`.
    ///
    /// This is the same as `TcpClientBuilder::new()`.
    pub fn builder() -> TcpClientBuilder {
        TcpClientBuilder::new()
    }

    /// Remote host name or address.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Remote port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Calls `method` and returns the decoded reply, whatever its shape.
    ///
    /// The request is `{"method":...,"params":...}`; `params` is left out when `None`.
    pub async fn call<M: Into<String>>(&self, method: M, params: Option<Params>) -> Result<Value> {
        let request = Request::try_new(method, params)?;
        self.send(&request).await
    }

    /// Sends any serializable request body and returns the decoded reply.
    pub async fn send<REQ>(&self, request: &REQ) -> Result<Value>
    where
        REQ: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(request).map_err(TcpClientError::Encode)?;
        log::debug!("Request: {}", String::from_utf8_lossy(&body));

        let mut stream = self.connect().await?;
        let result = match timeout(self.config.timeout, self.exchange(&mut stream, &body)).await {
            Ok(result) => result,
            Err(_) => Err(TcpClientError::Timeout {
                phase: Phase::Request,
                after: self.config.timeout,
            }),
        };
        drop(stream);
        log::debug!("Closed connection to {}:{}", self.host, self.port);

        let response = result?;
        log::debug!("Response: {}", response);
        Ok(response)
    }

    async fn connect(&self) -> Result<TcpStream> {
        log::debug!("Connecting to {}:{}", self.host, self.port);
        let connect = TcpStream::connect((self.host.as_str(), self.port));
        match timeout(self.config.connect_timeout, connect).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(source)) => Err(TcpClientError::Connection {
                addr: format!("{}:{}", self.host, self.port),
                source,
            }),
            Err(_) => Err(TcpClientError::Timeout {
                phase: Phase::Connect,
                after: self.config.connect_timeout,
            }),
        }
    }

    async fn exchange(&self, stream: &mut TcpStream, body: &[u8]) -> Result<Value> {
        stream.write_all(body).await.map_err(TcpClientError::Transport)?;
        stream.flush().await.map_err(TcpClientError::Transport)?;
        if self.config.shutdown_write {
            stream.shutdown().await.map_err(TcpClientError::Transport)?;
        }
        framing::read_response(stream, self.config.buffer_size, self.config.max_response_size).await
    }
}

#[async_trait::async_trait]
impl Transport for TcpClient {
    type Error = TcpClientError;

    async fn request<M>(&self, method: M, params: Option<Params>) -> Result<Response, Self::Error>
    where
        M: Into<String> + Send,
    {
        let call = Request::try_new(method, params)?.with_version();
        let id = Id::Num(self.id.fetch_add(1, Ordering::AcqRel));
        let call = call.with_id(id.clone());

        let value = self.send(&call).await?;
        let response = serde_json::from_value::<Response>(value)
            .map_err(|err| TcpClientError::InvalidResponse(err.to_string()))?;
        match response.id() {
            Some(got) if *got != id => Err(TcpClientError::InvalidResponse(format!(
                "expected id {}, got {}",
                display_id(&id),
                display_id(got)
            ))),
            _ => Ok(response),
        }
    }
}

fn display_id(id: &Id) -> String {
    match id {
        Id::Num(id) => id.to_string(),
        Id::Str(id) => id.clone(),
    }
}
