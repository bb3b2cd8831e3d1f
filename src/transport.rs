use std::error::Error;

use crate::types::{Params, Response};

/// A JSON-RPC transport.
#[async_trait::async_trait]
pub trait Transport {
    /// The transport error type.
    type Error: Error;

    /// Send a RPC call with the given method and parameters.
    ///
    /// A failure response from the server is a successful round trip and comes back as
    /// [`Response::Failure`], not as `Self::Error`.
    async fn request<M>(&self, method: M, params: Option<Params>) -> Result<Response, Self::Error>
    where
        M: Into<String> + Send;
}
