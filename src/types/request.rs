use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, TcpClientError},
    types::{Id, Params, Version},
};

/// A request object.
///
/// Only `method` is required. The optional members are left off the wire when unset,
/// so a bare request is just `{"method":"..."}`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Request {
    /// Protocol version, sent only for JSON-RPC 2.0 calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<Version>,
    /// Name of the remote procedure.
    pub method: String,
    /// Structured parameter values. This member MAY be omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
    /// Correlation id. This member MAY be omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).expect("`Request` is serializable");
        write!(f, "{}", json)
    }
}

impl Request {
    /// Creates a bare request with no version and no id.
    pub fn new<M: Into<String>>(method: M, params: Option<Params>) -> Self {
        Self {
            jsonrpc: None,
            method: method.into(),
            params,
            id: None,
        }
    }

    /// Creates a bare request, rejecting an empty method name.
    pub fn try_new<M: Into<String>>(method: M, params: Option<Params>) -> Result<Self> {
        let request = Self::new(method, params);
        if request.method.is_empty() {
            return Err(TcpClientError::invalid_input("method must not be empty"));
        }
        Ok(request)
    }

    /// Creates a JSON-RPC 2.0 method call.
    pub fn method_call<M: Into<String>>(method: M, params: Option<Params>, id: Id) -> Self {
        Self {
            jsonrpc: Some(Version::V2_0),
            method: method.into(),
            params,
            id: Some(id),
        }
    }

    /// Sets the correlation id.
    pub fn with_id<I: Into<Id>>(mut self, id: I) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Marks the request as JSON-RPC 2.0.
    pub fn with_version(mut self) -> Self {
        self.jsonrpc = Some(Version::V2_0);
        self
    }
}
