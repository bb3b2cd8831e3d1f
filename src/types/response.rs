use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Error, Id, Version};

/// Successful response.
///
/// `jsonrpc` and `result` are optional on input: cJSON-based servers answer with a bare
/// `{"result":...,"id":...}` and drop `result` entirely when a procedure returns nothing.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Success {
    /// Protocol version, if the server sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<Version>,
    /// Successful execution result.
    #[serde(default)]
    pub result: Value,
    /// Correlation id.
    #[serde(default)]
    pub id: Option<Id>,
}

impl Success {
    /// Creates a JSON-RPC 2.0 success response.
    pub fn new(result: Value, id: Id) -> Self {
        Self {
            jsonrpc: Some(Version::V2_0),
            result,
            id: Some(id),
        }
    }
}

/// Failure response.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Failure {
    /// Protocol version, if the server sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<Version>,
    /// Failed execution error.
    pub error: Error,
    /// Correlation id. Null when the server could not read the request id.
    #[serde(default)]
    pub id: Option<Id>,
}

impl Failure {
    /// Creates a JSON-RPC 2.0 failure response.
    pub fn new(error: Error, id: Option<Id>) -> Self {
        Self {
            jsonrpc: Some(Version::V2_0),
            error,
            id,
        }
    }
}

/// Success or failure response to a single call.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    /// Success response
    Success(Success),
    /// Failure response
    Failure(Failure),
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).expect("`Response` is serializable");
        write!(f, "{}", json)
    }
}

impl From<Success> for Response {
    fn from(success: Success) -> Self {
        Self::Success(success)
    }
}

impl From<Failure> for Response {
    fn from(failure: Failure) -> Self {
        Self::Failure(failure)
    }
}

impl Response {
    /// Gets the protocol version, if any.
    pub fn version(&self) -> Option<Version> {
        match self {
            Self::Success(s) => s.jsonrpc,
            Self::Failure(f) => f.jsonrpc,
        }
    }

    /// Gets the correlation id.
    pub fn id(&self) -> Option<&Id> {
        match self {
            Self::Success(s) => s.id.as_ref(),
            Self::Failure(f) => f.id.as_ref(),
        }
    }

    /// Returns `true` for a success response.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Converts into the call result.
    pub fn into_result(self) -> Result<Value, Error> {
        self.into()
    }
}

impl From<Response> for Result<Value, Error> {
    fn from(response: Response) -> Result<Value, Error> {
        match response {
            Response::Success(s) => Ok(s.result),
            Response::Failure(f) => Err(f.error),
        }
    }
}
