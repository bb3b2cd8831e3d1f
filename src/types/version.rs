use serde::{Deserialize, Serialize};

/// Protocol version marker carried in the `jsonrpc` member.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Version {
    /// JSON-RPC 2.0
    #[serde(rename = "2.0")]
    V2_0,
}
